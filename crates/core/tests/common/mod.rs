//! Shared fixture for engine integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use trainhub_core::assignment::AssignmentKind;
use trainhub_core::engine::memory::InMemoryStore;
use trainhub_core::engine::LearningEngine;
use trainhub_core::identity::Actor;
use trainhub_core::module_content::ModuleContent;
use trainhub_core::roles::{ROLE_ADMIN, ROLE_USER};
use trainhub_core::types::DbId;

pub const COMPANY: DbId = 1;
pub const OTHER_COMPANY: DbId = 2;

pub struct Fixture {
    pub store: Arc<InMemoryStore>,
    pub engine: LearningEngine,
    pub admin: Actor,
}

impl Fixture {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let admin_id = store.add_user(COMPANY, ROLE_ADMIN);
        let engine = LearningEngine::new(store.clone());
        Self {
            store,
            engine,
            admin: Actor::new(admin_id, COMPANY, ROLE_ADMIN),
        }
    }

    /// Create a learner and return their actor.
    pub fn learner(&self) -> Actor {
        let id = self.store.add_user(COMPANY, ROLE_USER);
        Actor::new(id, COMPANY, ROLE_USER)
    }

    /// A program with `modules` reading modules.
    pub fn program(&self, title: &str, modules: usize) -> (DbId, Vec<DbId>) {
        let id = self.store.add_program(COMPANY, title);
        let items = self.reading_modules(id, modules);
        (id, items)
    }

    pub fn reading_modules(&self, program_id: DbId, count: usize) -> Vec<DbId> {
        (0..count)
            .map(|i| {
                self.store.add_item(
                    AssignmentKind::Program,
                    program_id,
                    Some(ModuleContent::ContentSection {
                        body: format!("Section {i}"),
                    }),
                )
            })
            .collect()
    }
}
