//! Seed helpers for database integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use sqlx::PgPool;
use trainhub_core::engine::LearningEngine;
use trainhub_core::identity::Actor;
use trainhub_core::module_content::ModuleContent;
use trainhub_core::roles::{ROLE_ADMIN, ROLE_USER};
use trainhub_core::types::DbId;
use trainhub_db::models::checklist::{CreateChecklist, CreateChecklistItem};
use trainhub_db::models::company::CreateCompany;
use trainhub_db::models::department::CreateDepartment;
use trainhub_db::models::program::{CreateModule, CreateProgram};
use trainhub_db::models::user::CreateUser;
use trainhub_db::repositories::{
    ChecklistRepo, CompanyRepo, DepartmentRepo, ProgramRepo, UserRepo,
};
use trainhub_db::PgLearningStore;

pub struct Seed {
    pub pool: PgPool,
    pub engine: LearningEngine,
    pub company_id: DbId,
    pub admin: Actor,
}

impl Seed {
    pub async fn new(pool: PgPool) -> Self {
        let company = CompanyRepo::create(
            &pool,
            &CreateCompany {
                name: "Acme".to_string(),
            },
        )
        .await
        .unwrap();
        let admin = create_user(&pool, company.id, "admin@acme.test", ROLE_ADMIN).await;
        let engine = LearningEngine::new(Arc::new(PgLearningStore::new(pool.clone())));
        Self {
            pool,
            engine,
            company_id: company.id,
            admin: Actor::new(admin, company.id, ROLE_ADMIN),
        }
    }

    /// An admin of a second, unrelated company.
    pub async fn new_company(&self, name: &str) -> Actor {
        let company = CompanyRepo::create(
            &self.pool,
            &CreateCompany {
                name: name.to_string(),
            },
        )
        .await
        .unwrap();
        let email = format!("admin@{}.test", name.to_lowercase());
        let admin = create_user(&self.pool, company.id, &email, ROLE_ADMIN).await;
        Actor::new(admin, company.id, ROLE_ADMIN)
    }

    pub async fn learner(&self, email: &str) -> Actor {
        let id = create_user(&self.pool, self.company_id, email, ROLE_USER).await;
        Actor::new(id, self.company_id, ROLE_USER)
    }

    pub async fn department(&self, name: &str) -> DbId {
        DepartmentRepo::create(
            &self.pool,
            self.company_id,
            &CreateDepartment {
                name: name.to_string(),
            },
        )
        .await
        .unwrap()
        .id
    }

    /// A program with `modules` reading modules.
    pub async fn program(&self, title: &str, modules: usize) -> (DbId, Vec<DbId>) {
        let program = ProgramRepo::create(
            &self.pool,
            self.company_id,
            self.admin.user_id,
            &CreateProgram {
                theme_id: None,
                title: title.to_string(),
                description: None,
                order_index: None,
                prerequisite_type: None,
                prerequisite_course_ids: None,
                passing_score: None,
                badge_enabled: None,
                badge_title: None,
            },
        )
        .await
        .unwrap();
        let mut ids = Vec::new();
        for i in 0..modules {
            ids.push(self.module(program.id, ModuleContent::ContentSection {
                body: format!("Section {i}"),
            })
            .await);
        }
        (program.id, ids)
    }

    pub async fn module(&self, program_id: DbId, content: ModuleContent) -> DbId {
        ProgramRepo::create_module(
            &self.pool,
            program_id,
            &CreateModule {
                title: content.type_name().to_string(),
                order_index: None,
                content,
            },
        )
        .await
        .unwrap()
        .id
    }

    pub async fn checklist(&self, title: &str, items: usize) -> (DbId, Vec<DbId>) {
        let checklist = ChecklistRepo::create(
            &self.pool,
            self.company_id,
            self.admin.user_id,
            &CreateChecklist {
                title: title.to_string(),
                description: None,
            },
        )
        .await
        .unwrap();
        let mut ids = Vec::new();
        for i in 0..items {
            let item = ChecklistRepo::create_item(
                &self.pool,
                checklist.id,
                &CreateChecklistItem {
                    title: format!("Step {i}"),
                    description: None,
                    order_index: None,
                },
            )
            .await
            .unwrap();
            ids.push(item.id);
        }
        (checklist.id, ids)
    }
}

pub async fn create_user(pool: &PgPool, company_id: DbId, email: &str, role: &str) -> DbId {
    UserRepo::create(
        pool,
        &CreateUser {
            company_id,
            email: email.to_string(),
            full_name: email.to_string(),
            role: Some(role.to_string()),
        },
    )
    .await
    .unwrap()
    .id
}
