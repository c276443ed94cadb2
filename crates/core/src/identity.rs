//! The resolved caller identity every engine operation runs under.
//!
//! Authentication happens outside the engine; the API layer turns a
//! validated token into an [`Actor`] and passes it down.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::roles::ROLE_ADMIN;
use crate::types::DbId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: DbId,
    pub company_id: DbId,
    pub role: String,
}

impl Actor {
    pub fn new(user_id: DbId, company_id: DbId, role: impl Into<String>) -> Self {
        Self {
            user_id,
            company_id,
            role: role.into(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    /// Reject access to a row owned by a different tenant.
    pub fn ensure_same_company(
        &self,
        entity: &'static str,
        id: DbId,
        company_id: DbId,
    ) -> Result<(), CoreError> {
        if company_id == self.company_id {
            Ok(())
        } else {
            Err(CoreError::CrossTenant { entity, id })
        }
    }
}
