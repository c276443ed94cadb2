//! Well-known role name constants.
//!
//! These must match the `ck_users_role` check constraint in
//! `20260301000002_create_users.sql`.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_INSTRUCTOR: &str = "instructor";
pub const ROLE_USER: &str = "user";

/// All valid role names.
pub const VALID_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_INSTRUCTOR, ROLE_USER];

/// Validate that a role string is one of the accepted values.
pub fn validate_role(role: &str) -> Result<(), String> {
    if VALID_ROLES.contains(&role) {
        Ok(())
    } else {
        Err(format!(
            "Invalid role '{role}'. Must be one of: {}",
            VALID_ROLES.join(", ")
        ))
    }
}

/// Roles allowed to author catalog content and read learner progress.
/// Handing out assignments stays with `admin`.
pub fn can_manage_catalog(role: &str) -> bool {
    role == ROLE_ADMIN || role == ROLE_INSTRUCTOR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_roles_accepted() {
        for role in VALID_ROLES {
            assert!(validate_role(role).is_ok());
        }
    }

    #[test]
    fn test_unknown_role_rejected() {
        let err = validate_role("superuser").unwrap_err();
        assert!(err.contains("Invalid role"));
    }

    #[test]
    fn test_catalog_management_roles() {
        assert!(can_manage_catalog(ROLE_ADMIN));
        assert!(can_manage_catalog(ROLE_INSTRUCTOR));
        assert!(!can_manage_catalog(ROLE_USER));
    }
}
