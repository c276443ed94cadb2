pub mod assignment;
pub mod derived_status;
pub mod engine;
pub mod error;
pub mod identity;
pub mod module_content;
pub mod notifications;
pub mod prerequisites;
pub mod quiz;
pub mod reminders;
pub mod roles;
pub mod types;
