//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod assignment_repo;
pub mod badge_repo;
pub mod checklist_repo;
pub mod company_repo;
pub mod department_repo;
pub mod item_progress_repo;
pub mod notification_repo;
pub mod program_repo;
pub mod reminder_repo;
pub mod theme_repo;
pub mod user_repo;

pub use assignment_repo::AssignmentRepo;
pub use badge_repo::BadgeRepo;
pub use checklist_repo::ChecklistRepo;
pub use company_repo::CompanyRepo;
pub use department_repo::DepartmentRepo;
pub use item_progress_repo::ItemProgressRepo;
pub use notification_repo::NotificationRepo;
pub use program_repo::ProgramRepo;
pub use reminder_repo::ReminderRepo;
pub use theme_repo::ThemeRepo;
pub use user_repo::UserRepo;
