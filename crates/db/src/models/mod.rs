pub mod assignment;
pub mod badge;
pub mod checklist;
pub mod company;
pub mod department;
pub mod notification;
pub mod program;
pub mod user;
