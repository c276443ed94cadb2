pub mod assignments;
pub mod checklists;
pub mod departments;
pub mod learner;
pub mod notifications;
pub mod programs;
pub mod themes;
