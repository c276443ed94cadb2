//! Background services for the training portal.
//!
//! - [`DeadlineScheduler`] periodically scans open assignments with a due
//!   date and stores "due soon" and "overdue" notifications, once per
//!   reminder window.

pub mod deadline;

pub use deadline::DeadlineScheduler;
