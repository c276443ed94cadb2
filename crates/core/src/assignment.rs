//! Assignment vocabulary shared by the engine, the DB layer and the API.
//!
//! Programs and checklists share one assignment model; [`AssignmentKind`]
//! selects which pair of tables (`program_assignments` / `user_progress`
//! or `checklist_assignments` / `checklist_item_status`) a row lives in.

use serde::{Deserialize, Serialize};

use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Kind
// ---------------------------------------------------------------------------

pub const KIND_PROGRAM: &str = "program";
pub const KIND_CHECKLIST: &str = "checklist";

/// What an assignment points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentKind {
    Program,
    Checklist,
}

impl AssignmentKind {
    pub fn from_str_value(s: &str) -> Result<Self, String> {
        match s {
            KIND_PROGRAM => Ok(Self::Program),
            KIND_CHECKLIST => Ok(Self::Checklist),
            _ => Err(format!(
                "Invalid assignment kind '{s}'. Must be one of: {KIND_PROGRAM}, {KIND_CHECKLIST}"
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Program => KIND_PROGRAM,
            Self::Checklist => KIND_CHECKLIST,
        }
    }

    /// Entity name used in error messages for the assigned target.
    pub fn target_entity(&self) -> &'static str {
        match self {
            Self::Program => "program",
            Self::Checklist => "checklist",
        }
    }

    /// Entity name used in error messages for the target's child items.
    pub fn item_entity(&self) -> &'static str {
        match self {
            Self::Program => "module",
            Self::Checklist => "checklist_item",
        }
    }
}

// ---------------------------------------------------------------------------
// Stored assignment status
// ---------------------------------------------------------------------------

pub const STATE_ASSIGNED: &str = "assigned";
pub const STATE_AVAILABLE: &str = "available";
pub const STATE_IN_PROGRESS: &str = "in_progress";
pub const STATE_COMPLETED: &str = "completed";

pub const VALID_ASSIGNMENT_STATES: &[&str] = &[
    STATE_ASSIGNED,
    STATE_AVAILABLE,
    STATE_IN_PROGRESS,
    STATE_COMPLETED,
];

/// The status column stored on an assignment row.
///
/// `Available` is the marker an admin sets to release a manually gated
/// program; the display status is always derived, see
/// [`crate::derived_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentState {
    Assigned,
    Available,
    InProgress,
    Completed,
}

impl AssignmentState {
    pub fn from_str_value(s: &str) -> Result<Self, String> {
        match s {
            STATE_ASSIGNED => Ok(Self::Assigned),
            STATE_AVAILABLE => Ok(Self::Available),
            STATE_IN_PROGRESS => Ok(Self::InProgress),
            STATE_COMPLETED => Ok(Self::Completed),
            _ => Err(format!(
                "Invalid assignment status '{s}'. Must be one of: {}",
                VALID_ASSIGNMENT_STATES.join(", ")
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assigned => STATE_ASSIGNED,
            Self::Available => STATE_AVAILABLE,
            Self::InProgress => STATE_IN_PROGRESS,
            Self::Completed => STATE_COMPLETED,
        }
    }

    /// Whether the learner has been let through a manual gate.
    ///
    /// Learners cannot start a gated program, so any state past `Assigned`
    /// implies the gate was opened at some point.
    pub fn is_released(&self) -> bool {
        !matches!(self, Self::Assigned)
    }
}

// ---------------------------------------------------------------------------
// Item status
// ---------------------------------------------------------------------------

pub const ITEM_NOT_STARTED: &str = "not_started";
pub const ITEM_IN_PROGRESS: &str = "in_progress";
pub const ITEM_COMPLETED: &str = "completed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl ItemStatus {
    pub fn from_str_value(s: &str) -> Result<Self, String> {
        match s {
            ITEM_NOT_STARTED => Ok(Self::NotStarted),
            ITEM_IN_PROGRESS => Ok(Self::InProgress),
            ITEM_COMPLETED => Ok(Self::Completed),
            _ => Err(format!(
                "Invalid item status '{s}'. Must be one of: {ITEM_NOT_STARTED}, {ITEM_IN_PROGRESS}, {ITEM_COMPLETED}"
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => ITEM_NOT_STARTED,
            Self::InProgress => ITEM_IN_PROGRESS,
            Self::Completed => ITEM_COMPLETED,
        }
    }
}

// ---------------------------------------------------------------------------
// Recipients and outcomes
// ---------------------------------------------------------------------------

/// Who an assignment is addressed to. Exactly one of user or department,
/// which is what keeps a row from carrying both recipient columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "id")]
pub enum Recipient {
    User(DbId),
    Department(DbId),
}

impl Recipient {
    /// Rebuild a recipient from the two nullable recipient columns.
    pub fn from_columns(user_id: Option<DbId>, department_id: Option<DbId>) -> Result<Self, String> {
        match (user_id, department_id) {
            (Some(user), None) => Ok(Self::User(user)),
            (None, Some(department)) => Ok(Self::Department(department)),
            (Some(_), Some(_)) => {
                Err("Assignment has both a user and a department recipient".to_string())
            }
            (None, None) => Err("Assignment has no recipient".to_string()),
        }
    }

    pub fn user_id(&self) -> Option<DbId> {
        match self {
            Self::User(id) => Some(*id),
            Self::Department(_) => None,
        }
    }

    pub fn department_id(&self) -> Option<DbId> {
        match self {
            Self::Department(id) => Some(*id),
            Self::User(_) => None,
        }
    }
}

impl std::fmt::Display for Recipient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User(id) => write!(f, "user {id}"),
            Self::Department(id) => write!(f, "department {id}"),
        }
    }
}

/// Optional settings carried by an assign request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignOptions {
    pub due_date: Option<Timestamp>,
    pub assigned_by: Option<DbId>,
}

/// Result of assigning a single user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "assignment_id")]
pub enum AssignOutcome {
    Assigned(DbId),
    AlreadyAssigned(DbId),
}

impl AssignOutcome {
    pub fn assignment_id(&self) -> DbId {
        match self {
            Self::Assigned(id) | Self::AlreadyAssigned(id) => *id,
        }
    }
}

/// A recipient that could not be processed during a bulk assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipientFailure {
    pub recipient: Recipient,
    pub error: String,
}

/// Tally reported back to the admin after an assign request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssignmentSummary {
    pub assigned: usize,
    pub already_assigned: usize,
    pub failed: Vec<RecipientFailure>,
}

impl AssignmentSummary {
    pub fn record(&mut self, outcome: AssignOutcome) {
        match outcome {
            AssignOutcome::Assigned(_) => self.assigned += 1,
            AssignOutcome::AlreadyAssigned(_) => self.already_assigned += 1,
        }
    }

    pub fn merge(&mut self, other: AssignmentSummary) {
        self.assigned += other.assigned;
        self.already_assigned += other.already_assigned;
        self.failed.extend(other.failed);
    }

    /// One-line human summary, e.g. "3 assigned, 1 already had access".
    pub fn message(&self) -> String {
        let mut msg = format!(
            "{} assigned, {} already had access",
            self.assigned, self.already_assigned
        );
        for failure in &self.failed {
            msg.push_str(&format!(", could not process {}", failure.recipient));
        }
        msg
    }
}

/// Round `completed / total` to a whole percentage. An empty target counts
/// as nothing done.
pub fn progress_percentage(completed: usize, total: usize) -> i16 {
    if total == 0 {
        return 0;
    }
    ((completed as f64 / total as f64) * 100.0).round() as i16
}
