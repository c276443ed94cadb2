//! Prerequisite gating between programs.
//!
//! Programs in the same theme are ordered by `order_index`. A program can
//! require its predecessor (completed automatically or released by an
//! admin) or an explicit list of programs from its theme.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::types::DbId;

// ---------------------------------------------------------------------------
// Prerequisite type
// ---------------------------------------------------------------------------

pub const PREREQ_NONE: &str = "none";
pub const PREREQ_PREVIOUS_AUTO: &str = "previous_auto";
pub const PREREQ_PREVIOUS_MANUAL: &str = "previous_manual";
pub const PREREQ_SPECIFIC_COURSES: &str = "specific_courses";

pub const VALID_PREREQUISITE_TYPES: &[&str] = &[
    PREREQ_NONE,
    PREREQ_PREVIOUS_AUTO,
    PREREQ_PREVIOUS_MANUAL,
    PREREQ_SPECIFIC_COURSES,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrerequisiteType {
    #[default]
    None,
    PreviousAuto,
    PreviousManual,
    SpecificCourses,
}

impl PrerequisiteType {
    pub fn from_str_value(s: &str) -> Result<Self, String> {
        match s {
            PREREQ_NONE => Ok(Self::None),
            PREREQ_PREVIOUS_AUTO => Ok(Self::PreviousAuto),
            PREREQ_PREVIOUS_MANUAL => Ok(Self::PreviousManual),
            PREREQ_SPECIFIC_COURSES => Ok(Self::SpecificCourses),
            _ => Err(format!(
                "Invalid prerequisite type '{s}'. Must be one of: {}",
                VALID_PREREQUISITE_TYPES.join(", ")
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => PREREQ_NONE,
            Self::PreviousAuto => PREREQ_PREVIOUS_AUTO,
            Self::PreviousManual => PREREQ_PREVIOUS_MANUAL,
            Self::SpecificCourses => PREREQ_SPECIFIC_COURSES,
        }
    }
}

/// The slice of a program needed to evaluate and validate gating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramGate {
    pub id: DbId,
    pub theme_id: Option<DbId>,
    pub order_index: i32,
    pub prerequisite_type: PrerequisiteType,
    pub prerequisite_course_ids: Vec<DbId>,
}

/// Whether a learner may enter a program right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum PrerequisiteState {
    Open,
    /// Listed programs still have to be completed.
    Locked { missing: Vec<DbId> },
    /// The predecessor is done; waiting for an admin to release this one.
    AwaitingApproval,
}

impl PrerequisiteState {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// The program immediately before `program` in its theme, if any.
pub fn find_predecessor(program: &ProgramGate, catalog: &[ProgramGate]) -> Option<DbId> {
    catalog
        .iter()
        .filter(|p| {
            p.id != program.id
                && p.theme_id == program.theme_id
                && p.order_index < program.order_index
        })
        .max_by_key(|p| (p.order_index, p.id))
        .map(|p| p.id)
}

/// The programs `program` waits on, before considering what the learner holds.
pub fn required_programs(program: &ProgramGate, catalog: &[ProgramGate]) -> Vec<DbId> {
    match program.prerequisite_type {
        PrerequisiteType::None => Vec::new(),
        PrerequisiteType::PreviousAuto | PrerequisiteType::PreviousManual => {
            find_predecessor(program, catalog).into_iter().collect()
        }
        PrerequisiteType::SpecificCourses => program.prerequisite_course_ids.clone(),
    }
}

/// Decide the gate for one learner.
///
/// * `assigned` - programs the learner holds an assignment to. Programs the
///   learner was never given cannot be completed by them and do not gate.
/// * `completed` - programs whose assignment for this learner is completed.
/// * `released` - whether this assignment was released by an admin
///   (only consulted for `previous_manual`).
pub fn evaluate(
    program: &ProgramGate,
    catalog: &[ProgramGate],
    assigned: &HashSet<DbId>,
    completed: &HashSet<DbId>,
    released: bool,
) -> PrerequisiteState {
    let missing: Vec<DbId> = required_programs(program, catalog)
        .into_iter()
        .filter(|id| assigned.contains(id) && !completed.contains(id))
        .collect();

    if !missing.is_empty() {
        return PrerequisiteState::Locked { missing };
    }

    if program.prerequisite_type == PrerequisiteType::PreviousManual
        && find_predecessor(program, catalog).is_some_and(|id| completed.contains(&id))
        && !released
    {
        return PrerequisiteState::AwaitingApproval;
    }

    PrerequisiteState::Open
}

// ---------------------------------------------------------------------------
// Write-time validation
// ---------------------------------------------------------------------------

/// Validate a prerequisite declaration against the company's programs.
///
/// `program.id` may be 0 for a program that has not been inserted yet.
/// Rejects unknown ids, self references, programs from another theme and
/// declarations that would close a dependency cycle. The cycle check runs
/// for every prerequisite type, since moving a program's `order_index`
/// changes which program other programs treat as their predecessor.
pub fn validate_prerequisites(program: &ProgramGate, catalog: &[ProgramGate]) -> Result<(), String> {
    if program.prerequisite_type != PrerequisiteType::SpecificCourses {
        if !program.prerequisite_course_ids.is_empty() {
            return Err(format!(
                "prerequisite_course_ids is only allowed with prerequisite_type '{PREREQ_SPECIFIC_COURSES}'"
            ));
        }
    } else {
        check_course_list(program, catalog)?;
    }

    let updated: Vec<ProgramGate> = catalog
        .iter()
        .filter(|p| p.id != program.id)
        .cloned()
        .chain(std::iter::once(program.clone()))
        .collect();

    if has_cycle(&updated) {
        return Err("Prerequisites would create a dependency cycle".to_string());
    }

    Ok(())
}

fn check_course_list(program: &ProgramGate, catalog: &[ProgramGate]) -> Result<(), String> {
    if program.prerequisite_course_ids.is_empty() {
        return Err("specific_courses requires at least one prerequisite course".to_string());
    }

    let by_id: HashMap<DbId, &ProgramGate> = catalog.iter().map(|p| (p.id, p)).collect();
    let mut seen = HashSet::new();

    for &id in &program.prerequisite_course_ids {
        if id == program.id {
            return Err("A program cannot be its own prerequisite".to_string());
        }
        if !seen.insert(id) {
            return Err(format!("Prerequisite course {id} is listed twice"));
        }
        let Some(other) = by_id.get(&id) else {
            return Err(format!("Prerequisite course {id} does not exist"));
        };
        if other.theme_id != program.theme_id {
            return Err(format!(
                "Prerequisite course {id} belongs to a different theme"
            ));
        }
    }
    Ok(())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// Depth-first search over the edges `evaluate` actually follows: the
/// predecessor for `previous_*` gates and the explicit list for
/// `specific_courses`.
fn has_cycle(catalog: &[ProgramGate]) -> bool {
    let edges: HashMap<DbId, Vec<DbId>> = catalog
        .iter()
        .map(|p| (p.id, required_programs(p, catalog)))
        .collect();
    let mut marks: HashMap<DbId, Mark> = HashMap::new();

    for root in catalog.iter().map(|p| p.id) {
        if marks.contains_key(&root) {
            continue;
        }
        // (node, index of the next edge to visit)
        let mut stack: Vec<(DbId, usize)> = vec![(root, 0)];
        marks.insert(root, Mark::InProgress);

        while let Some(&(node, next)) = stack.last() {
            let targets = edges.get(&node).map(Vec::as_slice).unwrap_or_default();
            let Some(&target) = targets.get(next) else {
                marks.insert(node, Mark::Done);
                stack.pop();
                continue;
            };
            if let Some(top) = stack.last_mut() {
                top.1 += 1;
            }
            if !edges.contains_key(&target) {
                continue;
            }
            match marks.get(&target) {
                Some(Mark::InProgress) => return true,
                Some(Mark::Done) => {}
                None => {
                    marks.insert(target, Mark::InProgress);
                    stack.push((target, 0));
                }
            }
        }
    }
    false
}
