mod common;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};

use common::{Fixture, COMPANY, OTHER_COMPANY};
use trainhub_core::assignment::{
    AssignOptions, AssignOutcome, AssignmentKind, ItemStatus, Recipient,
};
use trainhub_core::derived_status::DerivedStatus;
use trainhub_core::engine::{ItemOutcome, LearningStore, NewAssignment};
use trainhub_core::error::CoreError;
use trainhub_core::identity::Actor;
use trainhub_core::roles::ROLE_ADMIN;

const PROGRAM: AssignmentKind = AssignmentKind::Program;

// ---------------------------------------------------------------------------
// Direct assignment
// ---------------------------------------------------------------------------

#[tokio::test]
async fn assigning_twice_keeps_one_row_and_one_set_of_items() {
    let fx = Fixture::new();
    let learner = fx.learner();
    let (program, modules) = fx.program("Onboarding", 3);

    let first = fx
        .engine
        .assign_to_user(&fx.admin, PROGRAM, program, learner.user_id, &AssignOptions::default())
        .await
        .unwrap();
    let second = fx
        .engine
        .assign_to_user(&fx.admin, PROGRAM, program, learner.user_id, &AssignOptions::default())
        .await
        .unwrap();

    assert_matches!(first, AssignOutcome::Assigned(_));
    assert_eq!(second, AssignOutcome::AlreadyAssigned(first.assignment_id()));
    assert_eq!(fx.store.user_rows(PROGRAM, program).len(), 1);
    assert_eq!(fx.store.progress_rows().len(), modules.len());
    assert!(!fx.store.user_rows(PROGRAM, program)[0].is_auto_assigned);
}

#[tokio::test]
async fn direct_assignment_notifies_the_learner() {
    let fx = Fixture::new();
    let learner = fx.learner();
    let (program, _) = fx.program("Security basics", 1);

    fx.engine
        .assign_to_user(&fx.admin, PROGRAM, program, learner.user_id, &AssignOptions::default())
        .await
        .unwrap();

    let notifications = fx.store.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].user_id, learner.user_id);
    assert!(notifications[0].message.contains("Security basics"));
}

#[tokio::test]
async fn interrupted_fan_out_is_resumed_on_retry() {
    let fx = Fixture::new();
    let learner = fx.learner();
    let (program, modules) = fx.program("Compliance", 3);

    // Parent row written, children never created.
    let orphan = fx
        .store
        .insert_assignment(&NewAssignment {
            kind: PROGRAM,
            target_id: program,
            recipient: Recipient::User(learner.user_id),
            assigned_by: Some(fx.admin.user_id),
            due_date: None,
            is_auto_assigned: false,
        })
        .await
        .unwrap()
        .unwrap();

    let outcome = fx
        .engine
        .assign_to_user(&fx.admin, PROGRAM, program, learner.user_id, &AssignOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome, AssignOutcome::AlreadyAssigned(orphan.id));
    assert_eq!(fx.store.progress_rows().len(), modules.len());
}

#[tokio::test]
async fn conflicting_insert_reports_nothing_inserted() {
    let fx = Fixture::new();
    let learner = fx.learner();
    let (program, _) = fx.program("Race", 1);
    let new = NewAssignment {
        kind: PROGRAM,
        target_id: program,
        recipient: Recipient::User(learner.user_id),
        assigned_by: None,
        due_date: None,
        is_auto_assigned: false,
    };

    assert!(fx.store.insert_assignment(&new).await.unwrap().is_some());
    assert!(fx.store.insert_assignment(&new).await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Tenancy and lookups
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_program_is_not_found() {
    let fx = Fixture::new();
    let learner = fx.learner();

    let err = fx
        .engine
        .assign_to_user(&fx.admin, PROGRAM, 999, learner.user_id, &AssignOptions::default())
        .await
        .unwrap_err();

    assert_matches!(err, CoreError::NotFound { entity: "program", id: 999 });
}

#[tokio::test]
async fn foreign_recipient_is_cross_tenant() {
    let fx = Fixture::new();
    let (program, _) = fx.program("Onboarding", 1);
    let outsider = fx.store.add_user(OTHER_COMPANY, "user");

    let err = fx
        .engine
        .assign_to_user(&fx.admin, PROGRAM, program, outsider, &AssignOptions::default())
        .await
        .unwrap_err();

    assert_matches!(err, CoreError::CrossTenant { entity: "user", .. });
    assert!(fx.store.assignments().is_empty());
}

#[tokio::test]
async fn foreign_program_is_cross_tenant() {
    let fx = Fixture::new();
    let learner = fx.learner();
    let foreign = fx.store.add_program(OTHER_COMPANY, "Their onboarding");

    let err = fx
        .engine
        .assign_to_user(&fx.admin, PROGRAM, foreign, learner.user_id, &AssignOptions::default())
        .await
        .unwrap_err();

    assert_matches!(err, CoreError::CrossTenant { entity: "program", .. });
}

#[tokio::test]
async fn bulk_assign_validates_every_recipient_before_writing() {
    let fx = Fixture::new();
    let learner = fx.learner();
    let (program, _) = fx.program("Onboarding", 2);
    let foreign_dept = fx.store.add_department(OTHER_COMPANY, "Elsewhere");

    let err = fx
        .engine
        .assign(
            &fx.admin,
            PROGRAM,
            program,
            &[Recipient::User(learner.user_id), Recipient::Department(foreign_dept)],
            &AssignOptions::default(),
        )
        .await
        .unwrap_err();

    assert_matches!(err, CoreError::CrossTenant { entity: "department", .. });
    assert!(fx.store.assignments().is_empty());
    assert!(fx.store.progress_rows().is_empty());
}

#[tokio::test]
async fn bulk_assign_reports_summary() {
    let fx = Fixture::new();
    let a = fx.learner();
    let b = fx.learner();
    let c = fx.learner();
    let (program, _) = fx.program("Onboarding", 2);
    let sales = fx.store.add_department(COMPANY, "Sales");
    fx.store.add_membership(sales, b.user_id);
    fx.store.add_membership(sales, c.user_id);

    fx.engine
        .assign_to_user(&fx.admin, PROGRAM, program, b.user_id, &AssignOptions::default())
        .await
        .unwrap();

    let summary = fx
        .engine
        .assign(
            &fx.admin,
            PROGRAM,
            program,
            &[Recipient::User(a.user_id), Recipient::Department(sales)],
            &AssignOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(summary.assigned, 2);
    assert_eq!(summary.already_assigned, 1);
    assert!(summary.failed.is_empty());
    assert_eq!(summary.message(), "2 assigned, 1 already had access");
}

#[tokio::test]
async fn empty_recipient_list_is_rejected() {
    let fx = Fixture::new();
    let (program, _) = fx.program("Onboarding", 1);

    let err = fx
        .engine
        .assign(&fx.admin, PROGRAM, program, &[], &AssignOptions::default())
        .await
        .unwrap_err();

    assert_matches!(err, CoreError::Validation(_));
}

// ---------------------------------------------------------------------------
// Department fan-out
// ---------------------------------------------------------------------------

#[tokio::test]
async fn department_assignment_fans_out_to_every_member() {
    // Sales (U1, U2) gets "Onboarding" with 3 modules.
    let fx = Fixture::new();
    let u1 = fx.learner();
    let u2 = fx.learner();
    let sales = fx.store.add_department(COMPANY, "Sales");
    fx.store.add_membership(sales, u1.user_id);
    fx.store.add_membership(sales, u2.user_id);
    let (program, _) = fx.program("Onboarding", 3);

    let summary = fx
        .engine
        .assign_to_department(&fx.admin, PROGRAM, program, sales, &AssignOptions::default())
        .await
        .unwrap();

    assert_eq!(summary.assigned, 2);
    let rows = fx.store.user_rows(PROGRAM, program);
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.is_auto_assigned));

    let progress = fx.store.progress_rows();
    assert_eq!(progress.len(), 6);
    assert!(progress.iter().all(|p| p.status == ItemStatus::NotStarted));

    for learner in [&u1, &u2] {
        let views = fx.engine.learner_overview(learner, Utc::now()).await.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].status, DerivedStatus::NotStarted);
    }
}

#[tokio::test]
async fn completing_one_member_leaves_the_other_untouched() {
    let fx = Fixture::new();
    let u1 = fx.learner();
    let u2 = fx.learner();
    let sales = fx.store.add_department(COMPANY, "Sales");
    fx.store.add_membership(sales, u1.user_id);
    fx.store.add_membership(sales, u2.user_id);
    let (program, modules) = fx.program("Onboarding", 3);
    fx.engine
        .assign_to_department(&fx.admin, PROGRAM, program, sales, &AssignOptions::default())
        .await
        .unwrap();

    let u1_assignment = fx.engine.learner_overview(&u1, Utc::now()).await.unwrap()[0]
        .assignment
        .id;
    for module in &modules {
        fx.engine
            .complete_item(&u1, PROGRAM, u1_assignment, *module, ItemOutcome::default())
            .await
            .unwrap();
    }

    let u1_view = fx
        .engine
        .resolve_assignment(&u1, PROGRAM, u1_assignment, Utc::now())
        .await
        .unwrap();
    assert!(u1_view.assignment.completed_at.is_some());
    assert_eq!(u1_view.status, DerivedStatus::Completed);

    let u2_views = fx.engine.learner_overview(&u2, Utc::now()).await.unwrap();
    let u2_view = &u2_views[0];
    assert_eq!(u2_view.status, DerivedStatus::NotStarted);
    assert_eq!(u2_view.completed_items, 0);
}

#[tokio::test]
async fn department_fan_out_keeps_direct_assignments_direct() {
    let fx = Fixture::new();
    let learner = fx.learner();
    let sales = fx.store.add_department(COMPANY, "Sales");
    fx.store.add_membership(sales, learner.user_id);
    let (program, _) = fx.program("Onboarding", 2);

    fx.engine
        .assign_to_user(&fx.admin, PROGRAM, program, learner.user_id, &AssignOptions::default())
        .await
        .unwrap();
    let summary = fx
        .engine
        .assign_to_department(&fx.admin, PROGRAM, program, sales, &AssignOptions::default())
        .await
        .unwrap();

    assert_eq!(summary.already_assigned, 1);
    let rows = fx.store.user_rows(PROGRAM, program);
    assert_eq!(rows.len(), 1);
    assert!(!rows[0].is_auto_assigned);

    // Leaving the department never removes a direct assignment.
    let removed = fx
        .engine
        .on_user_leaves_department(&fx.admin, sales, learner.user_id)
        .await
        .unwrap();
    assert_eq!(removed, 0);
    assert_eq!(fx.store.user_rows(PROGRAM, program).len(), 1);
}

#[tokio::test]
async fn joining_member_inherits_department_assignments() {
    let fx = Fixture::new();
    let newcomer = fx.learner();
    let sales = fx.store.add_department(COMPANY, "Sales");
    let (program, modules) = fx.program("Onboarding", 2);
    let checklist = fx.store.add_checklist(COMPANY, "First week");
    fx.store.add_item(AssignmentKind::Checklist, checklist, None);
    let due = Utc::now() + Duration::days(14);
    let options = AssignOptions {
        due_date: Some(due),
        assigned_by: Some(fx.admin.user_id),
    };

    fx.engine
        .assign_to_department(&fx.admin, PROGRAM, program, sales, &options)
        .await
        .unwrap();
    fx.engine
        .assign_to_department(&fx.admin, AssignmentKind::Checklist, checklist, sales, &options)
        .await
        .unwrap();

    let summary = fx
        .engine
        .on_user_joins_department(&fx.admin, sales, newcomer.user_id)
        .await
        .unwrap();

    assert_eq!(summary.assigned, 2);
    let rows = fx.store.user_rows(PROGRAM, program);
    assert_eq!(rows.len(), 1);
    assert!(rows[0].is_auto_assigned);
    assert_eq!(rows[0].due_date, Some(due));
    assert_eq!(fx.store.progress_rows().len(), modules.len() + 1);

    // Joining again does nothing new.
    let again = fx
        .engine
        .on_user_joins_department(&fx.admin, sales, newcomer.user_id)
        .await
        .unwrap();
    assert_eq!(again.assigned, 0);
    assert_eq!(again.already_assigned, 2);
}

// ---------------------------------------------------------------------------
// Removal and re-justification
// ---------------------------------------------------------------------------

#[tokio::test]
async fn leaving_the_only_justifying_department_removes_the_assignment() {
    let fx = Fixture::new();
    let u1 = fx.learner();
    let u2 = fx.learner();
    let sales = fx.store.add_department(COMPANY, "Sales");
    fx.store.add_membership(sales, u1.user_id);
    fx.store.add_membership(sales, u2.user_id);
    let (program, _) = fx.program("Onboarding", 3);
    fx.engine
        .assign_to_department(&fx.admin, PROGRAM, program, sales, &AssignOptions::default())
        .await
        .unwrap();

    let removed = fx
        .engine
        .on_user_leaves_department(&fx.admin, sales, u2.user_id)
        .await
        .unwrap();

    assert_eq!(removed, 1);
    let rows = fx.store.user_rows(PROGRAM, program);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].user_id(), Some(u1.user_id));
    let progress = fx.store.progress_rows();
    assert_eq!(progress.len(), 3);
    assert!(progress.iter().all(|p| p.assignment_id == rows[0].id));
}

#[tokio::test]
async fn second_department_keeps_the_assignment_alive() {
    let fx = Fixture::new();
    let learner = fx.learner();
    let d1 = fx.store.add_department(COMPANY, "Sales");
    let d2 = fx.store.add_department(COMPANY, "EMEA");
    fx.store.add_membership(d1, learner.user_id);
    fx.store.add_membership(d2, learner.user_id);
    let (program, _) = fx.program("Onboarding", 2);

    for dept in [d1, d2] {
        fx.engine
            .assign_to_department(&fx.admin, PROGRAM, program, dept, &AssignOptions::default())
            .await
            .unwrap();
    }
    assert_eq!(fx.store.user_rows(PROGRAM, program).len(), 1);

    let removed = fx
        .engine
        .unassign(&fx.admin, PROGRAM, program, Recipient::Department(d1))
        .await
        .unwrap();
    assert_eq!(removed, 0);
    assert_eq!(fx.store.user_rows(PROGRAM, program).len(), 1);

    let removed = fx
        .engine
        .unassign(&fx.admin, PROGRAM, program, Recipient::Department(d2))
        .await
        .unwrap();
    assert_eq!(removed, 1);
    assert!(fx.store.user_rows(PROGRAM, program).is_empty());
    assert!(fx.store.progress_rows().is_empty());
}

#[tokio::test]
async fn leaving_one_of_two_assigned_departments_keeps_the_assignment() {
    let fx = Fixture::new();
    let learner = fx.learner();
    let d1 = fx.store.add_department(COMPANY, "Sales");
    let d2 = fx.store.add_department(COMPANY, "EMEA");
    fx.store.add_membership(d1, learner.user_id);
    fx.store.add_membership(d2, learner.user_id);
    let (program, _) = fx.program("Onboarding", 2);
    for dept in [d1, d2] {
        fx.engine
            .assign_to_department(&fx.admin, PROGRAM, program, dept, &AssignOptions::default())
            .await
            .unwrap();
    }

    let removed = fx
        .engine
        .on_user_leaves_department(&fx.admin, d1, learner.user_id)
        .await
        .unwrap();
    assert_eq!(removed, 0);

    let removed = fx
        .engine
        .on_user_leaves_department(&fx.admin, d2, learner.user_id)
        .await
        .unwrap();
    assert_eq!(removed, 1);
    assert!(fx.store.user_rows(PROGRAM, program).is_empty());
}

#[tokio::test]
async fn unassign_is_idempotent() {
    let fx = Fixture::new();
    let learner = fx.learner();
    let sales = fx.store.add_department(COMPANY, "Sales");
    fx.store.add_membership(sales, learner.user_id);
    let (program, _) = fx.program("Onboarding", 2);
    let other = fx.learner();
    fx.engine
        .assign_to_user(&fx.admin, PROGRAM, program, other.user_id, &AssignOptions::default())
        .await
        .unwrap();
    fx.engine
        .assign_to_department(&fx.admin, PROGRAM, program, sales, &AssignOptions::default())
        .await
        .unwrap();

    let user = Recipient::User(other.user_id);
    assert_eq!(fx.engine.unassign(&fx.admin, PROGRAM, program, user).await.unwrap(), 1);
    assert_eq!(fx.engine.unassign(&fx.admin, PROGRAM, program, user).await.unwrap(), 0);

    let dept = Recipient::Department(sales);
    assert_eq!(fx.engine.unassign(&fx.admin, PROGRAM, program, dept).await.unwrap(), 1);
    assert_eq!(fx.engine.unassign(&fx.admin, PROGRAM, program, dept).await.unwrap(), 0);

    assert!(fx.store.assignments().is_empty());
    assert!(fx.store.progress_rows().is_empty());
}

#[tokio::test]
async fn unassigning_a_department_justified_user_is_rejected() {
    let fx = Fixture::new();
    let learner = fx.learner();
    let sales = fx.store.add_department(COMPANY, "Sales");
    fx.store.add_membership(sales, learner.user_id);
    let (program, _) = fx.program("Onboarding", 1);
    fx.engine
        .assign_to_department(&fx.admin, PROGRAM, program, sales, &AssignOptions::default())
        .await
        .unwrap();

    let err = fx
        .engine
        .unassign(&fx.admin, PROGRAM, program, Recipient::User(learner.user_id))
        .await
        .unwrap_err();

    assert_matches!(err, CoreError::Validation(msg) if msg.contains("department"));
    assert_eq!(fx.store.user_rows(PROGRAM, program).len(), 1);
}

#[tokio::test]
async fn unassigning_a_direct_row_still_held_by_a_department_is_rejected() {
    let fx = Fixture::new();
    let learner = fx.learner();
    let sales = fx.store.add_department(COMPANY, "Sales");
    fx.store.add_membership(sales, learner.user_id);
    let (program, modules) = fx.program("Onboarding", 2);
    fx.engine
        .assign_to_user(&fx.admin, PROGRAM, program, learner.user_id, &AssignOptions::default())
        .await
        .unwrap();
    fx.engine
        .assign_to_department(&fx.admin, PROGRAM, program, sales, &AssignOptions::default())
        .await
        .unwrap();

    let err = fx
        .engine
        .unassign(&fx.admin, PROGRAM, program, Recipient::User(learner.user_id))
        .await
        .unwrap_err();

    assert_matches!(err, CoreError::Validation(msg) if msg.contains("department"));
    let rows = fx.store.user_rows(PROGRAM, program);
    assert_eq!(rows.len(), 1);
    assert!(!rows[0].is_auto_assigned);
    assert_eq!(fx.store.progress_rows().len(), modules.len());

    // Once the department lets go, the direct row can be removed.
    fx.engine
        .unassign(&fx.admin, PROGRAM, program, Recipient::Department(sales))
        .await
        .unwrap();
    assert_eq!(
        fx.engine
            .unassign(&fx.admin, PROGRAM, program, Recipient::User(learner.user_id))
            .await
            .unwrap(),
        1
    );
    assert!(fx.store.user_rows(PROGRAM, program).is_empty());
}

#[tokio::test]
async fn unassign_from_another_company_is_rejected() {
    let fx = Fixture::new();
    let (program, _) = fx.program("Onboarding", 1);
    let outsider_admin = Actor::new(
        fx.store.add_user(OTHER_COMPANY, ROLE_ADMIN),
        OTHER_COMPANY,
        ROLE_ADMIN,
    );
    let learner = fx.learner();

    let err = fx
        .engine
        .unassign(&outsider_admin, PROGRAM, program, Recipient::User(learner.user_id))
        .await
        .unwrap_err();

    assert_matches!(err, CoreError::CrossTenant { .. });
}

// ---------------------------------------------------------------------------
// Items added after assignment
// ---------------------------------------------------------------------------

#[tokio::test]
async fn new_items_are_backfilled_for_open_assignments_only() {
    let fx = Fixture::new();
    let finished = fx.learner();
    let fresh = fx.learner();
    let (program, modules) = fx.program("Onboarding", 1);
    for learner in [&finished, &fresh] {
        fx.engine
            .assign_to_user(&fx.admin, PROGRAM, program, learner.user_id, &AssignOptions::default())
            .await
            .unwrap();
    }
    let finished_id = fx.engine.learner_overview(&finished, Utc::now()).await.unwrap()[0]
        .assignment
        .id;
    fx.engine
        .complete_item(&finished, PROGRAM, finished_id, modules[0], ItemOutcome::default())
        .await
        .unwrap();

    let added = fx.reading_modules(program, 1)[0];
    let created = fx
        .engine
        .backfill_item(&fx.admin, PROGRAM, program, added)
        .await
        .unwrap();
    assert_eq!(created, 1);

    let fresh_views = fx.engine.learner_overview(&fresh, Utc::now()).await.unwrap();
    assert_eq!(fresh_views[0].total_items, 2);
    let finished_views = fx.engine.learner_overview(&finished, Utc::now()).await.unwrap();
    assert_eq!(finished_views[0].total_items, 1);
    assert_eq!(finished_views[0].status, DerivedStatus::Completed);
}

#[tokio::test]
async fn backfill_of_unknown_item_is_not_found() {
    let fx = Fixture::new();
    let (program, _) = fx.program("Onboarding", 1);

    let err = fx
        .engine
        .backfill_item(&fx.admin, PROGRAM, program, 4242)
        .await
        .unwrap_err();

    assert_matches!(err, CoreError::NotFound { entity: "module", id: 4242 });
}
