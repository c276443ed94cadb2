//! HTTP-level tests for the catalog, assignment and learner endpoints.

mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, delete, get, post_empty, post_json, send, Tenant, TestUser};
use serde_json::json;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn create_program(pool: &PgPool, user: &TestUser, body: serde_json::Value) -> i64 {
    let app = common::build_test_app(pool.clone());
    let response = post_json(app, "/api/v1/programs", &user.token, body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

async fn add_reading(pool: &PgPool, user: &TestUser, program_id: i64) -> i64 {
    let app = common::build_test_app(pool.clone());
    let response = post_json(
        app,
        &format!("/api/v1/programs/{program_id}/modules"),
        &user.token,
        json!({
            "title": "Reading",
            "content": { "type": "content_section", "body": "Lock your screen." }
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

async fn add_quiz(pool: &PgPool, user: &TestUser, program_id: i64) -> i64 {
    let app = common::build_test_app(pool.clone());
    let response = post_json(
        app,
        &format!("/api/v1/programs/{program_id}/modules"),
        &user.token,
        json!({
            "title": "Final quiz",
            "content": {
                "type": "final_quiz",
                "questions": [
                    { "prompt": "Lock your screen?", "options": ["Yes", "No"], "correctIndex": 0 }
                ]
            }
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

async fn assign_users(pool: &PgPool, admin: &TestUser, program_id: i64, users: &[i64]) {
    let app = common::build_test_app(pool.clone());
    let response = post_json(
        app,
        &format!("/api/v1/assignments/program/{program_id}"),
        &admin.token,
        json!({ "user_ids": users }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

/// The learner's dashboard entry for `program_id`.
async fn my_view(pool: &PgPool, learner: &TestUser, program_id: i64) -> serde_json::Value {
    let app = common::build_test_app(pool.clone());
    let json = body_json(get(app, "/api/v1/me/assignments", &learner.token).await).await;
    json["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|view| view["assignment"]["target_id"] == program_id)
        .cloned()
        .unwrap()
}

// ---------------------------------------------------------------------------
// Health and access control
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_health_reports_database(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = send(app, Method::GET, "/health", None, None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["db_healthy"], true);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_missing_token_is_unauthorized(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = send(app, Method::GET, "/api/v1/programs", None, None).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_roles_gate_writes(pool: PgPool) {
    let acme = Tenant::new(&pool, "Acme").await;

    let app = common::build_test_app(pool.clone());
    let response = post_json(
        app,
        "/api/v1/programs",
        &acme.learner.token,
        json!({ "title": "Not mine to write" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let program_id = create_program(&pool, &acme.instructor, json!({ "title": "Onboarding" })).await;

    // Instructors author content but do not assign it.
    let app = common::build_test_app(pool.clone());
    let response = post_json(
        app,
        &format!("/api/v1/assignments/program/{program_id}"),
        &acme.instructor.token,
        json!({ "user_ids": [acme.learner.id] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "FORBIDDEN");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_other_company_is_rejected(pool: PgPool) {
    let acme = Tenant::new(&pool, "Acme").await;
    let globex = Tenant::new(&pool, "Globex").await;
    let program_id = create_program(&pool, &acme.admin, json!({ "title": "Acme only" })).await;

    let app = common::build_test_app(pool.clone());
    let response = get(app, &format!("/api/v1/programs/{program_id}"), &globex.admin.token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "CROSS_TENANT");

    // Assigning a user from another company fails before anything is written.
    let app = common::build_test_app(pool.clone());
    let response = post_json(
        app,
        &format!("/api/v1/assignments/program/{program_id}"),
        &acme.admin.token,
        json!({ "user_ids": [acme.learner.id, globex.learner.id] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let app = common::build_test_app(pool);
    let json = body_json(get(app, "/api/v1/me/assignments", &acme.learner.token).await).await;
    assert!(json["data"].as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unknown_kind_is_bad_request(pool: PgPool) {
    let acme = Tenant::new(&pool, "Acme").await;

    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/assignments/course/1",
        &acme.admin.token,
        json!({ "user_ids": [acme.learner.id] }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}

// ---------------------------------------------------------------------------
// Catalog validation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_prerequisite_cycle_is_rejected(pool: PgPool) {
    let acme = Tenant::new(&pool, "Acme").await;
    let first = create_program(&pool, &acme.instructor, json!({ "title": "First" })).await;
    let second = create_program(
        &pool,
        &acme.instructor,
        json!({
            "title": "Second",
            "prerequisite_type": "specific_courses",
            "prerequisite_course_ids": [first]
        }),
    )
    .await;

    let app = common::build_test_app(pool);
    let response = send(
        app,
        Method::PUT,
        &format!("/api/v1/programs/{first}"),
        Some(&acme.instructor.token),
        Some(json!({
            "prerequisite_type": "specific_courses",
            "prerequisite_course_ids": [second]
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_quiz_module_needs_two_options(pool: PgPool) {
    let acme = Tenant::new(&pool, "Acme").await;
    let program_id = create_program(&pool, &acme.instructor, json!({ "title": "Quiz" })).await;

    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        &format!("/api/v1/programs/{program_id}/modules"),
        &acme.instructor.token,
        json!({
            "title": "Broken",
            "content": {
                "type": "question",
                "question": { "prompt": "Only one?", "options": ["Yes"], "correctIndex": 0 }
            }
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Assignment and learner flow
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_department_assignment_to_badge(pool: PgPool) {
    let acme = Tenant::new(&pool, "Acme").await;
    let program_id = create_program(
        &pool,
        &acme.instructor,
        json!({ "title": "Security basics", "badge_enabled": true }),
    )
    .await;
    let reading = add_reading(&pool, &acme.instructor, program_id).await;
    let quiz = add_quiz(&pool, &acme.instructor, program_id).await;

    // Department with the learner as its only member.
    let app = common::build_test_app(pool.clone());
    let response = post_json(
        app,
        "/api/v1/departments",
        &acme.admin.token,
        json!({ "name": "Support" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let department_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let app = common::build_test_app(pool.clone());
    let response = post_json(
        app,
        &format!("/api/v1/departments/{department_id}/members"),
        &acme.admin.token,
        json!({ "user_id": acme.learner.id }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let app = common::build_test_app(pool.clone());
    let response = post_json(
        app,
        &format!("/api/v1/assignments/program/{program_id}"),
        &acme.admin.token,
        json!({ "department_ids": [department_id] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["summary"]["assigned"], 1);
    assert_eq!(json["data"]["message"], "1 assigned, 0 already had access");

    let view = my_view(&pool, &acme.learner, program_id).await;
    assert_eq!(view["status"], "not_started");
    assert_eq!(view["total_items"], 2);
    let assignment_id = view["assignment"]["id"].as_i64().unwrap();
    let base = format!("/api/v1/me/assignments/program/{assignment_id}/items");

    let app = common::build_test_app(pool.clone());
    let response = post_empty(app, &format!("{base}/{reading}/start"), &acme.learner.token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let app = common::build_test_app(pool.clone());
    let response = post_json(
        app,
        &format!("{base}/{reading}/complete"),
        &acme.learner.token,
        json!({ "time_spent_secs": 90 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["progress_pct"], 50);

    // A quiz cannot be completed without answers.
    let app = common::build_test_app(pool.clone());
    let response = post_empty(app, &format!("{base}/{quiz}/complete"), &acme.learner.token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let app = common::build_test_app(pool.clone());
    let response = post_json(
        app,
        &format!("{base}/{quiz}/quiz"),
        &acme.learner.token,
        json!({ "answers": [0], "time_spent_secs": 30 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["assignment_completed"], true);
    assert_eq!(json["data"]["badge_awarded"], true);
    assert_eq!(json["data"]["progress_pct"], 100);

    let view = my_view(&pool, &acme.learner, program_id).await;
    assert_eq!(view["status"], "completed");

    let app = common::build_test_app(pool.clone());
    let json = body_json(get(app, "/api/v1/me/badges", &acme.learner.token).await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["title"], "Security basics");

    // Assignment and badge notifications are waiting in the inbox.
    let app = common::build_test_app(pool.clone());
    let json =
        body_json(get(app, "/api/v1/notifications/unread-count", &acme.learner.token).await).await;
    assert_eq!(json["data"]["count"], 2);

    let app = common::build_test_app(pool.clone());
    let json =
        body_json(post_empty(app, "/api/v1/notifications/read-all", &acme.learner.token).await)
            .await;
    assert_eq!(json["data"]["marked_read"], 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_manual_gate_waits_for_unlock(pool: PgPool) {
    let acme = Tenant::new(&pool, "Acme").await;

    let app = common::build_test_app(pool.clone());
    let response = post_json(
        app,
        "/api/v1/themes",
        &acme.instructor.token,
        json!({ "name": "Compliance" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let theme_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let first = create_program(
        &pool,
        &acme.instructor,
        json!({ "title": "Part 1", "theme_id": theme_id, "order_index": 0 }),
    )
    .await;
    let second = create_program(
        &pool,
        &acme.instructor,
        json!({
            "title": "Part 2",
            "theme_id": theme_id,
            "order_index": 1,
            "prerequisite_type": "previous_manual"
        }),
    )
    .await;
    let first_module = add_reading(&pool, &acme.instructor, first).await;
    let second_module = add_reading(&pool, &acme.instructor, second).await;
    assign_users(&pool, &acme.admin, first, &[acme.learner.id]).await;
    assign_users(&pool, &acme.admin, second, &[acme.learner.id]).await;

    let view = my_view(&pool, &acme.learner, second).await;
    assert_eq!(view["status"], "locked");
    let second_assignment = view["assignment"]["id"].as_i64().unwrap();

    let first_assignment = my_view(&pool, &acme.learner, first).await["assignment"]["id"]
        .as_i64()
        .unwrap();
    let app = common::build_test_app(pool.clone());
    let response = post_empty(
        app,
        &format!("/api/v1/me/assignments/program/{first_assignment}/items/{first_module}/complete"),
        &acme.learner.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let view = my_view(&pool, &acme.learner, second).await;
    assert_eq!(view["status"], "pending");

    let start_second =
        format!("/api/v1/me/assignments/program/{second_assignment}/items/{second_module}/start");
    let app = common::build_test_app(pool.clone());
    let response = post_empty(app, &start_second, &acme.learner.token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let app = common::build_test_app(pool.clone());
    let response = post_empty(
        app,
        &format!("/api/v1/assignments/program/{second_assignment}/unlock"),
        &acme.admin.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], "available");

    let view = my_view(&pool, &acme.learner, second).await;
    assert_eq!(view["status"], "not_started");

    let app = common::build_test_app(pool.clone());
    let response = post_empty(app, &start_second, &acme.learner.token).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unassign_and_overview(pool: PgPool) {
    let acme = Tenant::new(&pool, "Acme").await;
    let program_id = create_program(&pool, &acme.admin, json!({ "title": "Ethics" })).await;
    add_reading(&pool, &acme.admin, program_id).await;
    assign_users(&pool, &acme.admin, program_id, &[acme.learner.id]).await;

    // Assigning again reports the existing access.
    let app = common::build_test_app(pool.clone());
    let json = body_json(
        post_json(
            app,
            &format!("/api/v1/assignments/program/{program_id}"),
            &acme.admin.token,
            json!({ "user_ids": [acme.learner.id] }),
        )
        .await,
    )
    .await;
    assert_eq!(json["data"]["summary"]["already_assigned"], 1);

    let app = common::build_test_app(pool.clone());
    let response = get(
        app,
        &format!("/api/v1/assignments/program/{program_id}"),
        &acme.instructor.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["users"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"]["users"][0]["status"], "not_started");

    let app = common::build_test_app(pool.clone());
    let response = delete(
        app,
        &format!("/api/v1/assignments/program/{program_id}/users/{}", acme.learner.id),
        &acme.admin.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["removed_assignments"], 1);

    let app = common::build_test_app(pool);
    let json = body_json(get(app, "/api/v1/me/assignments", &acme.learner.token).await).await;
    assert!(json["data"].as_array().unwrap().is_empty());
}
