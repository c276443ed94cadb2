//! Shared harness for HTTP-level integration tests.
//!
//! Requests go straight into the router via `tower::ServiceExt::oneshot`;
//! no TCP listener is involved.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;
use trainhub_api::auth::jwt::{generate_access_token, JwtConfig};
use trainhub_api::config::ServerConfig;
use trainhub_api::router::build_app_router;
use trainhub_api::state::AppState;
use trainhub_api::ws::WsManager;
use trainhub_core::roles::{ROLE_ADMIN, ROLE_INSTRUCTOR, ROLE_USER};
use trainhub_core::types::DbId;
use trainhub_db::models::company::CreateCompany;
use trainhub_db::models::user::CreateUser;
use trainhub_db::repositories::{CompanyRepo, UserRepo};

pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        deadline_check_interval_secs: 3600,
        jwt: JwtConfig {
            secret: "test-secret-for-integration-tests".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// The production router over `pool`.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState::new(pool, config.clone(), Arc::new(WsManager::new()));
    build_app_router(state, &config)
}

/// A seeded user together with a valid bearer token.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: DbId,
    pub company_id: DbId,
    pub token: String,
}

pub async fn create_company(pool: &PgPool, name: &str) -> DbId {
    CompanyRepo::create(
        pool,
        &CreateCompany {
            name: name.to_string(),
        },
    )
    .await
    .unwrap()
    .id
}

pub async fn create_user(pool: &PgPool, company_id: DbId, email: &str, role: &str) -> TestUser {
    let user = UserRepo::create(
        pool,
        &CreateUser {
            company_id,
            email: email.to_string(),
            full_name: email.to_string(),
            role: Some(role.to_string()),
        },
    )
    .await
    .unwrap();
    let token =
        generate_access_token(user.id, company_id, role, &test_config().jwt).unwrap();
    TestUser {
        id: user.id,
        company_id,
        token,
    }
}

/// One company with an admin, an instructor and a learner.
pub struct Tenant {
    pub company_id: DbId,
    pub admin: TestUser,
    pub instructor: TestUser,
    pub learner: TestUser,
}

impl Tenant {
    pub async fn new(pool: &PgPool, name: &str) -> Self {
        let company_id = create_company(pool, name).await;
        let domain = name.to_lowercase();
        Self {
            company_id,
            admin: create_user(pool, company_id, &format!("admin@{domain}.test"), ROLE_ADMIN).await,
            instructor: create_user(
                pool,
                company_id,
                &format!("instructor@{domain}.test"),
                ROLE_INSTRUCTOR,
            )
            .await,
            learner: create_user(pool, company_id, &format!("learner@{domain}.test"), ROLE_USER)
                .await,
        }
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn get(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn post_empty(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), None).await
}

pub async fn delete(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
