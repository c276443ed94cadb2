use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trainhub_api::config::ServerConfig;
use trainhub_api::notifications::NotificationRelay;
use trainhub_api::router::build_app_router;
use trainhub_api::state::AppState;
use trainhub_api::ws;
use trainhub_events::DeadlineScheduler;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    "trainhub_api=debug,trainhub_events=debug,tower_http=debug".into()
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = trainhub_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    trainhub_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    trainhub_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database ready");

    // --- Background tasks ---
    let cancel = CancellationToken::new();
    let ws_manager = Arc::new(ws::WsManager::new());

    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&ws_manager), cancel.clone());

    let relay = NotificationRelay::new(pool.clone(), Arc::clone(&ws_manager));
    let relay_handle = tokio::spawn(relay.run(cancel.clone()));

    let scheduler = DeadlineScheduler::new(pool.clone())
        .with_interval(Duration::from_secs(config.deadline_check_interval_secs));
    let scheduler_cancel = cancel.clone();
    let scheduler_handle = tokio::spawn(async move {
        scheduler.run(scheduler_cancel).await;
    });

    tracing::info!("Background tasks started (heartbeat, notification relay, deadline scheduler)");

    // --- Router ---
    let shutdown_timeout = Duration::from_secs(config.shutdown_timeout_secs);
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    let state = AppState::new(pool, config.clone(), Arc::clone(&ws_manager));
    let app = build_app_router(state, &config);

    // --- Start server ---
    tracing::info!(%addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    cancel.cancel();
    let stopped = tokio::time::timeout(shutdown_timeout, async {
        let _ = scheduler_handle.await;
        let _ = relay_handle.await;
        let _ = heartbeat_handle.await;
    })
    .await;
    if stopped.is_err() {
        tracing::warn!(
            timeout_secs = shutdown_timeout.as_secs(),
            "Background tasks did not stop in time"
        );
    }

    let ws_count = ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    ws_manager.shutdown_all().await;

    tracing::info!("Graceful shutdown complete");
}

/// Resolve on SIGINT, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
