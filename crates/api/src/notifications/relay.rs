//! Postgres `LISTEN` to WebSocket relay.
//!
//! Every insert into `notifications` fires `pg_notify` with the row as JSON.
//! [`NotificationRelay`] listens on that channel and forwards each row to
//! the connections of its user as a `{"type": "notification", "data": …}`
//! text frame. Users without an open connection simply see the row the
//! next time they list their notifications.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::Message;
use sqlx::postgres::PgListener;
use tokio_util::sync::CancellationToken;
use trainhub_core::notifications::PG_CHANNEL;
use trainhub_db::models::notification::Notification;
use trainhub_db::DbPool;

use crate::ws::WsManager;

/// Pause before retrying after the listener connection fails.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

pub struct NotificationRelay {
    pool: DbPool,
    ws_manager: Arc<WsManager>,
}

impl NotificationRelay {
    pub fn new(pool: DbPool, ws_manager: Arc<WsManager>) -> Self {
        Self { pool, ws_manager }
    }

    /// Run until `cancel` fires, reconnecting the listener on failure.
    pub async fn run(self, cancel: CancellationToken) {
        loop {
            let mut listener = match self.connect().await {
                Ok(listener) => listener,
                Err(e) => {
                    tracing::error!(error = %e, "Notification listener failed to connect");
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(RECONNECT_DELAY) => continue,
                    }
                }
            };
            tracing::info!(channel = PG_CHANNEL, "Notification relay listening");

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::info!("Notification relay cancelled");
                        return;
                    }
                    received = listener.recv() => match received {
                        Ok(notification) => self.forward(notification.payload()).await,
                        Err(e) => {
                            tracing::warn!(error = %e, "Notification listener error, reconnecting");
                            break;
                        }
                    }
                }
            }
        }
    }

    async fn connect(&self) -> Result<PgListener, sqlx::Error> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(PG_CHANNEL).await?;
        Ok(listener)
    }

    /// Push one notification payload to its owner.
    pub async fn forward(&self, payload: &str) {
        let notification: Notification = match serde_json::from_str(payload) {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(error = %e, "Unparseable notification payload");
                return;
            }
        };

        let frame = serde_json::json!({
            "type": "notification",
            "data": notification,
        });
        let delivered = self
            .ws_manager
            .send_to_user(notification.user_id, Message::Text(frame.to_string().into()))
            .await;
        tracing::debug!(
            notification_id = notification.id,
            user_id = notification.user_id,
            delivered,
            "Notification relayed",
        );
    }
}
