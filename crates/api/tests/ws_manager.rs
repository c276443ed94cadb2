//! `WsManager` bookkeeping and notification relay delivery, exercised
//! without HTTP upgrades.

use std::sync::Arc;

use axum::extract::ws::Message;
use sqlx::postgres::PgPoolOptions;
use trainhub_api::notifications::NotificationRelay;
use trainhub_api::ws::WsManager;

#[tokio::test]
async fn add_and_remove_track_connection_count() {
    let manager = WsManager::new();
    assert_eq!(manager.connection_count().await, 0);

    let _a = manager.add("conn-1".to_string(), 1).await;
    let _b = manager.add("conn-2".to_string(), 1).await;
    assert_eq!(manager.connection_count().await, 2);

    manager.remove("conn-1").await;
    assert_eq!(manager.connection_count().await, 1);

    // Removing an unknown connection is harmless.
    manager.remove("conn-404").await;
    assert_eq!(manager.connection_count().await, 1);
}

#[tokio::test]
async fn send_to_user_reaches_every_tab_of_that_user_only() {
    let manager = WsManager::new();
    let mut first_tab = manager.add("conn-1".to_string(), 7).await;
    let mut second_tab = manager.add("conn-2".to_string(), 7).await;
    let mut other_user = manager.add("conn-3".to_string(), 8).await;

    let sent = manager
        .send_to_user(7, Message::Text("hello".to_string().into()))
        .await;

    assert_eq!(sent, 2);
    assert!(matches!(first_tab.try_recv(), Ok(Message::Text(t)) if t.as_str() == "hello"));
    assert!(matches!(second_tab.try_recv(), Ok(Message::Text(_))));
    assert!(other_user.try_recv().is_err());
}

#[tokio::test]
async fn shutdown_all_sends_close_and_clears() {
    let manager = WsManager::new();
    let mut rx = manager.add("conn-1".to_string(), 1).await;

    manager.shutdown_all().await;

    assert_eq!(manager.connection_count().await, 0);
    assert!(matches!(rx.try_recv(), Ok(Message::Close(None))));
}

#[tokio::test]
async fn relay_forwards_trigger_payload_to_owner() {
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://localhost/unused")
        .unwrap();
    let manager = Arc::new(WsManager::new());
    let mut rx = manager.add("conn-1".to_string(), 42).await;
    let relay = NotificationRelay::new(pool, Arc::clone(&manager));

    let payload = serde_json::json!({
        "id": 5,
        "user_id": 42,
        "type": "assignment",
        "title": "New program assigned",
        "message": "You have been assigned \"Security basics\"",
        "link": "/programs/3",
        "read": false,
        "created_at": "2026-03-10T09:00:00.000000+00:00"
    });
    relay.forward(&payload.to_string()).await;

    let Ok(Message::Text(text)) = rx.try_recv() else {
        panic!("expected a text frame");
    };
    let frame: serde_json::Value = serde_json::from_str(text.as_str()).unwrap();
    assert_eq!(frame["type"], "notification");
    assert_eq!(frame["data"]["id"], 5);
    assert_eq!(frame["data"]["type"], "assignment");
}

#[tokio::test]
async fn relay_drops_malformed_payloads() {
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://localhost/unused")
        .unwrap();
    let manager = Arc::new(WsManager::new());
    let mut rx = manager.add("conn-1".to_string(), 42).await;
    let relay = NotificationRelay::new(pool, Arc::clone(&manager));

    relay.forward("not json").await;

    assert!(rx.try_recv().is_err());
}
