//! Real-time notification delivery.
//!
//! Notifications are written by the engine and the deadline scheduler; the
//! [`NotificationRelay`] picks them up from Postgres and pushes them to the
//! owner's open WebSocket connections.

pub mod relay;

pub use relay::NotificationRelay;
