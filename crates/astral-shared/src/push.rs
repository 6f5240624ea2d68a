//! Push envelope decoding and outbound control frames.
//!
//! The server wraps every pushed entity in `{"type": ..., "data": ...}`.
//! Decoding never fails: anything that does not match a known envelope
//! shape classifies as [`PushKind::Unknown`] and is dropped downstream.
//! A bad frame must not be able to take the connection down.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Notification, PrivateMessage};
use crate::types::UserId;

pub const PUSH_TYPE_NOTIFICATION: &str = "notification";
pub const PUSH_TYPE_PRIVATE_MESSAGE: &str = "private_message";

/// Classified payload of one inbound push frame.
#[derive(Debug, Clone)]
pub enum PushKind {
    Notification(Box<Notification>),
    PrivateMessage(Box<PrivateMessage>),
    /// Malformed or unrecognized frame. Logged and discarded by the router.
    Unknown,
}

impl PushKind {
    pub fn name(&self) -> &'static str {
        match self {
            PushKind::Notification(_) => "notification",
            PushKind::PrivateMessage(_) => "private_message",
            PushKind::Unknown => "unknown",
        }
    }
}

/// An inbound push event. Immutable once decoded; consumed exactly once.
#[derive(Debug, Clone)]
pub struct PushEvent {
    pub kind: PushKind,
    pub received_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct PushEnvelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: serde_json::Value,
}

impl PushEvent {
    /// Decode a raw frame. Infallible by contract: malformed input yields
    /// an `Unknown` event rather than an error.
    pub fn decode(raw: &str) -> PushEvent {
        PushEvent {
            kind: classify(raw),
            received_at: Utc::now(),
        }
    }
}

fn classify(raw: &str) -> PushKind {
    let envelope: PushEnvelope = match serde_json::from_str(raw) {
        Ok(envelope) => envelope,
        Err(_) => return PushKind::Unknown,
    };

    match envelope.kind.as_str() {
        PUSH_TYPE_NOTIFICATION => serde_json::from_value::<Notification>(envelope.data)
            .map(|n| PushKind::Notification(Box::new(n)))
            .unwrap_or(PushKind::Unknown),
        PUSH_TYPE_PRIVATE_MESSAGE => serde_json::from_value::<PrivateMessage>(envelope.data)
            .map(|m| PushKind::PrivateMessage(Box::new(m)))
            .unwrap_or(PushKind::Unknown),
        _ => PushKind::Unknown,
    }
}

/// Control frame announcing the user after the transport opens.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectFrame {
    pub event: &'static str,
    pub user_id: UserId,
}

impl ConnectFrame {
    pub fn new(user_id: UserId) -> Self {
        Self {
            event: "connect",
            user_id,
        }
    }
}

/// Control frame subscribing the session to a topic.
#[derive(Debug, Clone, Serialize)]
pub struct SubscribeFrame {
    pub event: &'static str,
    pub topic: String,
}

impl SubscribeFrame {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            event: "subscribe",
            topic: topic.into(),
        }
    }
}
