//! Domain entities as they travel over the wire.
//!
//! These structs mirror the server's JSON contract (camelCase fields,
//! integer-coded flags). The reconcilers in `astral-store` own the live
//! collections of these values; nothing else mutates them.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{
    int_flag, CommentId, CommentScope, CommentStatus, FriendId, FriendStatus, MessageId,
    MessageKind, MessageStatus, NotificationId, NotificationKind, UserId,
};

fn unix_epoch() -> DateTime<Utc> {
    DateTime::UNIX_EPOCH
}

/// A single notification, pushed or fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub notification_id: NotificationId,
    #[serde(default)]
    pub sender_id: Option<UserId>,
    #[serde(default)]
    pub sender_name: Option<String>,
    #[serde(default)]
    pub sender_avatar: Option<String>,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    /// Wire flag 0/1. Once read, a notification never becomes unread again.
    #[serde(default, with = "int_flag")]
    pub is_read: bool,
    #[serde(default = "unix_epoch")]
    pub create_time: DateTime<Utc>,
    #[serde(default)]
    pub read_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub target_type: Option<u8>,
    #[serde(default)]
    pub target_id: Option<String>,
    #[serde(default)]
    pub target_title: Option<String>,
    #[serde(default)]
    pub jump_url: Option<String>,
}

/// Derived unread aggregate for the notification feed.
///
/// Invariant: `total == by_type.values().sum()` and both equal the number
/// of unread notifications in the owning collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCount {
    pub total: u64,
    #[serde(default)]
    pub by_type: HashMap<u8, u64>,
}

impl UnreadCount {
    pub fn increment(&mut self, kind: NotificationKind) {
        self.total += 1;
        *self.by_type.entry(kind.0).or_insert(0) += 1;
    }

    pub fn decrement(&mut self, kind: NotificationKind) {
        self.total = self.total.saturating_sub(1);
        if let Some(count) = self.by_type.get_mut(&kind.0) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.by_type.remove(&kind.0);
            }
        }
    }

    /// Rebuild the aggregate from the unread items of a collection.
    pub fn recount<'a>(items: impl Iterator<Item = &'a Notification>) -> Self {
        let mut counts = UnreadCount::default();
        for item in items.filter(|n| !n.is_read) {
            counts.increment(item.kind);
        }
        counts
    }

    pub fn is_consistent(&self) -> bool {
        self.total == self.by_type.values().sum::<u64>()
    }

    pub fn clear(&mut self) {
        self.total = 0;
        self.by_type.clear();
    }
}

/// A private message between two users.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateMessage {
    pub message_id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    #[serde(default)]
    pub sender_name: Option<String>,
    #[serde(default)]
    pub sender_avatar: Option<String>,
    pub content: String,
    #[serde(rename = "messageType", default)]
    pub kind: MessageKind,
    #[serde(default)]
    pub attachment_url: Option<String>,
    #[serde(default, with = "int_flag")]
    pub is_read: bool,
    #[serde(default)]
    pub status: MessageStatus,
    #[serde(default = "unix_epoch")]
    pub create_time: DateTime<Utc>,
    #[serde(default)]
    pub read_time: Option<DateTime<Utc>>,
}

impl PrivateMessage {
    /// The session key: whichever endpoint of the message is not `local_user`.
    pub fn counterpart(&self, local_user: UserId) -> UserId {
        if self.sender_id == local_user {
            self.receiver_id
        } else {
            self.sender_id
        }
    }

    /// Short preview used for session rows and arrival effects.
    pub fn preview(&self) -> &str {
        match self.kind {
            MessageKind::Image => "[image]",
            MessageKind::File => "[file]",
            _ => &self.content,
        }
    }
}

/// One row of the chat session list. Local state, keyed by the friend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    #[serde(default)]
    pub friend_id: Option<FriendId>,
    pub friend_user_id: UserId,
    pub friend_name: String,
    #[serde(default)]
    pub friend_avatar: Option<String>,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default)]
    pub last_message_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub unread_count: u64,
    #[serde(default)]
    pub is_online: bool,
}

/// A comment on a planet or galaxy. `parent_id == 0` marks a top-level
/// comment; replies reference their parent comment id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub comment_id: CommentId,
    #[serde(default)]
    pub planet_id: Option<String>,
    #[serde(default)]
    pub galaxy_id: Option<i64>,
    pub user_id: UserId,
    #[serde(default)]
    pub user_name: Option<String>,
    pub content: String,
    #[serde(default)]
    pub parent_id: CommentId,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub status: CommentStatus,
    #[serde(default = "unix_epoch")]
    pub create_time: DateTime<Utc>,
    #[serde(default)]
    pub update_time: Option<DateTime<Utc>>,
}

impl Comment {
    pub fn scope(&self) -> Option<CommentScope> {
        if let Some(planet) = &self.planet_id {
            Some(CommentScope::Planet(planet.clone()))
        } else {
            self.galaxy_id.map(CommentScope::Galaxy)
        }
    }
}

/// A friend relationship row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Friend {
    pub friend_id: FriendId,
    pub friend_user_id: UserId,
    #[serde(default)]
    pub friend_nickname: Option<String>,
    #[serde(default)]
    pub friend_avatar: Option<String>,
    #[serde(default)]
    pub status: FriendStatus,
    #[serde(default)]
    pub is_online: bool,
    #[serde(default)]
    pub unread_count: u64,
    #[serde(default)]
    pub last_chat_time: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_decodes_wire_shape() {
        let raw = r#"{
            "notificationId": 9,
            "senderId": 3,
            "type": 5,
            "title": "Someone liked your comment",
            "isRead": 0,
            "createTime": "2024-06-01T10:00:00Z",
            "targetType": 3,
            "targetId": "planet-7"
        }"#;
        let n: Notification = serde_json::from_str(raw).unwrap();
        assert_eq!(n.notification_id, NotificationId(9));
        assert_eq!(n.kind, NotificationKind::PLANET_COMMENT_LIKE);
        assert!(!n.is_read);
        assert!(n.content.is_none());
    }

    #[test]
    fn test_unread_count_roundtrips_string_keys() {
        let raw = r#"{"total": 3, "byType": {"1": 2, "7": 1}}"#;
        let counts: UnreadCount = serde_json::from_str(raw).unwrap();
        assert_eq!(counts.total, 3);
        assert_eq!(counts.by_type.get(&1), Some(&2));
        assert!(counts.is_consistent());
    }

    #[test]
    fn test_unread_decrement_saturates() {
        let mut counts = UnreadCount::default();
        counts.decrement(NotificationKind::SYSTEM);
        assert_eq!(counts.total, 0);
        assert!(counts.by_type.is_empty());
    }

    #[test]
    fn test_message_counterpart() {
        let raw = r#"{
            "messageId": 1,
            "senderId": 10,
            "receiverId": 20,
            "content": "hi"
        }"#;
        let msg: PrivateMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(msg.counterpart(UserId(10)), UserId(20));
        assert_eq!(msg.counterpart(UserId(20)), UserId(10));
        assert_eq!(msg.status, MessageStatus::Normal);
    }

    #[test]
    fn test_comment_scope() {
        let raw = r#"{
            "commentId": 4,
            "planetId": "p-1",
            "userId": 2,
            "content": "nice",
            "parentId": 0,
            "likeCount": 1,
            "status": 0,
            "createTime": "2024-06-01T10:00:00Z"
        }"#;
        let c: Comment = serde_json::from_str(raw).unwrap();
        assert_eq!(c.scope(), Some(CommentScope::Planet("p-1".into())));
        assert!(c.parent_id.is_top_level());
    }
}
