use serde::{Deserialize, Serialize};

// Entity identifiers are server-issued integers.

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub i64);

impl UserId {
    /// The per-user private push topic.
    pub fn notification_topic(&self) -> String {
        format!("/user/{}/notifications", self.0)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotificationId(pub i64);

impl std::fmt::Display for NotificationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub i64);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommentId(pub i64);

impl CommentId {
    /// Sentinel parent id marking a top-level comment.
    pub const TOP_LEVEL: CommentId = CommentId(0);

    pub fn is_top_level(&self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for CommentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for CommentId {
    fn default() -> Self {
        CommentId::TOP_LEVEL
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FriendId(pub i64);

impl std::fmt::Display for FriendId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Notification type code as issued by the server.
///
/// Kept as an open set: the server adds codes over time and an unknown
/// code must still flow through counters and filters unchanged.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct NotificationKind(pub u8);

impl NotificationKind {
    pub const GALAXY_COMMENT_REPLY: NotificationKind = NotificationKind(1);
    pub const GALAXY_COMMENT_LIKE: NotificationKind = NotificationKind(2);
    pub const GALAXY_NEW_COMMENT: NotificationKind = NotificationKind(3);
    pub const PLANET_COMMENT_REPLY: NotificationKind = NotificationKind(4);
    pub const PLANET_COMMENT_LIKE: NotificationKind = NotificationKind(5);
    pub const PLANET_NEW_COMMENT: NotificationKind = NotificationKind(6);
    pub const SYSTEM: NotificationKind = NotificationKind(7);

    pub fn describe(&self) -> &'static str {
        match self.0 {
            1 | 4 => "comment reply",
            2 | 5 => "comment like",
            3 | 6 => "new comment",
            7 => "system",
            _ => "other",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Private-message content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum MessageKind {
    Text,
    Image,
    File,
    /// Unrecognized code, carried through untouched.
    Other(u8),
}

impl Default for MessageKind {
    fn default() -> Self {
        MessageKind::Text
    }
}

impl From<MessageKind> for u8 {
    fn from(kind: MessageKind) -> u8 {
        match kind {
            MessageKind::Text => 0,
            MessageKind::Image => 1,
            MessageKind::File => 2,
            MessageKind::Other(code) => code,
        }
    }
}

impl TryFrom<u8> for MessageKind {
    type Error = std::convert::Infallible;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            0 => MessageKind::Text,
            1 => MessageKind::Image,
            2 => MessageKind::File,
            other => MessageKind::Other(other),
        })
    }
}

/// Private-message lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum MessageStatus {
    Normal,
    Deleted,
    Recalled,
}

impl Default for MessageStatus {
    fn default() -> Self {
        MessageStatus::Normal
    }
}

impl From<MessageStatus> for u8 {
    fn from(status: MessageStatus) -> u8 {
        match status {
            MessageStatus::Normal => 0,
            MessageStatus::Deleted => 1,
            MessageStatus::Recalled => 2,
        }
    }
}

impl TryFrom<u8> for MessageStatus {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(MessageStatus::Normal),
            1 => Ok(MessageStatus::Deleted),
            2 => Ok(MessageStatus::Recalled),
            other => Err(format!("invalid message status {other}")),
        }
    }
}

/// Comment moderation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum CommentStatus {
    Normal,
    Hidden,
    Deleted,
}

impl Default for CommentStatus {
    fn default() -> Self {
        CommentStatus::Normal
    }
}

impl From<CommentStatus> for u8 {
    fn from(status: CommentStatus) -> u8 {
        match status {
            CommentStatus::Normal => 0,
            CommentStatus::Hidden => 1,
            CommentStatus::Deleted => 2,
        }
    }
}

impl TryFrom<u8> for CommentStatus {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(CommentStatus::Normal),
            1 => Ok(CommentStatus::Hidden),
            2 => Ok(CommentStatus::Deleted),
            other => Err(format!("invalid comment status {other}")),
        }
    }
}

/// Friend relationship status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum FriendStatus {
    Pending,
    Accepted,
    Rejected,
}

impl Default for FriendStatus {
    fn default() -> Self {
        FriendStatus::Pending
    }
}

impl From<FriendStatus> for u8 {
    fn from(status: FriendStatus) -> u8 {
        match status {
            FriendStatus::Pending => 0,
            FriendStatus::Accepted => 1,
            FriendStatus::Rejected => 2,
        }
    }
}

impl TryFrom<u8> for FriendStatus {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(FriendStatus::Pending),
            1 => Ok(FriendStatus::Accepted),
            2 => Ok(FriendStatus::Rejected),
            other => Err(format!("invalid friend status {other}")),
        }
    }
}

/// The container a comment thread belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommentScope {
    /// A planet, addressed by its string id.
    Planet(String),
    /// A galaxy, addressed by its numeric id.
    Galaxy(i64),
}

impl std::fmt::Display for CommentScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommentScope::Planet(id) => write!(f, "planet:{id}"),
            CommentScope::Galaxy(id) => write!(f, "galaxy:{id}"),
        }
    }
}

/// Serialize a bool as the wire's 0/1 integer flag.
pub mod int_flag {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*value as u8)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(u8::deserialize(deserializer)? != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_topic_format() {
        assert_eq!(UserId(42).notification_topic(), "/user/42/notifications");
    }

    #[test]
    fn test_message_status_codes() {
        assert_eq!(u8::from(MessageStatus::Recalled), 2);
        assert_eq!(MessageStatus::try_from(2).unwrap(), MessageStatus::Recalled);
        assert!(MessageStatus::try_from(9).is_err());
    }

    #[test]
    fn test_message_kind_tolerates_unknown_codes() {
        assert_eq!(MessageKind::try_from(7).unwrap(), MessageKind::Other(7));
        assert_eq!(u8::from(MessageKind::Other(7)), 7);
    }

    #[test]
    fn test_notification_kind_is_open() {
        let kind: NotificationKind = serde_json::from_str("99").unwrap();
        assert_eq!(kind, NotificationKind(99));
        assert_eq!(kind.describe(), "other");
    }
}
