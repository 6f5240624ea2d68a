// Shared wire contract and domain model for the astral sync engine.

pub mod auth;
pub mod constants;
pub mod envelope;
pub mod error;
pub mod model;
pub mod push;
pub mod types;

pub use auth::{Identity, IdentityProvider, NoIdentity, StaticIdentity};
pub use envelope::ResponseMessage;
pub use error::DomainError;
pub use push::{PushEvent, PushKind};
pub use types::{CommentId, FriendId, MessageId, NotificationId, UserId};
