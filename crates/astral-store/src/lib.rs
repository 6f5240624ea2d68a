// Domain reconcilers: ordered, deduplicated local collections merging
// paginated fetches, optimistic local writes, and pushed events into one
// consistent view. Pure and synchronous; all I/O lives in astral-client.

pub mod chat;
pub mod comments;
pub mod friends;
pub mod notifications;
pub mod pager;

pub use chat::{ChatState, HistoryApplied, PushReceipt};
pub use comments::{CommentForest, CommentNode};
pub use friends::FriendDirectory;
pub use notifications::{FeedFilter, NotificationFeed};
pub use pager::PageCursor;

/// Outcome of ingesting a pushed entity. Push delivery is at-least-once;
/// a duplicate applies nothing and must trigger no downstream effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingest {
    Applied,
    Duplicate,
}

impl Ingest {
    pub fn applied(&self) -> bool {
        matches!(self, Ingest::Applied)
    }
}
