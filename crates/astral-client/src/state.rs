//! Application state shared across actions and the router.
//!
//! One mutex over all reconcilers is the serialization point required by
//! the concurrency model: every merge (fetch page, push ingest, optimistic
//! write) runs to completion under the lock, and lock scopes never span an
//! await.

use std::sync::{Arc, Mutex, MutexGuard};

use astral_store::{ChatState, CommentForest, FriendDirectory, NotificationFeed};

/// All reconciler-owned collections for one logged-in user.
pub struct ClientState {
    pub notifications: NotificationFeed,
    pub chat: ChatState,
    pub planet_comments: CommentForest,
    pub galaxy_comments: CommentForest,
    pub friends: FriendDirectory,
}

impl ClientState {
    pub fn new(page_size: u32) -> Self {
        Self {
            notifications: NotificationFeed::new(page_size),
            chat: ChatState::new(page_size),
            planet_comments: CommentForest::new(page_size),
            galaxy_comments: CommentForest::new(page_size),
            friends: FriendDirectory::new(),
        }
    }
}

pub type SharedState = Arc<Mutex<ClientState>>;

pub fn shared(page_size: u32) -> SharedState {
    Arc::new(Mutex::new(ClientState::new(page_size)))
}

/// Lock helper: the state holds plain data, so a poisoned lock still
/// carries a usable value.
pub(crate) fn lock(state: &SharedState) -> MutexGuard<'_, ClientState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
