//! Friend directory: accepted friends and pending requests.
//!
//! Thin by design — the interesting merge logic lives in the chat and
//! notification reconcilers; this list mainly seeds the chat session list
//! and tracks presence.

use astral_shared::model::Friend;
use astral_shared::types::{FriendId, FriendStatus, UserId};

#[derive(Debug, Default)]
pub struct FriendDirectory {
    friends: Vec<Friend>,
    pending: Vec<Friend>,
}

impl FriendDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn friends(&self) -> &[Friend] {
        &self.friends
    }

    pub fn pending(&self) -> &[Friend] {
        &self.pending
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn accepted(&self) -> impl Iterator<Item = &Friend> {
        self.friends
            .iter()
            .filter(|f| f.status == FriendStatus::Accepted)
    }

    pub fn online(&self) -> impl Iterator<Item = &Friend> {
        self.friends.iter().filter(|f| f.is_online)
    }

    pub fn set_friends(&mut self, friends: Vec<Friend>) {
        self.friends = friends;
    }

    pub fn set_pending(&mut self, pending: Vec<Friend>) {
        self.pending = pending;
    }

    /// Move an accepted request from the pending list into the friend
    /// list. Returns whether the request was known.
    pub fn accept(&mut self, friend_id: FriendId) -> bool {
        let Some(index) = self.pending.iter().position(|f| f.friend_id == friend_id) else {
            return false;
        };
        let mut friend = self.pending.remove(index);
        friend.status = FriendStatus::Accepted;
        self.friends.push(friend);
        true
    }

    /// Drop a rejected request from the pending list.
    pub fn reject(&mut self, friend_id: FriendId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|f| f.friend_id != friend_id);
        before != self.pending.len()
    }

    /// Remove a friend by their user id.
    pub fn remove(&mut self, friend_user_id: UserId) -> bool {
        let before = self.friends.len();
        self.friends.retain(|f| f.friend_user_id != friend_user_id);
        before != self.friends.len()
    }

    /// Presence update from the liveness topic.
    pub fn set_online(&mut self, friend_user_id: UserId, online: bool) {
        if let Some(friend) = self
            .friends
            .iter_mut()
            .find(|f| f.friend_user_id == friend_user_id)
        {
            friend.is_online = online;
        }
    }
}
