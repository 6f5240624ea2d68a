//! Friend actions.

use astral_shared::types::{FriendId, UserId};

use crate::api::{ApiClient, FriendRequestBody};
use crate::error::Result;
use crate::state::{lock, SharedState};

/// Refresh both friend lists and reseed the chat session list.
pub async fn refresh(api: &ApiClient, state: &SharedState) -> Result<()> {
    let friends = api.friend_list().await?;
    let pending = api.pending_friend_requests().await?;

    let mut guard = lock(state);
    guard.chat.seed_sessions(&friends);
    guard.friends.set_friends(friends);
    guard.friends.set_pending(pending);
    Ok(())
}

pub async fn send_request(api: &ApiClient, body: &FriendRequestBody) -> Result<()> {
    api.send_friend_request(body).await
}

pub async fn accept(api: &ApiClient, state: &SharedState, friend_id: FriendId) -> Result<()> {
    api.accept_friend(friend_id).await?;
    lock(state).friends.accept(friend_id);
    Ok(())
}

pub async fn reject(api: &ApiClient, state: &SharedState, friend_id: FriendId) -> Result<()> {
    api.reject_friend(friend_id).await?;
    lock(state).friends.reject(friend_id);
    Ok(())
}

pub async fn remove(api: &ApiClient, state: &SharedState, friend_user_id: UserId) -> Result<()> {
    api.delete_friend(friend_user_id).await?;
    lock(state).friends.remove(friend_user_id);
    Ok(())
}
