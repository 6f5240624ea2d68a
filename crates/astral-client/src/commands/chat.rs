//! Chat actions.

use chrono::Utc;
use tracing::debug;

use astral_shared::model::PrivateMessage;
use astral_shared::types::{MessageId, MessageKind, UserId};
use astral_store::HistoryApplied;

use crate::api::{ApiClient, SendMessageRequest};
use crate::error::{ClientError, Result};
use crate::state::{lock, SharedState};

/// Focus a session: resets the cursor, loads page 1 of the history and
/// marks unread counterpart messages read. A page that resolves after a
/// newer focus switch is discarded by the epoch guard.
pub async fn open_session(api: &ApiClient, state: &SharedState, friend: UserId) -> Result<()> {
    let (epoch, size) = {
        let mut guard = lock(state);
        let epoch = guard.chat.set_active(friend);
        (epoch, guard.chat.cursor().page_size)
    };
    fetch_history(api, state, friend, epoch, 1, size).await
}

/// Load the next (older) history page of the focused session.
pub async fn load_older(api: &ApiClient, state: &SharedState) -> Result<()> {
    let params = {
        let guard = lock(state);
        let cursor = *guard.chat.cursor();
        guard
            .chat
            .active()
            .filter(|_| cursor.has_more)
            .map(|friend| (friend, guard.chat.epoch(), cursor.next_page(), cursor.page_size))
    };
    let Some((friend, epoch, page, size)) = params else {
        return Ok(());
    };
    fetch_history(api, state, friend, epoch, page, size).await
}

async fn fetch_history(
    api: &ApiClient,
    state: &SharedState,
    friend: UserId,
    epoch: u64,
    page: u32,
    size: u32,
) -> Result<()> {
    let newest_first = api.message_history(friend, page, size).await?;
    let applied = lock(state).chat.apply_history(epoch, page, newest_first);
    match applied {
        HistoryApplied::Applied { needs_mark_read } => {
            if needs_mark_read {
                mark_session_read(api, state, friend).await?;
            }
        }
        HistoryApplied::Stale => {
            debug!(friend = %friend, page, "History page superseded; dropped");
        }
    }
    Ok(())
}

/// Send a message to the focused session. Sends are serialized: an
/// overlapping call is rejected with [`ClientError::SendInFlight`]. The
/// server assigns id and timestamp; the confirmed message is appended.
pub async fn send_message(
    api: &ApiClient,
    state: &SharedState,
    content: String,
    kind: MessageKind,
    attachment_url: Option<String>,
) -> Result<PrivateMessage> {
    let receiver = {
        let mut guard = lock(state);
        let Some(friend) = guard.chat.active() else {
            return Err(ClientError::NoActiveSession);
        };
        if !guard.chat.try_begin_send() {
            return Err(ClientError::SendInFlight);
        }
        friend
    };

    let request = SendMessageRequest {
        receiver_id: receiver,
        content: content.trim().to_string(),
        message_type: kind,
        attachment_url,
    };
    let outcome = api.send_message(&request).await;

    let mut guard = lock(state);
    guard.chat.finish_send();
    match outcome {
        Ok(message) => {
            guard.chat.append_sent(message.clone());
            Ok(message)
        }
        Err(err) => Err(err),
    }
}

/// Recall a sent message. On success the local copy is redacted for good.
pub async fn recall_message(api: &ApiClient, state: &SharedState, id: MessageId) -> Result<()> {
    api.recall_message(id).await?;
    lock(state).chat.apply_recall(id);
    Ok(())
}

/// Mark everything from `friend` read, server first, then locally.
pub async fn mark_session_read(api: &ApiClient, state: &SharedState, friend: UserId) -> Result<()> {
    api.mark_messages_read(friend).await?;
    lock(state).chat.mark_session_read(friend, Utc::now());
    Ok(())
}

/// Build the session list from the friend list.
pub async fn load_sessions(api: &ApiClient, state: &SharedState) -> Result<()> {
    let friends = api.friend_list().await?;
    let mut guard = lock(state);
    guard.chat.seed_sessions(&friends);
    guard.friends.set_friends(friends);
    Ok(())
}

/// Close the chat window.
pub fn close_session(state: &SharedState) {
    lock(state).chat.clear_active();
}

/// Authoritative total of unread private messages across sessions.
pub async fn unread_total(api: &ApiClient) -> Result<u64> {
    api.message_unread_count().await
}
