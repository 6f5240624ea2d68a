//! Chat reconciler: session list plus the message window of the focused
//! session.
//!
//! Merges three streams — paginated history fetches, server-confirmed
//! sends, and pushed messages — into one ascending-by-time view. The
//! reconciler is the serialization point: every merge is idempotent under
//! at-least-once push delivery, stale history pages are discarded via a
//! monotonically increasing epoch, and a recalled message can never
//! resurface with its original content.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::debug;

use astral_shared::constants::RECALLED_PLACEHOLDER;
use astral_shared::model::{ChatSession, Friend, PrivateMessage};
use astral_shared::types::{FriendStatus, MessageId, MessageStatus, UserId};

use crate::pager::PageCursor;

/// Result of merging a history page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryApplied {
    Applied {
        /// Unread counterpart messages landed; the caller should mark the
        /// session read.
        needs_mark_read: bool,
    },
    /// The page belonged to a superseded session focus and was discarded.
    Stale,
}

/// Result of ingesting a pushed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushReceipt {
    /// False for duplicate delivery: nothing changed, emit nothing.
    pub applied: bool,
    /// The message landed in the focused session's visible window.
    pub active_session: bool,
    /// Counterpart-authored message in the focused session; caller
    /// should mark the session read.
    pub needs_mark_read: bool,
    /// The session the message belongs to.
    pub session_user: UserId,
}

#[derive(Debug, Default)]
pub struct ChatState {
    sessions: Vec<ChatSession>,
    /// Focused counterpart, if a chat window is open.
    active: Option<UserId>,
    /// Messages of the focused session, ascending by create time.
    messages: Vec<PrivateMessage>,
    cursor: PageCursor,
    /// Bumped by every focus switch; history pages carry the epoch they
    /// were requested under and stale ones are discarded.
    epoch: u64,
    /// Guard serializing sends: an overlapping send is rejected.
    is_sending: bool,
    /// Push ids already merged once (at-least-once delivery tolerance).
    seen_push_ids: HashSet<MessageId>,
    /// Ids recalled locally or observed recalled; merges must never let
    /// original content back in for these.
    recalled: HashSet<MessageId>,
}

impl ChatState {
    pub fn new(page_size: u32) -> Self {
        Self {
            cursor: PageCursor::new(page_size),
            ..Default::default()
        }
    }

    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    pub fn active(&self) -> Option<UserId> {
        self.active
    }

    pub fn messages(&self) -> &[PrivateMessage] {
        &self.messages
    }

    /// Messages for display: locally deleted ones are hidden, recalled
    /// ones stay visible with redacted content.
    pub fn visible_messages(&self) -> impl Iterator<Item = &PrivateMessage> {
        self.messages
            .iter()
            .filter(|m| m.status != MessageStatus::Deleted)
    }

    pub fn cursor(&self) -> &PageCursor {
        &self.cursor
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_sending(&self) -> bool {
        self.is_sending
    }

    /// Sum of per-session unread counters.
    pub fn total_unread(&self) -> u64 {
        self.sessions.iter().map(|s| s.unread_count).sum()
    }

    pub fn session(&self, friend: UserId) -> Option<&ChatSession> {
        self.sessions.iter().find(|s| s.friend_user_id == friend)
    }

    // ------------------------------------------------------------------
    // Session list
    // ------------------------------------------------------------------

    /// Rebuild the session list from the friend directory (accepted
    /// friends only). Recency order is then maintained by pushes.
    pub fn seed_sessions(&mut self, friends: &[Friend]) {
        self.sessions = friends
            .iter()
            .filter(|f| f.status == FriendStatus::Accepted)
            .map(|f| ChatSession {
                friend_id: Some(f.friend_id),
                friend_user_id: f.friend_user_id,
                friend_name: f
                    .friend_nickname
                    .clone()
                    .unwrap_or_else(|| f.friend_user_id.to_string()),
                friend_avatar: f.friend_avatar.clone(),
                last_message: None,
                last_message_time: f.last_chat_time,
                unread_count: f.unread_count,
                is_online: f.is_online,
            })
            .collect();
    }

    /// Presence update from the liveness topic.
    pub fn set_online(&mut self, friend: UserId, online: bool) {
        if let Some(session) = self.sessions.iter_mut().find(|s| s.friend_user_id == friend) {
            session.is_online = online;
        }
    }

    // ------------------------------------------------------------------
    // Focus & history
    // ------------------------------------------------------------------

    /// Focus a session: clears the message window, resets the cursor and
    /// returns the new epoch that guards the page-1 fetch.
    pub fn set_active(&mut self, friend: UserId) -> u64 {
        self.active = Some(friend);
        self.messages.clear();
        self.cursor.reset();
        self.epoch += 1;
        self.epoch
    }

    /// Drop the focus (chat window closed).
    pub fn clear_active(&mut self) {
        self.active = None;
        self.messages.clear();
        self.cursor.reset();
        self.epoch += 1;
    }

    /// Merge a history page fetched under `epoch`. The server returns
    /// newest-first pages; each page is reversed so the visible list stays
    /// ascending. Page 1 replaces, later pages prepend older messages.
    pub fn apply_history(
        &mut self,
        epoch: u64,
        page: u32,
        newest_first: Vec<PrivateMessage>,
    ) -> HistoryApplied {
        if epoch != self.epoch {
            debug!(
                stale = epoch,
                current = self.epoch,
                "Discarding history page for superseded session"
            );
            return HistoryApplied::Stale;
        }

        let returned = newest_first.len();
        let mut ascending: Vec<PrivateMessage> = newest_first
            .into_iter()
            .rev()
            .map(|m| self.redact_if_recalled(m))
            .collect();

        for message in &ascending {
            // Remembering fetched ids keeps a later push re-delivery of
            // the same message from double-applying.
            self.seen_push_ids.insert(message.message_id);
            if message.status == MessageStatus::Recalled {
                self.recalled.insert(message.message_id);
            }
        }

        if page <= 1 {
            self.messages = ascending;
        } else {
            let known: HashSet<MessageId> =
                self.messages.iter().map(|m| m.message_id).collect();
            ascending.retain(|m| !known.contains(&m.message_id));
            // Older pages go on top of the window.
            ascending.append(&mut self.messages);
            self.messages = ascending;
        }
        self.cursor.record(page.max(1), returned);

        let needs_mark_read = self
            .active
            .map(|friend| {
                self.messages
                    .iter()
                    .any(|m| m.sender_id == friend && !m.is_read)
            })
            .unwrap_or(false);
        HistoryApplied::Applied { needs_mark_read }
    }

    // ------------------------------------------------------------------
    // Sending
    // ------------------------------------------------------------------

    /// Claim the send guard. Returns false when a send is already in
    /// flight; the overlapping send must be rejected, not queued.
    pub fn try_begin_send(&mut self) -> bool {
        if self.is_sending {
            return false;
        }
        self.is_sending = true;
        true
    }

    pub fn finish_send(&mut self) {
        self.is_sending = false;
    }

    /// Append a server-confirmed outbound message and refresh the owning
    /// session's last-message column.
    pub fn append_sent(&mut self, message: PrivateMessage) {
        let receiver = message.receiver_id;
        let preview = message.preview().to_string();
        let time = message.create_time;

        self.seen_push_ids.insert(message.message_id);
        let message = self.redact_if_recalled(message);
        if self.active == Some(receiver) {
            insert_ordered(&mut self.messages, message);
        }

        if let Some(session) = self
            .sessions
            .iter_mut()
            .find(|s| s.friend_user_id == receiver)
        {
            session.last_message = Some(preview);
            session.last_message_time = Some(time);
        }
    }

    // ------------------------------------------------------------------
    // Recall
    // ------------------------------------------------------------------

    /// Mark a message recalled: status 2, content replaced by the fixed
    /// placeholder. The id is remembered so no later merge can restore
    /// the original content.
    pub fn apply_recall(&mut self, id: MessageId) -> bool {
        self.recalled.insert(id);
        let Some(message) = self.messages.iter_mut().find(|m| m.message_id == id) else {
            return false;
        };
        message.status = MessageStatus::Recalled;
        message.content = RECALLED_PLACEHOLDER.to_string();
        true
    }

    fn redact_if_recalled(&self, mut message: PrivateMessage) -> PrivateMessage {
        if self.recalled.contains(&message.message_id)
            || message.status == MessageStatus::Recalled
        {
            message.status = MessageStatus::Recalled;
            message.content = RECALLED_PLACEHOLDER.to_string();
        }
        message
    }

    // ------------------------------------------------------------------
    // Push ingestion
    // ------------------------------------------------------------------

    /// Merge a pushed message. Duplicate delivery (same id) changes
    /// nothing. The owning session is lazily created, moved to the front
    /// of the list, and its unread counter bumped only when the message
    /// is counterpart-authored and not for the focused session.
    pub fn ingest_push(&mut self, message: PrivateMessage, local_user: UserId) -> PushReceipt {
        let session_user = message.counterpart(local_user);

        if !self.seen_push_ids.insert(message.message_id) {
            debug!(id = %message.message_id, "Skipping duplicate message push");
            return PushReceipt {
                applied: false,
                active_session: self.active == Some(session_user),
                needs_mark_read: false,
                session_user,
            };
        }

        let message = self.redact_if_recalled(message);
        if message.status == MessageStatus::Recalled {
            self.recalled.insert(message.message_id);
        }

        let active_session = self.active == Some(session_user);
        let counterpart_authored = message.sender_id != local_user;
        let needs_mark_read = active_session && counterpart_authored;

        if active_session {
            insert_ordered(&mut self.messages, message.clone());
        }

        self.touch_session(&message, session_user, counterpart_authored && !active_session);

        PushReceipt {
            applied: true,
            active_session,
            needs_mark_read,
            session_user,
        }
    }

    /// Update or lazily create the owning session and move it to the
    /// front of the list.
    fn touch_session(&mut self, message: &PrivateMessage, session_user: UserId, bump_unread: bool) {
        let preview = message.preview().to_string();

        match self
            .sessions
            .iter()
            .position(|s| s.friend_user_id == session_user)
        {
            Some(index) => {
                let mut session = self.sessions.remove(index);
                session.last_message = Some(preview);
                session.last_message_time = Some(message.create_time);
                if bump_unread {
                    session.unread_count += 1;
                }
                self.sessions.insert(0, session);
            }
            None => {
                self.sessions.insert(
                    0,
                    ChatSession {
                        friend_id: None,
                        friend_user_id: session_user,
                        friend_name: message
                            .sender_name
                            .clone()
                            .unwrap_or_else(|| session_user.to_string()),
                        friend_avatar: message.sender_avatar.clone(),
                        last_message: Some(preview),
                        last_message_time: Some(message.create_time),
                        unread_count: if bump_unread { 1 } else { 0 },
                        is_online: false,
                    },
                );
            }
        }
    }

    // ------------------------------------------------------------------
    // Read state
    // ------------------------------------------------------------------

    /// Flip every unread counterpart message of `friend` to read and zero
    /// the session's unread counter.
    pub fn mark_session_read(&mut self, friend: UserId, now: DateTime<Utc>) {
        for message in self
            .messages
            .iter_mut()
            .filter(|m| m.sender_id == friend && !m.is_read)
        {
            message.is_read = true;
            message.read_time = Some(now);
        }
        if let Some(session) = self.sessions.iter_mut().find(|s| s.friend_user_id == friend) {
            session.unread_count = 0;
        }
    }
}

/// Insert keeping ascending create-time order; equal timestamps keep
/// arrival order (stable insertion after existing ties).
fn insert_ordered(messages: &mut Vec<PrivateMessage>, message: PrivateMessage) {
    let index = messages.partition_point(|m| m.create_time <= message.create_time);
    messages.insert(index, message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use astral_shared::types::MessageKind;
    use chrono::TimeZone;

    const ME: UserId = UserId(1);
    const ALICE: UserId = UserId(2);
    const BOB: UserId = UserId(3);

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn message(id: i64, from: UserId, to: UserId, secs: i64) -> PrivateMessage {
        PrivateMessage {
            message_id: MessageId(id),
            sender_id: from,
            receiver_id: to,
            sender_name: None,
            sender_avatar: None,
            content: format!("message {id}"),
            kind: MessageKind::Text,
            attachment_url: None,
            is_read: false,
            status: MessageStatus::Normal,
            create_time: at(secs),
            read_time: None,
        }
    }

    #[test]
    fn test_history_page_reversed_to_ascending() {
        let mut chat = ChatState::new(20);
        let epoch = chat.set_active(ALICE);

        // Server pages are newest-first.
        let page = vec![
            message(3, ALICE, ME, 30),
            message(2, ME, ALICE, 20),
            message(1, ALICE, ME, 10),
        ];
        let applied = chat.apply_history(epoch, 1, page);
        assert_eq!(applied, HistoryApplied::Applied { needs_mark_read: true });

        let ids: Vec<i64> = chat.messages().iter().map(|m| m.message_id.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_load_more_prepends_older_page() {
        let mut chat = ChatState::new(2);
        let epoch = chat.set_active(ALICE);

        chat.apply_history(epoch, 1, vec![message(4, ALICE, ME, 40), message(3, ME, ALICE, 30)]);
        chat.apply_history(epoch, 2, vec![message(2, ALICE, ME, 20), message(1, ME, ALICE, 10)]);

        let ids: Vec<i64> = chat.messages().iter().map(|m| m.message_id.0).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(chat.cursor().page, 2);
    }

    #[test]
    fn test_stale_history_page_is_discarded() {
        let mut chat = ChatState::new(20);
        let alice_epoch = chat.set_active(ALICE);
        let bob_epoch = chat.set_active(BOB);

        // Alice's page-1 fetch resolves after the focus moved to Bob.
        let applied = chat.apply_history(alice_epoch, 1, vec![message(1, ALICE, ME, 10)]);
        assert_eq!(applied, HistoryApplied::Stale);
        assert!(chat.messages().is_empty());

        let applied = chat.apply_history(bob_epoch, 1, vec![message(9, BOB, ME, 90)]);
        assert!(matches!(applied, HistoryApplied::Applied { .. }));
        assert_eq!(chat.messages()[0].message_id, MessageId(9));
    }

    #[test]
    fn test_push_into_active_session_appends_in_order() {
        let mut chat = ChatState::new(20);
        let epoch = chat.set_active(ALICE);
        chat.apply_history(epoch, 1, vec![message(2, ALICE, ME, 20)]);

        let receipt = chat.ingest_push(message(3, ALICE, ME, 30), ME);
        assert!(receipt.applied);
        assert!(receipt.active_session);
        assert!(receipt.needs_mark_read);

        // Late-arriving older push still lands in timestamp order.
        chat.ingest_push(message(1, ALICE, ME, 10), ME);
        let ids: Vec<i64> = chat.messages().iter().map(|m| m.message_id.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_equal_timestamps_keep_arrival_order() {
        let mut chat = ChatState::new(20);
        chat.set_active(ALICE);
        chat.ingest_push(message(1, ALICE, ME, 10), ME);
        chat.ingest_push(message(2, ALICE, ME, 10), ME);
        let ids: Vec<i64> = chat.messages().iter().map(|m| m.message_id.0).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_duplicate_push_is_ignored_entirely() {
        let mut chat = ChatState::new(20);
        chat.set_active(ALICE);

        let receipt = chat.ingest_push(message(7, BOB, ME, 10), ME);
        assert!(receipt.applied);
        assert_eq!(chat.session(BOB).unwrap().unread_count, 1);

        let receipt = chat.ingest_push(message(7, BOB, ME, 10), ME);
        assert!(!receipt.applied);
        assert_eq!(chat.session(BOB).unwrap().unread_count, 1);
        assert_eq!(chat.sessions().len(), 1);
    }

    #[test]
    fn test_push_redelivery_of_fetched_message_is_ignored() {
        let mut chat = ChatState::new(20);
        let epoch = chat.set_active(ALICE);
        chat.apply_history(epoch, 1, vec![message(5, ALICE, ME, 10)]);

        let receipt = chat.ingest_push(message(5, ALICE, ME, 10), ME);
        assert!(!receipt.applied);
        assert_eq!(chat.messages().len(), 1);
        assert!(chat.sessions().is_empty());
    }

    #[test]
    fn test_background_push_moves_session_front_and_bumps_unread() {
        let mut chat = ChatState::new(20);
        chat.set_active(ALICE);
        chat.ingest_push(message(1, ALICE, ME, 10), ME);
        chat.ingest_push(message(2, BOB, ME, 20), ME);

        assert_eq!(chat.sessions()[0].friend_user_id, BOB);
        assert_eq!(chat.sessions()[0].unread_count, 1);
        // Focused session never accumulates unread.
        assert_eq!(chat.session(ALICE).unwrap().unread_count, 0);
    }

    #[test]
    fn test_own_echo_push_never_bumps_unread() {
        let mut chat = ChatState::new(20);
        // A message the local user sent from another device.
        let receipt = chat.ingest_push(message(5, ME, BOB, 10), ME);
        assert!(receipt.applied);
        assert_eq!(receipt.session_user, BOB);
        assert!(!receipt.needs_mark_read);
        assert_eq!(chat.session(BOB).unwrap().unread_count, 0);
    }

    #[test]
    fn test_recall_is_final_under_redelivery() {
        let mut chat = ChatState::new(20);
        let epoch = chat.set_active(ALICE);
        chat.apply_history(epoch, 1, vec![message(5, ME, ALICE, 10)]);

        assert!(chat.apply_recall(MessageId(5)));
        assert_eq!(chat.messages()[0].status, MessageStatus::Recalled);
        assert_eq!(chat.messages()[0].content, RECALLED_PLACEHOLDER);

        // The same message re-delivered with original content: duplicate
        // suppression alone would cover the push path, but even a fresh
        // history page must stay redacted.
        let epoch = chat.set_active(ALICE);
        chat.apply_history(epoch, 1, vec![message(5, ME, ALICE, 10)]);
        assert_eq!(chat.messages()[0].status, MessageStatus::Recalled);
        assert_eq!(chat.messages()[0].content, RECALLED_PLACEHOLDER);
    }

    #[test]
    fn test_send_guard_rejects_overlap() {
        let mut chat = ChatState::new(20);
        assert!(chat.try_begin_send());
        assert!(!chat.try_begin_send());
        chat.finish_send();
        assert!(chat.try_begin_send());
    }

    #[test]
    fn test_append_sent_updates_session_preview() {
        let mut chat = ChatState::new(20);
        chat.seed_sessions(&[Friend {
            friend_id: astral_shared::types::FriendId(1),
            friend_user_id: ALICE,
            friend_nickname: Some("alice".into()),
            friend_avatar: None,
            status: FriendStatus::Accepted,
            is_online: true,
            unread_count: 0,
            last_chat_time: None,
        }]);
        chat.set_active(ALICE);

        chat.append_sent(message(11, ME, ALICE, 50));
        assert_eq!(chat.messages().len(), 1);
        let session = chat.session(ALICE).unwrap();
        assert_eq!(session.last_message.as_deref(), Some("message 11"));
        assert_eq!(session.last_message_time, Some(at(50)));
    }

    #[test]
    fn test_mark_session_read_flips_messages_and_counter() {
        let mut chat = ChatState::new(20);
        chat.set_active(ALICE);
        chat.ingest_push(message(1, ALICE, ME, 10), ME);
        chat.clear_active();
        chat.ingest_push(message(2, ALICE, ME, 20), ME);
        assert_eq!(chat.session(ALICE).unwrap().unread_count, 1);

        let epoch = chat.set_active(ALICE);
        chat.apply_history(epoch, 1, vec![message(2, ALICE, ME, 20), message(1, ALICE, ME, 10)]);
        chat.mark_session_read(ALICE, at(100));

        assert!(chat.messages().iter().all(|m| m.is_read));
        assert_eq!(chat.session(ALICE).unwrap().unread_count, 0);
        assert_eq!(chat.total_unread(), 0);
    }

    #[test]
    fn test_seed_sessions_keeps_accepted_only() {
        let mut chat = ChatState::new(20);
        let accepted = Friend {
            friend_id: astral_shared::types::FriendId(1),
            friend_user_id: ALICE,
            friend_nickname: None,
            friend_avatar: None,
            status: FriendStatus::Accepted,
            is_online: false,
            unread_count: 2,
            last_chat_time: Some(at(5)),
        };
        let pending = Friend {
            friend_id: astral_shared::types::FriendId(2),
            friend_user_id: BOB,
            status: FriendStatus::Pending,
            friend_nickname: None,
            friend_avatar: None,
            is_online: false,
            unread_count: 0,
            last_chat_time: None,
        };
        chat.seed_sessions(&[accepted, pending]);

        assert_eq!(chat.sessions().len(), 1);
        assert_eq!(chat.sessions()[0].friend_user_id, ALICE);
        assert_eq!(chat.total_unread(), 2);
    }

    #[test]
    fn test_deleted_messages_hidden_recalled_redacted() {
        let mut chat = ChatState::new(20);
        let epoch = chat.set_active(ALICE);
        let mut deleted = message(1, ALICE, ME, 10);
        deleted.status = MessageStatus::Deleted;
        chat.apply_history(epoch, 1, vec![message(2, ALICE, ME, 20), deleted]);
        chat.apply_recall(MessageId(2));

        let visible: Vec<&PrivateMessage> = chat.visible_messages().collect();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].content, RECALLED_PLACEHOLDER);
    }
}
