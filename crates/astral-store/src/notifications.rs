//! Notification feed reconciler.
//!
//! Owns the ordered notification list (most-recent-first) and the derived
//! unread counters. Three input streams mutate it — paginated fetches,
//! pushed events, and user read/delete actions — and after every single
//! mutation the counter invariant must hold:
//! `unread.total == count(is_read == false) == sum(unread.by_type)`.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::debug;

use astral_shared::model::{Notification, UnreadCount};
use astral_shared::types::{NotificationId, NotificationKind};

use crate::pager::PageCursor;
use crate::Ingest;

/// Active list filter. A filtered collection is a subset of the
/// authoritative set, so counters are then reconciled from the server
/// rather than recounted locally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedFilter {
    pub kind: Option<NotificationKind>,
    pub unread_only: bool,
}

impl FeedFilter {
    fn is_none(&self) -> bool {
        self.kind.is_none() && !self.unread_only
    }
}

#[derive(Debug, Default)]
pub struct NotificationFeed {
    items: Vec<Notification>,
    unread: UnreadCount,
    cursor: PageCursor,
    filter: FeedFilter,
}

impl NotificationFeed {
    pub fn new(page_size: u32) -> Self {
        Self {
            cursor: PageCursor::new(page_size),
            ..Default::default()
        }
    }

    pub fn items(&self) -> &[Notification] {
        &self.items
    }

    pub fn unread(&self) -> &UnreadCount {
        &self.unread
    }

    pub fn cursor(&self) -> &PageCursor {
        &self.cursor
    }

    pub fn filter(&self) -> FeedFilter {
        self.filter
    }

    pub fn get(&self, id: NotificationId) -> Option<&Notification> {
        self.items.iter().find(|n| n.notification_id == id)
    }

    /// Merge a fetched page. Page 1 replaces the collection, later pages
    /// append; duplicate ids are skipped defensively either way.
    pub fn apply_page(&mut self, page: u32, fetched: Vec<Notification>) {
        let returned = fetched.len();

        if page <= 1 {
            // Read state only advances: ids read locally stay read even
            // when the fetched copy lags behind.
            let read_ids: HashSet<NotificationId> = self
                .items
                .iter()
                .filter(|n| n.is_read)
                .map(|n| n.notification_id)
                .collect();

            let mut seen = HashSet::with_capacity(returned);
            self.items = fetched
                .into_iter()
                .filter(|n| seen.insert(n.notification_id))
                .map(|mut n| {
                    if read_ids.contains(&n.notification_id) {
                        n.is_read = true;
                    }
                    n
                })
                .collect();
        } else {
            let known: HashSet<NotificationId> =
                self.items.iter().map(|n| n.notification_id).collect();
            self.items
                .extend(fetched.into_iter().filter(|n| !known.contains(&n.notification_id)));
        }

        self.cursor.record(page.max(1), returned);

        // With a filter active the collection is a subset; the counters are
        // reconciled from the server's unread-count endpoint instead.
        if self.filter.is_none() {
            self.unread = UnreadCount::recount(self.items.iter());
        }
    }

    /// Ingest a pushed notification: prepend and bump counters when
    /// unread. Duplicate delivery applies nothing.
    pub fn ingest_push(&mut self, notification: Notification) -> Ingest {
        if self.get(notification.notification_id).is_some() {
            debug!(id = %notification.notification_id, "Skipping duplicate notification push");
            return Ingest::Duplicate;
        }

        if !notification.is_read {
            self.unread.increment(notification.kind);
        }
        self.items.insert(0, notification);
        Ingest::Applied
    }

    /// Mark one notification read. Idempotent; returns whether anything
    /// changed.
    pub fn mark_read(&mut self, id: NotificationId, now: DateTime<Utc>) -> bool {
        let Some(item) = self
            .items
            .iter_mut()
            .find(|n| n.notification_id == id && !n.is_read)
        else {
            return false;
        };
        item.is_read = true;
        item.read_time = Some(now);
        let kind = item.kind;
        self.unread.decrement(kind);
        true
    }

    /// Mark a batch read; returns how many actually changed.
    pub fn mark_read_batch(&mut self, ids: &[NotificationId], now: DateTime<Utc>) -> usize {
        ids.iter().filter(|id| self.mark_read(**id, now)).count()
    }

    /// Mark everything read and zero the counters.
    pub fn mark_all_read(&mut self, now: DateTime<Utc>) {
        for item in self.items.iter_mut().filter(|n| !n.is_read) {
            item.is_read = true;
            item.read_time = Some(now);
        }
        self.unread.clear();
    }

    /// Remove one notification. Removing an unread item decrements the
    /// counters, exactly as marking it read first would have.
    pub fn remove(&mut self, id: NotificationId) -> bool {
        let Some(index) = self.items.iter().position(|n| n.notification_id == id) else {
            return false;
        };
        let removed = self.items.remove(index);
        if !removed.is_read {
            self.unread.decrement(removed.kind);
        }
        true
    }

    pub fn remove_batch(&mut self, ids: &[NotificationId]) -> usize {
        ids.iter().filter(|id| self.remove(**id)).count()
    }

    /// Adopt the server's authoritative counters; server wins on mismatch.
    pub fn reconcile_unread(&mut self, server: UnreadCount) {
        if server != self.unread {
            debug!(
                local = self.unread.total,
                server = server.total,
                "Unread counter reconciled from server"
            );
        }
        self.unread = server;
    }

    /// Switch the list filter; clears the collection and resets the
    /// cursor so the caller refetches page 1.
    pub fn set_filter(&mut self, kind: Option<NotificationKind>, unread_only: bool) {
        self.filter = FeedFilter { kind, unread_only };
        self.items.clear();
        self.cursor.reset();
    }

    /// Invariant check used by tests after every mutation.
    pub fn counters_consistent(&self) -> bool {
        let unread_items = self.items.iter().filter(|n| !n.is_read).count() as u64;
        self.unread.is_consistent() && self.unread.total == unread_items
    }
}
