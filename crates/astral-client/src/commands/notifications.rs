//! Notification actions.

use chrono::Utc;

use astral_shared::types::{NotificationId, NotificationKind};

use crate::api::{ApiClient, NotificationQuery};
use crate::error::Result;
use crate::state::{lock, SharedState};

/// Fetch one page of the feed under the active filter. Page 1 replaces
/// the local collection, later pages append.
pub async fn fetch_page(api: &ApiClient, state: &SharedState, page: u32) -> Result<()> {
    let query = {
        let guard = lock(state);
        let filter = guard.notifications.filter();
        NotificationQuery {
            kind: filter.kind,
            is_read: filter.unread_only.then_some(false),
            page,
            size: guard.notifications.cursor().page_size,
        }
    };

    let items = api.list_notifications(&query).await?;
    lock(state).notifications.apply_page(page, items);
    Ok(())
}

/// Fetch the next page if the cursor says more exist.
pub async fn load_more(api: &ApiClient, state: &SharedState) -> Result<()> {
    let next = {
        let guard = lock(state);
        if !guard.notifications.cursor().has_more {
            return Ok(());
        }
        guard.notifications.cursor().next_page()
    };
    fetch_page(api, state, next).await
}

/// Pull the authoritative unread counters; server wins.
pub async fn refresh_unread(api: &ApiClient, state: &SharedState) -> Result<()> {
    let counts = api.notification_unread_count().await?;
    lock(state).notifications.reconcile_unread(counts);
    Ok(())
}

pub async fn mark_read(api: &ApiClient, state: &SharedState, id: NotificationId) -> Result<()> {
    api.mark_notification_read(id).await?;
    lock(state).notifications.mark_read(id, Utc::now());
    Ok(())
}

/// Batch mark-read, then reconcile the counters with the server.
pub async fn mark_read_batch(
    api: &ApiClient,
    state: &SharedState,
    ids: &[NotificationId],
) -> Result<String> {
    let confirmation = api.mark_notifications_read_batch(ids).await?;
    lock(state).notifications.mark_read_batch(ids, Utc::now());
    refresh_unread(api, state).await?;
    Ok(confirmation)
}

pub async fn mark_all_read(api: &ApiClient, state: &SharedState) -> Result<String> {
    let confirmation = api.mark_all_notifications_read().await?;
    lock(state).notifications.mark_all_read(Utc::now());
    Ok(confirmation)
}

pub async fn delete(api: &ApiClient, state: &SharedState, id: NotificationId) -> Result<()> {
    api.delete_notification(id).await?;
    lock(state).notifications.remove(id);
    Ok(())
}

pub async fn delete_batch(
    api: &ApiClient,
    state: &SharedState,
    ids: &[NotificationId],
) -> Result<String> {
    let confirmation = api.delete_notifications_batch(ids).await?;
    lock(state).notifications.remove_batch(ids);
    Ok(confirmation)
}

/// Switch the list filter and refetch page 1.
pub async fn set_filter(
    api: &ApiClient,
    state: &SharedState,
    kind: Option<NotificationKind>,
    unread_only: bool,
) -> Result<()> {
    lock(state).notifications.set_filter(kind, unread_only);
    fetch_page(api, state, 1).await
}
