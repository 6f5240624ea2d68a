//! Notification endpoints.

use serde::Serialize;

use astral_shared::model::{Notification, UnreadCount};
use astral_shared::types::{NotificationId, NotificationKind};

use crate::api::ApiClient;
use crate::error::Result;

/// List query: optional type and read-state filters plus the page window.
#[derive(Debug, Clone, Default)]
pub struct NotificationQuery {
    pub kind: Option<NotificationKind>,
    pub is_read: Option<bool>,
    pub page: u32,
    pub size: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NotificationIdsBody<'a> {
    notification_ids: &'a [NotificationId],
}

impl ApiClient {
    pub async fn list_notifications(&self, query: &NotificationQuery) -> Result<Vec<Notification>> {
        let mut params: Vec<(&str, String)> = vec![
            ("page", query.page.to_string()),
            ("size", query.size.to_string()),
        ];
        if let Some(kind) = query.kind {
            params.push(("type", kind.0.to_string()));
        }
        if let Some(is_read) = query.is_read {
            params.push(("isRead", (is_read as u8).to_string()));
        }
        self.execute(self.get("/notification/list").query(&params))
            .await
    }

    pub async fn notification_unread_count(&self) -> Result<UnreadCount> {
        self.execute(self.get("/notification/unread/count")).await
    }

    pub async fn mark_notification_read(&self, id: NotificationId) -> Result<()> {
        self.execute_unit(self.put(&format!("/notification/read/{id}")))
            .await
    }

    /// Returns the server's confirmation message.
    pub async fn mark_notifications_read_batch(&self, ids: &[NotificationId]) -> Result<String> {
        self.execute(
            self.put("/notification/read/batch")
                .json(&NotificationIdsBody {
                    notification_ids: ids,
                }),
        )
        .await
    }

    pub async fn mark_all_notifications_read(&self) -> Result<String> {
        self.execute(self.put("/notification/read/all")).await
    }

    pub async fn delete_notification(&self, id: NotificationId) -> Result<()> {
        self.execute_unit(self.delete(&format!("/notification/delete/{id}")))
            .await
    }

    pub async fn delete_notifications_batch(&self, ids: &[NotificationId]) -> Result<String> {
        self.execute(
            self.delete("/notification/batch")
                .json(&NotificationIdsBody {
                    notification_ids: ids,
                }),
        )
        .await
    }
}
