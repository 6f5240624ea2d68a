//! Private-message endpoints.

use serde::Serialize;

use astral_shared::model::PrivateMessage;
use astral_shared::types::{MessageId, MessageKind, UserId};

use crate::api::ApiClient;
use crate::error::Result;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub receiver_id: UserId,
    pub content: String,
    pub message_type: MessageKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_url: Option<String>,
}

impl ApiClient {
    /// History page for one counterpart, newest first.
    pub async fn message_history(
        &self,
        friend: UserId,
        page: u32,
        size: u32,
    ) -> Result<Vec<PrivateMessage>> {
        self.execute(
            self.get(&format!("/message/history/{friend}"))
                .query(&[("page", page.to_string()), ("size", size.to_string())]),
        )
        .await
    }

    /// The server assigns the id and timestamp; the confirmed message
    /// comes back in the payload.
    pub async fn send_message(&self, request: &SendMessageRequest) -> Result<PrivateMessage> {
        self.execute(self.post("/message/send").json(request)).await
    }

    pub async fn recall_message(&self, id: MessageId) -> Result<()> {
        self.execute_unit(self.put(&format!("/message/recall/{id}")))
            .await
    }

    pub async fn mark_messages_read(&self, friend: UserId) -> Result<()> {
        self.execute_unit(self.put(&format!("/message/read/{friend}")))
            .await
    }

    pub async fn message_unread_count(&self) -> Result<u64> {
        self.execute(self.get("/message/unread/count")).await
    }
}
