//! Friend endpoints.

use serde::Serialize;

use astral_shared::model::Friend;
use astral_shared::types::{FriendId, UserId};

use crate::api::ApiClient;
use crate::error::Result;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestBody {
    pub friend_user_id: UserId,
    pub source: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_message: Option<String>,
}

impl ApiClient {
    pub async fn friend_list(&self) -> Result<Vec<Friend>> {
        self.execute(self.get("/friend/list")).await
    }

    pub async fn pending_friend_requests(&self) -> Result<Vec<Friend>> {
        self.execute(self.get("/friend/pending")).await
    }

    pub async fn send_friend_request(&self, body: &FriendRequestBody) -> Result<()> {
        self.execute_unit(self.post("/friend/request").json(body))
            .await
    }

    pub async fn accept_friend(&self, friend_id: FriendId) -> Result<()> {
        self.execute_unit(self.put(&format!("/friend/accept/{friend_id}")))
            .await
    }

    pub async fn reject_friend(&self, friend_id: FriendId) -> Result<()> {
        self.execute_unit(self.put(&format!("/friend/reject/{friend_id}")))
            .await
    }

    pub async fn delete_friend(&self, friend_user_id: UserId) -> Result<()> {
        self.execute_unit(self.delete(&format!("/friend/delete/{friend_user_id}")))
            .await
    }
}
