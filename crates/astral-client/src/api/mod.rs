//! Typed REST client.
//!
//! All endpoints share the `{code, data, message}` envelope; the two
//! `execute` helpers are the single place that turns it into a typed
//! `Result`, so no caller ever inspects `code` by hand.

pub mod chat;
pub mod comments;
pub mod friends;
pub mod notifications;

use std::sync::Arc;

use reqwest::header::AUTHORIZATION;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;

use astral_shared::{IdentityProvider, ResponseMessage, UserId};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

pub use chat::SendMessageRequest;
pub use comments::{CommentPage, CreateCommentRequest, PublishGalaxyCommentRequest};
pub use friends::FriendRequestBody;
pub use notifications::NotificationQuery;

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    identity: Arc<dyn IdentityProvider>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, identity: Arc<dyn IdentityProvider>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            identity,
        })
    }

    pub fn current_user(&self) -> Option<UserId> {
        self.identity.identity().map(|identity| identity.user_id)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn get(&self, path: &str) -> RequestBuilder {
        self.http.get(self.url(path))
    }

    pub(crate) fn post(&self, path: &str) -> RequestBuilder {
        self.http.post(self.url(path))
    }

    pub(crate) fn put(&self, path: &str) -> RequestBuilder {
        self.http.put(self.url(path))
    }

    pub(crate) fn delete(&self, path: &str) -> RequestBuilder {
        self.http.delete(self.url(path))
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.identity.identity() {
            Some(identity) => builder.header(AUTHORIZATION, identity.token),
            None => builder,
        }
    }

    /// Run a request whose envelope must carry a payload.
    pub(crate) async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let envelope: ResponseMessage<T> = self.authed(builder).send().await?.json().await?;
        envelope.into_data()?.ok_or(ClientError::MissingData)
    }

    /// Run a request where only the success code matters.
    pub(crate) async fn execute_unit(&self, builder: RequestBuilder) -> Result<()> {
        let envelope: ResponseMessage<serde_json::Value> =
            self.authed(builder).send().await?.json().await?;
        envelope.ok()?;
        Ok(())
    }
}
