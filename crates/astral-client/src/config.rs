use std::time::Duration;

use astral_shared::constants::{DEFAULT_PAGE_SIZE, DEFAULT_REST_BASE_URL, REQUEST_TIMEOUT};

/// REST-side configuration. The session layer has its own
/// [`astral_net::SessionConfig`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    pub page_size: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_REST_BASE_URL.to_string(),
            request_timeout: REQUEST_TIMEOUT,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}
