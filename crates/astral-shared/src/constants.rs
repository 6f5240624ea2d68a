use std::time::Duration;

/// Default page size for paginated list endpoints.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Outbound keep-alive interval; the server heartbeats at the same rate.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(4);

/// Silence window after which the transport is considered dead.
pub const HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(10);

/// Base reconnect delay; doubles per attempt up to the cap.
pub const RECONNECT_BASE_DELAY: Duration = Duration::from_secs(5);

/// Upper bound for the reconnect backoff schedule.
pub const RECONNECT_MAX_DELAY: Duration = Duration::from_secs(60);

/// Fixed REST request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Shared liveness topic every connected client subscribes to.
pub const LIVENESS_TOPIC: &str = "/topic/connected";

/// Replacement content for recalled private messages.
pub const RECALLED_PLACEHOLDER: &str = "[message recalled]";

/// Default endpoints for a local development server.
pub const DEFAULT_REST_BASE_URL: &str = "http://localhost:8081";
pub const DEFAULT_WS_ENDPOINT: &str = "ws://localhost:8081/ws-notifications";
