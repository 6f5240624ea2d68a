//! Client-side real-time synchronization layer for the astral platform.
//!
//! Keeps several locally cached, ordered views of server state —
//! notifications, private-message threads, comment forests, friend and
//! session lists — consistent under three concurrent sources of mutation:
//! paginated REST fetches, optimistic local writes, and push events
//! arriving over one persistent connection in arbitrary order relative to
//! REST responses.

pub mod api;
pub mod commands;
pub mod config;
pub mod effects;
pub mod error;
pub mod router;
pub mod state;
pub mod sync;

pub use api::ApiClient;
pub use config::ClientConfig;
pub use effects::UiEvent;
pub use error::{ClientError, Result};
pub use state::{ClientState, SharedState};
pub use sync::SyncClient;

use tracing_subscriber::{fmt, EnvFilter};

/// Initialise tracing for binaries and examples embedding the client.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("astral_client=debug,astral_net=debug,astral_store=info,warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
