// Session layer: one persistent WebSocket connection per logged-in user.

pub mod error;
pub mod liveness;
pub mod session;
pub mod transport;

pub use error::SessionError;
pub use liveness::LivenessClock;
pub use session::{
    backoff_delay, SessionCommand, SessionConfig, SessionEvent, SessionManager, SessionState,
};
pub use transport::WsStream;
