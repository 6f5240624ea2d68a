use thiserror::Error;

/// Errors produced by the session layer.
#[derive(Error, Debug)]
pub enum SessionError {
    /// `connect()` was called without an authenticated identity.
    #[error("not authenticated")]
    AuthRequired,

    /// The auth token cannot be carried in an HTTP header.
    #[error("auth token is not a valid header value")]
    InvalidToken,

    /// WebSocket-level failure (handshake, read, write).
    #[error("transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    /// The server closed the connection.
    #[error("connection closed by server")]
    Closed,

    /// No inbound traffic within the heartbeat window.
    #[error("heartbeat window elapsed without inbound traffic")]
    HeartbeatTimeout,

    /// Control frame serialization failure.
    #[error("frame encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}
