use thiserror::Error;

use astral_net::SessionError;
use astral_shared::DomainError;

/// Errors surfaced to callers of client actions.
#[derive(Error, Debug)]
pub enum ClientError {
    /// An action that needs the current user ran while logged out.
    #[error("not authenticated")]
    AuthRequired,

    /// HTTP-level failure (connect, timeout, decode).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Business rejection from the server (`code != 200`).
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Successful envelope without the payload the endpoint promises.
    #[error("response missing data field")]
    MissingData,

    /// A message send was rejected because one is already in flight.
    #[error("another message send is in flight")]
    SendInFlight,

    /// A chat action ran without a focused session.
    #[error("no active chat session")]
    NoActiveSession,

    /// Session-layer failure bubbling out of connect().
    #[error("session error: {0}")]
    Session(#[from] SessionError),
}

pub type Result<T> = std::result::Result<T, ClientError>;
