use thiserror::Error;

/// A business-level rejection from the REST API (`code != 200`).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("server error {code}: {message}")]
pub struct DomainError {
    pub code: i32,
    pub message: String,
}
