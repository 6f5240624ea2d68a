//! The REST response envelope shared by every server endpoint.

use serde::Deserialize;

use crate::error::DomainError;

/// Envelope `{code, data, message}`; `code == 200` signals success and any
/// other value is a domain error carrying `message`.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage<T> {
    pub code: i32,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

pub const CODE_OK: i32 = 200;

impl<T> ResponseMessage<T> {
    pub fn is_ok(&self) -> bool {
        self.code == CODE_OK
    }

    /// Success check for endpoints whose payload is irrelevant.
    pub fn ok(self) -> Result<(), DomainError> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(self.domain_error())
        }
    }

    /// Success with whatever payload the server attached.
    pub fn into_data(self) -> Result<Option<T>, DomainError> {
        if self.is_ok() {
            Ok(self.data)
        } else {
            Err(self.domain_error())
        }
    }

    fn domain_error(self) -> DomainError {
        DomainError {
            code: self.code,
            message: self.message.unwrap_or_else(|| "request failed".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_envelope() {
        let envelope: ResponseMessage<i64> =
            serde_json::from_str(r#"{"code": 200, "data": 7}"#).unwrap();
        assert_eq!(envelope.into_data().unwrap(), Some(7));
    }

    #[test]
    fn test_error_envelope_carries_message() {
        let envelope: ResponseMessage<i64> =
            serde_json::from_str(r#"{"code": 403, "message": "not allowed"}"#).unwrap();
        let err = envelope.into_data().unwrap_err();
        assert_eq!(err.code, 403);
        assert_eq!(err.message, "not allowed");
    }

    #[test]
    fn test_void_payload() {
        let envelope: ResponseMessage<serde_json::Value> =
            serde_json::from_str(r#"{"code": 200, "data": null, "message": "done"}"#).unwrap();
        assert!(envelope.ok().is_ok());
    }
}
