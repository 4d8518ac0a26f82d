use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthorized,
    Forbidden,
    NotFound,
    Validation,
    RateLimited,
    Internal,
}

impl ErrorCode {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => ErrorCode::Unauthorized,
            403 => ErrorCode::Forbidden,
            404 => ErrorCode::NotFound,
            400 | 409 | 422 => ErrorCode::Validation,
            429 => ErrorCode::RateLimited,
            _ => ErrorCode::Internal,
        }
    }
}

/// Error body returned by the tracker backend. Every field is optional because
/// the backend only guarantees `message` on handled failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }

    /// Lenient parse: an empty or non-JSON body yields no message.
    pub fn from_body(body: &[u8]) -> Self {
        serde_json::from_slice::<ApiError>(body).unwrap_or_default()
    }
}

#[derive(Debug, Error)]
#[error("{code:?}: {}", message.as_deref().unwrap_or("no message"))]
pub struct ApiException {
    pub code: ErrorCode,
    pub message: Option<String>,
}

impl ApiException {
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let message = ApiError::from_body(body)
            .message
            .filter(|message| !message.trim().is_empty());
        Self {
            code: ErrorCode::from_status(status),
            message,
        }
    }
}

impl From<ApiException> for ApiError {
    fn from(value: ApiException) -> Self {
        Self {
            message: value.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_common_statuses_to_codes() {
        assert_eq!(ErrorCode::from_status(401), ErrorCode::Unauthorized);
        assert_eq!(ErrorCode::from_status(403), ErrorCode::Forbidden);
        assert_eq!(ErrorCode::from_status(404), ErrorCode::NotFound);
        assert_eq!(ErrorCode::from_status(422), ErrorCode::Validation);
        assert_eq!(ErrorCode::from_status(503), ErrorCode::Internal);
    }

    #[test]
    fn extracts_server_message_and_ignores_garbage_bodies() {
        let err = ApiException::from_response(400, br#"{"message":"Nomination not found"}"#);
        assert_eq!(err.message.as_deref(), Some("Nomination not found"));

        let err = ApiException::from_response(500, b"<html>gateway</html>");
        assert_eq!(err.code, ErrorCode::Internal);
        assert!(err.message.is_none());

        let err = ApiException::from_response(400, br#"{"message":"  "}"#);
        assert!(err.message.is_none());
    }
}
