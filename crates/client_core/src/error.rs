use shared::error::{ApiException, ErrorCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("server responded with status {status}: {}", message.as_deref().unwrap_or("no message"))]
    Status {
        status: u16,
        code: ErrorCode,
        message: Option<String>,
    },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl RemoteError {
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let ApiException { code, message } = ApiException::from_response(status, body);
        RemoteError::Status {
            status,
            code,
            message,
        }
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    /// Missing or rejected credentials. The session is logged out when this is
    /// produced by a server response.
    #[error("authentication required: {0}")]
    Auth(String),
    /// Rejected locally before any request was issued.
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("session storage failed: {0:#}")]
    Session(anyhow::Error),
}

impl From<reqwest::Error> for ClientError {
    fn from(value: reqwest::Error) -> Self {
        ClientError::Remote(RemoteError::Transport(value))
    }
}

impl ClientError {
    pub fn validation(message: impl Into<String>) -> Self {
        ClientError::Validation(message.into())
    }

    pub fn requires_reauth(&self) -> bool {
        matches!(self, ClientError::Auth(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ClientError::Validation(_))
    }

    /// The message the backend attached to a failed response, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClientError::Remote(RemoteError::Status { message, .. }) => message.as_deref(),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Remote(RemoteError::Status { status, .. }) => Some(*status),
            _ => None,
        }
    }
}
