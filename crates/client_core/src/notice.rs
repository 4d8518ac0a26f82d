//! One human-readable line per operation outcome.

use std::fmt;

use crate::error::{ClientError, RemoteError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    /// Prefers the backend's own message; `fallback` names the failed
    /// operation when the server said nothing useful.
    pub fn from_error(err: &ClientError, fallback: &str) -> Self {
        let message = match err {
            ClientError::Remote(RemoteError::Status { message, .. }) => message
                .clone()
                .unwrap_or_else(|| fallback.to_string()),
            ClientError::Remote(other) => format!("{fallback}: {other}"),
            ClientError::Validation(message) => message.clone(),
            ClientError::Auth(_) | ClientError::Session(_) => err.to_string(),
        };
        Self {
            level: NoticeLevel::Error,
            message,
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_when_server_gave_no_message() {
        let err = ClientError::from(RemoteError::from_response(500, b""));
        let notice = Notice::from_error(&err, "Failed to assign user");
        assert!(notice.is_error());
        assert_eq!(notice.message, "Failed to assign user");
    }

    #[test]
    fn prefers_server_message() {
        let err = ClientError::from(RemoteError::from_response(
            400,
            br#"{"message":"User not found"}"#,
        ));
        assert_eq!(
            Notice::from_error(&err, "Failed to assign user").message,
            "User not found"
        );
    }

    #[test]
    fn validation_message_is_shown_as_is() {
        let err = ClientError::validation("Select nominations");
        assert_eq!(
            Notice::from_error(&err, "Failed to update").message,
            "Select nominations"
        );
    }
}
