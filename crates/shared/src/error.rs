use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure category reported by the remote document/blob store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayErrorCode {
    WrongPassword,
    UserNotFound,
    NotFound,
    Unavailable,
    Internal,
}

/// Tagged error surfaced by every gateway operation. The code is the only
/// part callers may branch on; the message is for logs, never for users.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{code:?}: {message}")]
pub struct GatewayError {
    pub code: GatewayErrorCode,
    pub message: String,
}

impl GatewayError {
    pub fn new(code: GatewayErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::Unavailable, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::Internal, message)
    }

    /// Whether the failure means the caller presented bad credentials, as
    /// opposed to the sign-in attempt failing for unrelated reasons.
    pub fn is_credential_rejection(&self) -> bool {
        matches!(
            self.code,
            GatewayErrorCode::WrongPassword | GatewayErrorCode::UserNotFound
        )
    }
}
