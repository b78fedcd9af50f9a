//! Error contract surfaced to views.

use thiserror::Error;

use crate::ports::{IdentityError, TransportError};

/// Every failure a caller of the session manager or the API client can see.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Identity provider not configured: {0}")]
    ConfigurationMissing(String),

    #[error("Not signed in")]
    Unauthenticated,

    #[error("API request failed: {status} {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("{message}")]
    Provider {
        code: Option<String>,
        message: String,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    /// HTTP status for `RequestFailed`, `None` otherwise.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether a user-triggered retry could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::RequestFailed { status, .. } => *status >= 500 || *status == 429,
            ClientError::Transport(_) => true,
            _ => false,
        }
    }
}

impl From<IdentityError> for ClientError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::NotConfigured => ClientError::ConfigurationMissing(
                "identity features are disabled until the provider is configured".to_string(),
            ),
            IdentityError::NoSession => ClientError::Unauthenticated,
            IdentityError::Rejected { code, message } => ClientError::Provider {
                code: Some(code),
                message,
            },
            other => ClientError::Provider {
                code: None,
                message: other.to_string(),
            },
        }
    }
}

impl From<TransportError> for ClientError {
    fn from(err: TransportError) -> Self {
        ClientError::Transport(err.to_string())
    }
}
