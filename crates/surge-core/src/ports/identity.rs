//! Identity provider port.

use async_trait::async_trait;

use crate::domain::AuthSession;

/// A managed identity service. Only [`crate::SessionManager`] talks to it.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// False when configuration is missing or still holds placeholders.
    fn is_configured(&self) -> bool;

    /// Recover the provider's current session, if any. Does not refresh.
    async fn current_session(&self) -> Result<Option<AuthSession>, IdentityError>;

    /// Exchange the stored refresh credential for a fresh session.
    async fn refresh_session(&self) -> Result<AuthSession, IdentityError>;

    /// Start a redirect-based sign-in with an external provider (e.g. `Google`).
    ///
    /// Completion is only observable after the redirect returns.
    async fn sign_in_with_redirect(&self, provider: &str) -> Result<(), IdentityError>;

    /// Consume the URL the redirect flow returned to.
    async fn handle_redirect(&self, callback_url: &str) -> Result<(), IdentityError>;

    async fn sign_in(&self, username: &str, password: &str) -> Result<(), IdentityError>;

    async fn sign_up(&self, username: &str, password: &str, name: &str)
    -> Result<(), IdentityError>;

    /// Invalidate the provider session and forget local credentials.
    async fn sign_out(&self) -> Result<(), IdentityError>;
}

/// Identity provider errors.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Identity provider not configured")]
    NotConfigured,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("No active session")]
    NoSession,

    #[error("{message}")]
    Rejected { code: String, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected provider response: {0}")]
    Protocol(String),

    #[error("Token storage failed: {0}")]
    Storage(String),
}

impl From<crate::ports::TokenStoreError> for IdentityError {
    fn from(err: crate::ports::TokenStoreError) -> Self {
        IdentityError::Storage(err.to_string())
    }
}
