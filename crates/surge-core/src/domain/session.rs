use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Credentials are treated as expired this long before their real expiry,
/// so a token never runs out while a request is in flight.
const EXPIRY_SKEW_SECS: i64 = 60;

/// Lifecycle of the application session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Uninitialized,
    Checking,
    Authenticated,
    Anonymous,
}

impl SessionStatus {
    /// Whether the startup identity check has finished.
    pub fn is_settled(self) -> bool {
        matches!(self, SessionStatus::Authenticated | SessionStatus::Anonymous)
    }
}

/// Who is signed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable identifier issued by the identity provider (the `sub` claim).
    pub user_id: String,
    pub name: String,
    pub email: Option<String>,
}

/// Opaque, time-limited bearer credential (the provider's id token).
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now + TimeDelta::seconds(EXPIRY_SKEW_SECS) >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// What the identity provider reports for a live session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub identity: Identity,
    pub credential: Credential,
}

/// The application's current authenticated-identity record.
///
/// Owned and written by [`crate::SessionManager`]; everyone else reads
/// snapshots or subscribes to changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub status: SessionStatus,
    pub identity: Option<Identity>,
    pub credential: Option<Credential>,
    pub loading: bool,
    pub last_error: Option<String>,
}

impl Session {
    /// A settled session with nobody signed in.
    pub fn anonymous() -> Self {
        Self {
            status: SessionStatus::Anonymous,
            ..Self::default()
        }
    }

    pub fn authenticated(auth: AuthSession) -> Self {
        Self {
            status: SessionStatus::Authenticated,
            identity: Some(auth.identity),
            credential: Some(auth.credential),
            loading: false,
            last_error: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated
    }
}
