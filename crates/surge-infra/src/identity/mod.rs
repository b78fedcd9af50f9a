//! Identity provider implementations.

#[cfg(any(feature = "cognito", feature = "local-identity"))]
mod claims;
#[cfg(feature = "cognito")]
mod cognito;
#[cfg(feature = "local-identity")]
mod local;

#[cfg(any(feature = "cognito", feature = "local-identity"))]
pub use claims::session_from_id_token;
#[cfg(feature = "cognito")]
pub use cognito::CognitoIdentityProvider;
#[cfg(feature = "local-identity")]
pub use local::{LocalIdentityConfig, LocalIdentityProvider};

/// Receives the URL the user has to visit to continue a redirect sign-in.
pub type RedirectLauncher = Box<dyn Fn(&str) + Send + Sync>;
