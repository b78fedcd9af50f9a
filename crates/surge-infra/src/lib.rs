//! # Surge Infrastructure
//!
//! Concrete implementations of the ports defined in `surge-core`.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All adapters enabled
//! - `minimal` - Transport and token stores only
//! - `cognito` - Amazon Cognito identity provider
//! - `local-identity` - Self-issued identity provider for development and tests

pub mod config;
pub mod http;
pub mod identity;
pub mod store;

pub use config::IdentityConfig;
pub use http::{ReqwestTransport, TransportConfig};
pub use identity::RedirectLauncher;
pub use store::{FileTokenStore, InMemoryTokenStore};

#[cfg(feature = "cognito")]
pub use identity::CognitoIdentityProvider;

#[cfg(feature = "local-identity")]
pub use identity::{LocalIdentityConfig, LocalIdentityProvider};
