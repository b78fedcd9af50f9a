//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod identity;
mod token_store;
mod transport;

pub use identity::{IdentityError, IdentityProvider};
pub use token_store::{TokenSet, TokenStore, TokenStoreError};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, TransportError};
