//! Domain types shared by the session manager and the API client.

mod environment;
mod request;
mod session;

pub use environment::{ApiEnvironment, LOCAL_API_ORIGIN, REMOTE_API_ORIGIN};
pub use request::{ApiRequest, Method};
pub use session::{AuthSession, Credential, Identity, Session, SessionStatus};
