//! Services - behaviour built on top of the ports.

mod gateway;
mod session;
pub mod trading;

pub use gateway::ApiClient;
pub use session::SessionManager;
pub use trading::TradingApi;
