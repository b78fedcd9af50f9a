//! # Surge Core
//!
//! Session state and authenticated API access for the Surge front end.
//! This crate only talks to the outside world through the traits in
//! [`ports`]; concrete adapters live in `surge-infra`.

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use error::ClientError;
pub use services::{ApiClient, SessionManager, TradingApi};

#[cfg(test)]
mod test_support;
