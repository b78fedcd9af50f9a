//! # Surge Shared
//!
//! Payload types exchanged with the Surge backend API.
//! The backend owns these shapes; unknown fields are tolerated so that
//! additions on the server side never break decoding here.

pub mod dto;
pub mod response;

pub use dto::{RecommendationsRequest, TradeAction, TradeRequest};
pub use response::{Recommendation, RecommendationsResponse, TradeResult};
