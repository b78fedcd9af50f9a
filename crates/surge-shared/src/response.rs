//! Response payloads returned by the backend.
//!
//! Only the fields the front end actually reads are typed. Everything else
//! is kept in `extra` so that nothing is lost when a value is re-rendered.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Response of `POST /api/recommendations`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecommendationsResponse {
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
}

/// One ranked strategy recommendation for a ticker.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Recommendation {
    pub ticker: String,
    pub strategy: String,
    pub action: String,
    #[serde(default)]
    pub confidence_level: Option<String>,
    #[serde(default)]
    pub confidence_stars: Option<u8>,
    #[serde(default)]
    pub position_size_pct: Option<f64>,
    #[serde(default)]
    pub total_return_pct: Option<f64>,
    #[serde(default)]
    pub sharpe_ratio: Option<f64>,
    #[serde(default)]
    pub max_drawdown_pct: Option<f64>,
    #[serde(default)]
    pub win_rate_pct: Option<f64>,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response of `POST /api/portfolio/trade`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeResult {
    pub success: bool,
    #[serde(default)]
    pub trade_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}
