//! Named backend endpoints. Each method is only a path, a verb and a payload.

use serde_json::Value;
use surge_shared::{RecommendationsRequest, RecommendationsResponse, TradeRequest, TradeResult};

use crate::domain::ApiRequest;
use crate::error::ClientError;
use crate::services::ApiClient;

pub const RECOMMENDATIONS_PATH: &str = "/api/recommendations";
pub const PORTFOLIO_PATH: &str = "/api/portfolio";
pub const TRADES_PATH: &str = "/api/portfolio/trades";
pub const TRADE_PATH: &str = "/api/portfolio/trade";
pub const STRATEGIES_PATH: &str = "/api/strategies";
pub const BACKTEST_PATH: &str = "/api/backtest";

/// Surge trading endpoints on top of [`ApiClient`].
#[derive(Clone)]
pub struct TradingApi {
    client: ApiClient,
}

impl TradingApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Ranked strategy recommendations for a ticker set and date range.
    pub async fn recommendations(&self, request: &RecommendationsRequest) -> Result<Value, ClientError> {
        self.client.post(RECOMMENDATIONS_PATH, request).await
    }

    /// Like [`recommendations`](Self::recommendations), decoded.
    pub async fn recommendations_typed(
        &self,
        request: &RecommendationsRequest,
    ) -> Result<RecommendationsResponse, ClientError> {
        let body = serde_json::to_value(request).map_err(|e| ClientError::InvalidRequest(e.to_string()))?;
        self.client
            .call_as(ApiRequest::post(RECOMMENDATIONS_PATH, body))
            .await
    }

    /// Current positions, cash and total value.
    pub async fn portfolio(&self) -> Result<Value, ClientError> {
        self.client.get(PORTFOLIO_PATH).await
    }

    /// Recent trade history, newest first.
    pub async fn trades(&self, limit: Option<u32>) -> Result<Value, ClientError> {
        let path = match limit {
            Some(limit) => format!("{TRADES_PATH}?limit={limit}"),
            None => TRADES_PATH.to_string(),
        };
        self.client.get(&path).await
    }

    /// Record a manual trade execution.
    pub async fn execute_trade(&self, trade: &TradeRequest) -> Result<TradeResult, ClientError> {
        let body = serde_json::to_value(trade).map_err(|e| ClientError::InvalidRequest(e.to_string()))?;
        self.client.call_as(ApiRequest::post(TRADE_PATH, body)).await
    }

    pub async fn strategies(&self) -> Result<Value, ClientError> {
        self.client.get(STRATEGIES_PATH).await
    }

    pub async fn backtest(&self, strategy_id: &str) -> Result<Value, ClientError> {
        let path = format!("{BACKTEST_PATH}/{}", urlencoding::encode(strategy_id));
        self.client.get(&path).await
    }
}
