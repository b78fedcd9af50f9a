//! Request payloads sent to the backend.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Body of `POST /api/recommendations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationsRequest {
    pub tickers: Vec<String>,
    /// Evaluation date (end of the backtest window).
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_capital: Option<f64>,
}

impl RecommendationsRequest {
    pub fn new(tickers: Vec<String>, date: NaiveDate) -> Self {
        Self {
            tickers: tickers.into_iter().map(|t| t.to_uppercase()).collect(),
            date,
            start_date: None,
            initial_capital: None,
        }
    }

    pub fn with_start_date(mut self, start_date: NaiveDate) -> Self {
        self.start_date = Some(start_date);
        self
    }

    pub fn with_initial_capital(mut self, capital: f64) -> Self {
        self.initial_capital = Some(capital);
        self
    }
}

/// Side of a manual trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "BUY"),
            TradeAction::Sell => write!(f, "SELL"),
        }
    }
}

/// Body of `POST /api/portfolio/trade`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRequest {
    pub ticker: String,
    pub action: TradeAction,
    pub shares: f64,
    pub price: f64,
    pub strategy: String,
}

impl TradeRequest {
    /// Build a manual trade; tickers are always sent upper-cased.
    pub fn new(ticker: &str, action: TradeAction, shares: f64, price: f64) -> Self {
        Self {
            ticker: ticker.trim().to_uppercase(),
            action,
            shares,
            price,
            strategy: "Manual".to_string(),
        }
    }

    pub fn with_strategy(mut self, strategy: impl Into<String>) -> Self {
        let strategy = strategy.into();
        if !strategy.trim().is_empty() {
            self.strategy = strategy;
        }
        self
    }
}
