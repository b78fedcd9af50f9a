//! Canned recommendations shown when the backend cannot be reached and the
//! user asked for `--demo-on-error`. Always printed under a banner.

use serde_json::{Map, Value, json};

use surge_core::ClientError;
use surge_shared::{Recommendation, RecommendationsResponse};

pub const BANNER: &str = "=== OFFLINE / DEMO DATA - not live recommendations ===";

/// What the recommendations command ends up printing.
#[derive(Debug)]
pub enum Outcome {
    Live(Value),
    Demo { error: ClientError, data: RecommendationsResponse },
}

/// Substitute demo data for a failed call, but only when asked to.
pub fn with_demo_fallback(
    result: Result<Value, ClientError>,
    demo_on_error: bool,
) -> Result<Outcome, ClientError> {
    match result {
        Ok(value) => Ok(Outcome::Live(value)),
        Err(error) if demo_on_error => Ok(Outcome::Demo {
            error,
            data: recommendations(),
        }),
        Err(error) => Err(error),
    }
}

struct Sample {
    ticker: &'static str,
    strategy: &'static str,
    confidence: &'static str,
    stars: u8,
    position_size: f64,
    returns: f64,
    sharpe: f64,
    max_drawdown: f64,
    win_rate: f64,
    stop_loss: f64,
    risk: &'static str,
    reasoning: &'static str,
}

const SAMPLES: [Sample; 3] = [
    Sample {
        ticker: "TQQQ",
        strategy: "MA Crossover (10/50)",
        confidence: "MODERATE",
        stars: 2,
        position_size: 20.0,
        returns: 63.33,
        sharpe: 1.56,
        max_drawdown: -20.75,
        win_rate: 61.22,
        stop_loss: -16.6,
        risk: "Medium Risk",
        reasoning: "Excellent risk-adjusted returns (Sharpe: 1.56) | Moderate risk with 20.8% max drawdown | Good win rate of 61.2%",
    },
    Sample {
        ticker: "QQQ",
        strategy: "RSI Momentum (14)",
        confidence: "HIGH",
        stars: 3,
        position_size: 30.0,
        returns: 31.73,
        sharpe: 1.63,
        max_drawdown: -8.35,
        win_rate: 58.16,
        stop_loss: -6.68,
        risk: "Low Risk",
        reasoning: "Excellent risk-adjusted returns (Sharpe: 1.63) | Very low risk with minimal drawdown (-8.4%)",
    },
    Sample {
        ticker: "SPY",
        strategy: "Triple MA (10/30/100)",
        confidence: "HIGH",
        stars: 3,
        position_size: 30.0,
        returns: 13.4,
        sharpe: 1.79,
        max_drawdown: -2.98,
        win_rate: 64.0,
        stop_loss: -2.38,
        risk: "Low Risk",
        reasoning: "Excellent risk-adjusted returns (Sharpe: 1.79) | Very low risk with minimal drawdown (-3.0%)",
    },
];

/// The fixed demo dataset. Every entry is tagged `"demo": true`.
pub fn recommendations() -> RecommendationsResponse {
    let recommendations = SAMPLES
        .iter()
        .map(|s| {
            let mut extra = Map::new();
            extra.insert("stop_loss_level".to_string(), json!(s.stop_loss));
            extra.insert("risk_category".to_string(), json!(s.risk));
            extra.insert("demo".to_string(), Value::Bool(true));

            Recommendation {
                ticker: s.ticker.to_string(),
                strategy: s.strategy.to_string(),
                action: "HOLD".to_string(),
                confidence_level: Some(s.confidence.to_string()),
                confidence_stars: Some(s.stars),
                position_size_pct: Some(s.position_size),
                total_return_pct: Some(s.returns),
                sharpe_ratio: Some(s.sharpe),
                max_drawdown_pct: Some(s.max_drawdown),
                win_rate_pct: Some(s.win_rate),
                reasoning: Some(s.reasoning.to_string()),
                current_price: None,
                extra,
            }
        })
        .collect();

    RecommendationsResponse { recommendations }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_data_is_labelled() {
        let data = recommendations();

        assert_eq!(data.recommendations.len(), 3);
        assert!(data.recommendations.iter().all(|r| r.extra["demo"] == Value::Bool(true)));
        assert!(BANNER.contains("OFFLINE / DEMO DATA"));
    }

    #[test]
    fn test_failure_without_flag_is_an_error() {
        let result = with_demo_fallback(Err(ClientError::Unauthenticated), false);
        assert!(matches!(result, Err(ClientError::Unauthenticated)));
    }

    #[test]
    fn test_failure_with_flag_keeps_the_real_error() {
        let failed = Err(ClientError::RequestFailed {
            status: 503,
            body: "unavailable".to_string(),
        });

        match with_demo_fallback(failed, true).unwrap() {
            Outcome::Demo { error, data } => {
                assert_eq!(error.status(), Some(503));
                assert_eq!(data.recommendations[0].ticker, "TQQQ");
            }
            Outcome::Live(_) => panic!("expected demo data"),
        }
    }

    #[test]
    fn test_success_is_passed_through() {
        let live = json!({"recommendations": []});
        assert!(matches!(
            with_demo_fallback(Ok(live), true).unwrap(),
            Outcome::Live(_)
        ));
    }
}
