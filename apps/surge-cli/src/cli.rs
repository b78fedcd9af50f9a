//! Command-line arguments.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

use surge_shared::TradeAction;

#[derive(Parser, Debug)]
#[command(name = "surge")]
#[command(author, version, about = "Surge trading client - sign in and query recommendations", long_about = None)]
pub struct Cli {
    /// Log at debug level (RUST_LOG still wins)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the current session
    Status,

    /// Sign in with a federated provider or a username and password
    Login(LoginArgs),

    /// Create an account
    Signup {
        #[arg(long)]
        username: String,
        #[arg(long, env = "SURGE_PASSWORD", hide_env_values = true)]
        password: String,
        /// Display name
        #[arg(long, default_value = "")]
        name: String,
    },

    /// Sign out and forget stored tokens
    Logout,

    /// Print the current id token
    Token,

    /// Ask the backend for strategy recommendations
    Recommendations {
        /// Ticker symbol (repeatable)
        #[arg(short, long = "ticker", required = true)]
        tickers: Vec<String>,
        /// Evaluation date (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// First day of the backtest window
        #[arg(long)]
        start_date: Option<NaiveDate>,
        #[arg(long)]
        initial_capital: Option<f64>,
        /// Show labelled demo data when the request fails
        #[arg(long)]
        demo_on_error: bool,
    },

    /// Show the portfolio summary
    Portfolio,

    /// List executed trades
    Trades {
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Record a manual trade
    Trade {
        ticker: String,
        #[arg(value_enum)]
        action: Side,
        shares: f64,
        price: f64,
        #[arg(long)]
        strategy: Option<String>,
    },

    /// List available strategies
    Strategies,

    /// Fetch backtest results for a strategy
    Backtest { strategy_id: String },
}

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Federated provider name, e.g. Google
    #[arg(long, conflicts_with = "username", required_unless_present = "username")]
    pub provider: Option<String>,

    #[arg(long)]
    pub username: Option<String>,

    #[arg(long, env = "SURGE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl From<Side> for TradeAction {
    fn from(side: Side) -> Self {
        match side {
            Side::Buy => TradeAction::Buy,
            Side::Sell => TradeAction::Sell,
        }
    }
}
