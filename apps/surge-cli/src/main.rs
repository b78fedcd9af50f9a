//! # Surge CLI
//!
//! Signs in against the configured identity provider and calls the Surge
//! trading API with the resulting bearer token.

use clap::Parser;

mod app;
mod cli;
mod commands;
mod config;
mod demo;
mod telemetry;

use app::App;
use cli::Cli;
use config::AppConfig;
use telemetry::TelemetryConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    telemetry::init_telemetry(&TelemetryConfig::from_env(), cli.verbose);

    let config = AppConfig::from_env();
    let app = App::build(&config).await?;

    commands::run(&app, cli.command).await
}
