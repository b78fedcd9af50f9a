//! Command execution. Results are printed to stdout as pretty JSON.

use anyhow::{Context, Result};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, BufReader};

use surge_core::domain::Session;
use surge_shared::{RecommendationsRequest, TradeRequest};

use crate::app::App;
use crate::cli::{Command, LoginArgs};
use crate::demo::{self, Outcome};

pub async fn run(app: &App, command: Command) -> Result<()> {
    app.session.initialize().await;

    match command {
        Command::Status => print_json(&status_json(&app.session.session(), app)),
        Command::Login(args) => login(app, args).await,
        Command::Signup {
            username,
            password,
            name,
        } => {
            app.session.sign_up(&username, &password, &name).await?;
            print_json(&json!({ "signed_up": username, "confirmation_required": true }))
        }
        Command::Logout => {
            app.session.sign_out().await?;
            print_json(&status_json(&app.session.session(), app))
        }
        Command::Token => {
            let token = app.session.get_token().await.context("not signed in")?;
            println!("{token}");
            Ok(())
        }
        Command::Recommendations {
            tickers,
            date,
            start_date,
            initial_capital,
            demo_on_error,
        } => {
            let date = date.unwrap_or_else(|| chrono::Local::now().date_naive());
            let mut request = RecommendationsRequest::new(tickers, date);
            if let Some(start) = start_date {
                request = request.with_start_date(start);
            }
            if let Some(capital) = initial_capital {
                request = request.with_initial_capital(capital);
            }

            let result = app.api.recommendations(&request).await;
            match demo::with_demo_fallback(result, demo_on_error)? {
                Outcome::Live(value) => print_json(&value),
                Outcome::Demo { error, data } => {
                    tracing::error!(error = %error, "Recommendations request failed");
                    eprintln!("Error: {error}");
                    eprintln!("{}", demo::BANNER);
                    print_json(&data)
                }
            }
        }
        Command::Portfolio => print_json(&app.api.portfolio().await?),
        Command::Trades { limit } => print_json(&app.api.trades(limit).await?),
        Command::Trade {
            ticker,
            action,
            shares,
            price,
            strategy,
        } => {
            let mut trade = TradeRequest::new(&ticker, action.into(), shares, price);
            if let Some(strategy) = strategy {
                trade = trade.with_strategy(strategy);
            }
            print_json(&app.api.execute_trade(&trade).await?)
        }
        Command::Strategies => print_json(&app.api.strategies().await?),
        Command::Backtest { strategy_id } => print_json(&app.api.backtest(&strategy_id).await?),
    }
}

async fn login(app: &App, args: LoginArgs) -> Result<()> {
    if let Some(provider) = args.provider {
        app.session.sign_in_with_provider(&provider).await?;

        eprintln!("Paste the URL the browser was redirected to:");
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let callback = lines
            .next_line()
            .await
            .context("failed to read callback URL")?
            .context("no callback URL given")?;

        let session = app.session.complete_redirect(callback.trim()).await?;
        return print_json(&status_json(&session, app));
    }

    let username = args.username.context("--username or --provider is required")?;
    let password = args
        .password
        .context("password required: pass --password or set SURGE_PASSWORD")?;
    let session = app.session.sign_in_with_credentials(&username, &password).await?;
    print_json(&status_json(&session, app))
}

/// Session summary. Never includes the credential itself.
fn status_json(session: &Session, app: &App) -> Value {
    json!({
        "status": session.status,
        "user": session.identity,
        "expires_at": session.credential.as_ref().map(|c| c.expires_at),
        "identity_configured": app.session.is_configured(),
        "api": app.api.client().base_url(),
        "last_error": session.last_error,
    })
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
