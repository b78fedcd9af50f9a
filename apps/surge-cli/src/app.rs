//! Wiring: pick adapters from configuration and build the services.

use std::sync::Arc;

use anyhow::Context;

use surge_core::domain::ApiEnvironment;
use surge_core::ports::{IdentityProvider, TokenStore};
use surge_core::{ApiClient, SessionManager, TradingApi};
use surge_infra::{FileTokenStore, ReqwestTransport};

#[cfg(feature = "cognito")]
use surge_infra::CognitoIdentityProvider;
#[cfg(feature = "local-identity")]
use surge_infra::LocalIdentityProvider;

use crate::config::{AppConfig, IdentityMode};

/// Everything a command needs.
pub struct App {
    pub session: Arc<SessionManager>,
    pub api: TradingApi,
}

impl App {
    pub async fn build(config: &AppConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(&config.token_file));
        let provider = identity_provider(config, store).await?;
        let session = Arc::new(SessionManager::new(provider));

        let transport =
            Arc::new(ReqwestTransport::new(&config.transport).context("failed to build HTTP client")?);
        let environment = ApiEnvironment::from_hostname(&config.origin_host);
        let client = ApiClient::for_environment(environment, session.clone(), transport);

        tracing::debug!(
            origin_host = %config.origin_host,
            api = %client.base_url(),
            identity = ?config.identity_mode,
            token_file = %config.token_file.display(),
            "Client configured"
        );

        Ok(Self {
            session,
            api: TradingApi::new(client),
        })
    }
}

async fn identity_provider(
    config: &AppConfig,
    store: Arc<dyn TokenStore>,
) -> anyhow::Result<Arc<dyn IdentityProvider>> {
    match config.identity_mode {
        #[cfg(feature = "cognito")]
        IdentityMode::Cognito => {
            let provider = CognitoIdentityProvider::new(config.identity.clone(), store, &config.transport)
                .context("failed to build Cognito client")?
                .with_launcher(announce_url);
            Ok(Arc::new(provider))
        }
        #[cfg(feature = "local-identity")]
        IdentityMode::Local => {
            let provider = LocalIdentityProvider::new(config.local_identity.clone(), store)
                .with_launcher(announce_url);
            if let Some(user) = &config.local_user {
                if let Err(e) = provider.add_user(&user.email, &user.name, &user.password).await {
                    tracing::warn!(email = %user.email, error = %e, "Could not seed local user");
                }
            }
            Ok(Arc::new(provider))
        }
        #[allow(unreachable_patterns)]
        mode => anyhow::bail!("identity mode {mode:?} is not enabled in this build"),
    }
}

/// The URL goes to stdout so it can be piped to a browser opener.
fn announce_url(url: &str) {
    eprintln!("Open this URL in a browser to continue signing in:");
    println!("{url}");
}
