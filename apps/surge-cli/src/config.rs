//! Application configuration loaded from environment variables.

use std::path::PathBuf;
use std::str::FromStr;

use surge_infra::{IdentityConfig, TransportConfig};

#[cfg(feature = "local-identity")]
use surge_infra::LocalIdentityConfig;

/// Which identity provider backs the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityMode {
    Cognito,
    /// Self-issued tokens, for offline development against a local backend.
    Local,
}

impl FromStr for IdentityMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cognito" => Ok(IdentityMode::Cognito),
            "local" => Ok(IdentityMode::Local),
            other => Err(format!("unknown identity mode '{other}'")),
        }
    }
}

/// A password user seeded into the local provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedUser {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl SeedUser {
    /// Parse `email:password[:name]`.
    fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.splitn(3, ':');
        let email = parts.next()?.trim().to_string();
        let password = parts.next()?.to_string();
        if email.is_empty() || password.is_empty() {
            return None;
        }
        let name = parts
            .next()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| email.clone());

        Some(Self { email, password, name })
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Hostname the client pretends to be served from.
    pub origin_host: String,
    pub identity_mode: IdentityMode,
    pub token_file: PathBuf,
    pub identity: IdentityConfig,
    #[cfg(feature = "local-identity")]
    pub local_identity: LocalIdentityConfig,
    pub local_user: Option<SeedUser>,
    pub transport: TransportConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let identity_mode = match lookup("SURGE_IDENTITY").map(|v| v.parse::<IdentityMode>()) {
            Some(Ok(mode)) => mode,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "Falling back to Cognito identity");
                IdentityMode::Cognito
            }
            None => IdentityMode::Cognito,
        };

        let token_file = lookup("SURGE_TOKEN_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                lookup("HOME")
                    .map(PathBuf::from)
                    .unwrap_or_default()
                    .join(".surge")
                    .join("session.json")
            });

        Self {
            origin_host: lookup("SURGE_ORIGIN_HOST")
                .map(|h| h.trim().to_string())
                .filter(|h| !h.is_empty())
                .unwrap_or_else(|| "localhost".to_string()),
            identity_mode,
            token_file,
            identity: IdentityConfig::from_lookup(&lookup),
            #[cfg(feature = "local-identity")]
            local_identity: LocalIdentityConfig::from_lookup(&lookup),
            local_user: lookup("SURGE_LOCAL_USER").and_then(|raw| SeedUser::parse(&raw)),
            transport: TransportConfig::from_lookup(&lookup),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use surge_core::domain::ApiEnvironment;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[("HOME", "/home/ada")]));

        assert_eq!(config.origin_host, "localhost");
        assert_eq!(
            ApiEnvironment::from_hostname(&config.origin_host),
            ApiEnvironment::Local
        );
        assert_eq!(config.identity_mode, IdentityMode::Cognito);
        assert_eq!(config.token_file, PathBuf::from("/home/ada/.surge/session.json"));
        assert!(!config.identity.is_configured());
        assert_eq!(config.local_user, None);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("SURGE_ORIGIN_HOST", "pluggedtogit.github.io"),
            ("SURGE_IDENTITY", "Local"),
            ("SURGE_TOKEN_FILE", "/tmp/surge.json"),
            ("SURGE_LOCAL_USER", "ada@example.com:pa:ss:Ada"),
            ("REQUEST_TIMEOUT_SECS", "0"),
        ]));

        assert_eq!(
            ApiEnvironment::from_hostname(&config.origin_host),
            ApiEnvironment::Remote
        );
        assert_eq!(config.identity_mode, IdentityMode::Local);
        assert_eq!(config.token_file, PathBuf::from("/tmp/surge.json"));
        assert_eq!(config.transport.timeout, None);

        // Only the first two colons split, so passwords may not contain one.
        let seed = config.local_user.unwrap();
        assert_eq!(seed.email, "ada@example.com");
        assert_eq!(seed.password, "pa");
        assert_eq!(seed.name, "ss:Ada");
    }

    #[test]
    fn test_unknown_identity_mode_falls_back() {
        let config = AppConfig::from_lookup(lookup(&[("SURGE_IDENTITY", "ldap")]));
        assert_eq!(config.identity_mode, IdentityMode::Cognito);
    }

    #[test]
    fn test_seed_user_needs_email_and_password() {
        assert_eq!(SeedUser::parse("ada@example.com"), None);
        assert_eq!(SeedUser::parse(":secret"), None);
        assert_eq!(
            SeedUser::parse("ada@example.com:longenough").map(|u| u.name),
            Some("ada@example.com".to_string())
        );
    }
}
