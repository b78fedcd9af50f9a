//! Self-issued identity provider for development and offline use.
//!
//! Users live in memory with argon2 password hashes. Tokens are HS256 JWTs
//! carrying the same claims a Cognito id token does, so the rest of the
//! stack cannot tell the two apart. Refresh tokens are signed JWTs too and
//! stay valid across process restarts as long as the secret does.

use std::collections::HashMap;
use std::sync::Arc;

use argon2::Argon2;
use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use surge_core::domain::AuthSession;
use surge_core::ports::{IdentityError, IdentityProvider, TokenSet, TokenStore};

use super::RedirectLauncher;
use super::claims::session_from_id_token;

const DEFAULT_SECRET: &str = "surge-local-identity-secret";
const MIN_PASSWORD_LEN: usize = 8;

/// Local identity provider configuration.
#[derive(Debug, Clone)]
pub struct LocalIdentityConfig {
    pub secret: String,
    pub token_ttl: TimeDelta,
    pub refresh_ttl: TimeDelta,
    pub issuer: String,
    /// Where the simulated hosted UI sends the user back to.
    pub redirect_uri: String,
}

impl Default for LocalIdentityConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_SECRET.to_string(),
            token_ttl: TimeDelta::hours(1),
            refresh_ttl: TimeDelta::days(30),
            issuer: "surge-local".to_string(),
            redirect_uri: "http://localhost:3000/surge-trading-platform/".to_string(),
        }
    }
}

impl LocalIdentityConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let secret = lookup("LOCAL_IDENTITY_SECRET").unwrap_or(defaults.secret);
        if secret == DEFAULT_SECRET {
            tracing::warn!("Using default local identity secret. Set LOCAL_IDENTITY_SECRET to change it.");
        }

        Self {
            secret,
            token_ttl: lookup("LOCAL_IDENTITY_TTL_SECS")
                .and_then(|s| s.parse().ok())
                .map(TimeDelta::seconds)
                .unwrap_or(defaults.token_ttl),
            refresh_ttl: defaults.refresh_ttl,
            issuer: lookup("LOCAL_IDENTITY_ISSUER").unwrap_or(defaults.issuer),
            redirect_uri: lookup("LOCAL_IDENTITY_REDIRECT_URI").unwrap_or(defaults.redirect_uri),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct LocalClaims {
    sub: String,
    email: String,
    name: String,
    token_use: String,
    exp: i64,
    iat: i64,
    iss: String,
}

#[derive(Debug, Clone)]
struct LocalUser {
    user_id: Uuid,
    email: String,
    name: String,
    /// `None` for users created through a federated redirect.
    password_hash: Option<String>,
}

struct PendingRedirect {
    state: String,
    provider: String,
}

/// Identity provider that issues its own tokens.
pub struct LocalIdentityProvider {
    config: LocalIdentityConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    argon2: Argon2<'static>,
    users: RwLock<HashMap<String, LocalUser>>,
    pending: Mutex<Option<PendingRedirect>>,
    store: Arc<dyn TokenStore>,
    launcher: RedirectLauncher,
}

impl LocalIdentityProvider {
    pub fn new(config: LocalIdentityConfig, store: Arc<dyn TokenStore>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            config,
            argon2: Argon2::default(),
            users: RwLock::new(HashMap::new()),
            pending: Mutex::new(None),
            store,
            launcher: Box::new(|url| tracing::info!(url = %url, "Continue sign-in at this URL")),
        }
    }

    pub fn with_launcher(mut self, launcher: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.launcher = Box::new(launcher);
        self
    }

    /// Register a password user up front (CLI seeding, tests).
    pub async fn add_user(&self, email: &str, name: &str, password: &str) -> Result<(), IdentityError> {
        self.sign_up(email, password, name).await
    }

    fn hash_password(&self, password: &str) -> Result<String, IdentityError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| IdentityError::Protocol(format!("password hashing failed: {e}")))
    }

    fn verify_password(&self, password: &str, hash: &str) -> bool {
        PasswordHash::new(hash)
            .map(|parsed| self.argon2.verify_password(password.as_bytes(), &parsed).is_ok())
            .unwrap_or(false)
    }

    fn mint(&self, user: &LocalUser, token_use: &str, ttl: TimeDelta) -> Result<String, IdentityError> {
        let now = Utc::now();
        let claims = LocalClaims {
            sub: user.user_id.to_string(),
            email: user.email.clone(),
            name: user.name.clone(),
            token_use: token_use.to_string(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| IdentityError::Protocol(format!("token signing failed: {e}")))
    }

    async fn issue(&self, user: &LocalUser, refresh_token: Option<String>) -> Result<AuthSession, IdentityError> {
        let refresh_token = match refresh_token {
            Some(token) => token,
            None => self.mint(user, "refresh", self.config.refresh_ttl)?,
        };
        let tokens = TokenSet {
            id_token: self.mint(user, "id", self.config.token_ttl)?,
            access_token: self.mint(user, "access", self.config.token_ttl)?,
            refresh_token: Some(refresh_token),
            expires_at: Utc::now() + self.config.token_ttl,
        };

        let session = session_from_id_token(&tokens.id_token)?;
        self.store.save(&tokens).await?;
        tracing::debug!(user_id = %user.user_id, "Local tokens issued");
        Ok(session)
    }

    fn validate_refresh(&self, token: &str) -> Result<LocalClaims, IdentityError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.issuer]);

        let claims = decode::<LocalClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| IdentityError::Rejected {
                code: "NotAuthorizedException".to_string(),
                message: format!("Invalid refresh token: {e}"),
            })?
            .claims;
        if claims.token_use != "refresh" {
            return Err(IdentityError::Rejected {
                code: "NotAuthorizedException".to_string(),
                message: "Invalid refresh token".to_string(),
            });
        }
        Ok(claims)
    }
}

fn rejected(code: &str, message: &str) -> IdentityError {
    IdentityError::Rejected {
        code: code.to_string(),
        message: message.to_string(),
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    fn is_configured(&self) -> bool {
        true
    }

    async fn current_session(&self) -> Result<Option<AuthSession>, IdentityError> {
        match self.store.load().await? {
            Some(tokens) => session_from_id_token(&tokens.id_token).map(Some),
            None => Ok(None),
        }
    }

    async fn refresh_session(&self) -> Result<AuthSession, IdentityError> {
        let tokens = self.store.load().await?.ok_or(IdentityError::NoSession)?;
        let refresh_token = tokens.refresh_token.ok_or(IdentityError::NoSession)?;
        let claims = self.validate_refresh(&refresh_token)?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|e| IdentityError::Protocol(format!("invalid subject: {e}")))?;
        let user = LocalUser {
            user_id,
            email: claims.email,
            name: claims.name,
            password_hash: None,
        };
        self.issue(&user, Some(refresh_token)).await
    }

    async fn sign_in_with_redirect(&self, provider: &str) -> Result<(), IdentityError> {
        let state = Uuid::new_v4().simple().to_string();
        let code = Uuid::new_v4().simple().to_string();
        let callback = Url::parse_with_params(
            &self.config.redirect_uri,
            [("code", code.as_str()), ("state", state.as_str())],
        )
        .map_err(|e| IdentityError::Protocol(format!("invalid redirect URI: {e}")))?;

        *self.pending.lock().await = Some(PendingRedirect {
            state,
            provider: provider.to_string(),
        });
        (self.launcher)(callback.as_str());
        Ok(())
    }

    async fn handle_redirect(&self, callback_url: &str) -> Result<(), IdentityError> {
        let callback = Url::parse(callback_url)
            .map_err(|e| IdentityError::Protocol(format!("invalid callback URL: {e}")))?;
        let param = |name: &str| {
            callback
                .query_pairs()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned())
        };

        let pending = self
            .pending
            .lock()
            .await
            .take()
            .ok_or_else(|| IdentityError::Protocol("no redirect sign-in in progress".to_string()))?;
        if let Some(error) = param("error") {
            return Err(rejected(&error, &param("error_description").unwrap_or(error.clone())));
        }
        if param("code").is_none() {
            return Err(IdentityError::Protocol("callback has no authorization code".to_string()));
        }
        if param("state").as_deref() != Some(pending.state.as_str()) {
            return Err(IdentityError::Protocol("redirect state mismatch".to_string()));
        }

        let provider = pending.provider.to_lowercase();
        let email = format!("{provider}-user@surge.local");
        let user = {
            let mut users = self.users.write().await;
            users
                .entry(email.clone())
                .or_insert_with(|| LocalUser {
                    user_id: Uuid::new_v4(),
                    email,
                    name: format!("{} User", pending.provider),
                    password_hash: None,
                })
                .clone()
        };

        self.issue(&user, None).await?;
        tracing::info!(provider = %pending.provider, "Local redirect sign-in completed");
        Ok(())
    }

    async fn sign_in(&self, username: &str, password: &str) -> Result<(), IdentityError> {
        let user = self.users.read().await.get(&username.to_lowercase()).cloned();
        let user = user.ok_or(IdentityError::InvalidCredentials)?;
        let hash = user
            .password_hash
            .as_deref()
            .ok_or(IdentityError::InvalidCredentials)?;
        if !self.verify_password(password, hash) {
            return Err(IdentityError::InvalidCredentials);
        }

        self.issue(&user, None).await?;
        Ok(())
    }

    async fn sign_up(&self, username: &str, password: &str, name: &str) -> Result<(), IdentityError> {
        let email = username.trim().to_lowercase();
        if !email.contains('@') {
            return Err(rejected("InvalidParameterException", "Username should be an email."));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(rejected(
                "InvalidPasswordException",
                "Password must be at least 8 characters",
            ));
        }
        if self.users.read().await.contains_key(&email) {
            return Err(rejected("UsernameExistsException", "User already exists"));
        }

        let user = LocalUser {
            user_id: Uuid::new_v4(),
            name: if name.trim().is_empty() { email.clone() } else { name.trim().to_string() },
            email: email.clone(),
            password_hash: Some(self.hash_password(password)?),
        };
        self.users.write().await.insert(email, user);
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        self.store.clear().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use surge_core::SessionManager;
    use surge_core::domain::SessionStatus;

    use super::*;
    use crate::store::InMemoryTokenStore;

    fn provider() -> (LocalIdentityProvider, Arc<InMemoryTokenStore>) {
        let store = Arc::new(InMemoryTokenStore::new());
        (
            LocalIdentityProvider::new(LocalIdentityConfig::default(), store.clone()),
            store,
        )
    }

    #[tokio::test]
    async fn test_sign_up_then_sign_in() {
        let (provider, store) = provider();
        provider
            .sign_up("Grace@Example.com", "hunter2hunter2", "Grace Hopper")
            .await
            .unwrap();

        provider.sign_in("grace@example.com", "hunter2hunter2").await.unwrap();

        let session = provider.current_session().await.unwrap().unwrap();
        assert_eq!(session.identity.name, "Grace Hopper");
        assert_eq!(session.identity.email.as_deref(), Some("grace@example.com"));
        assert!(!session.credential.is_expired());
        assert!(store.load().await.unwrap().unwrap().refresh_token.is_some());
    }

    #[tokio::test]
    async fn test_bad_credentials() {
        let (provider, _) = provider();
        provider.add_user("a@b.io", "A", "longenough").await.unwrap();

        assert!(matches!(
            provider.sign_in("a@b.io", "wrong-password").await,
            Err(IdentityError::InvalidCredentials)
        ));
        assert!(matches!(
            provider.sign_in("nobody@b.io", "longenough").await,
            Err(IdentityError::InvalidCredentials)
        ));
        assert_eq!(provider.current_session().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_sign_up_rules() {
        let (provider, _) = provider();
        provider.add_user("a@b.io", "A", "longenough").await.unwrap();

        let code = |result: Result<(), IdentityError>| match result {
            Err(IdentityError::Rejected { code, .. }) => code,
            other => panic!("unexpected result: {other:?}"),
        };
        assert_eq!(
            code(provider.sign_up("A@B.io", "longenough", "A").await),
            "UsernameExistsException"
        );
        assert_eq!(
            code(provider.sign_up("c@b.io", "short", "C").await),
            "InvalidPasswordException"
        );
        assert_eq!(
            code(provider.sign_up("not-an-email", "longenough", "D").await),
            "InvalidParameterException"
        );
    }

    #[tokio::test]
    async fn test_redirect_round_trip() {
        let launched = Arc::new(StdMutex::new(Vec::new()));
        let sink = launched.clone();
        let store = Arc::new(InMemoryTokenStore::new());
        let provider = LocalIdentityProvider::new(LocalIdentityConfig::default(), store)
            .with_launcher(move |url| sink.lock().unwrap().push(url.to_string()));

        provider.sign_in_with_redirect("Google").await.unwrap();
        let callback = launched.lock().unwrap()[0].clone();
        provider.handle_redirect(&callback).await.unwrap();

        let session = provider.current_session().await.unwrap().unwrap();
        assert_eq!(session.identity.name, "Google User");
        assert_eq!(session.identity.email.as_deref(), Some("google-user@surge.local"));
    }

    #[tokio::test]
    async fn test_callback_state_must_match() {
        let (provider, _) = provider();
        provider.sign_in_with_redirect("Google").await.unwrap();

        let result = provider
            .handle_redirect("http://localhost:3000/surge-trading-platform/?code=x&state=forged")
            .await;

        assert!(matches!(result, Err(IdentityError::Protocol(_))));
        assert_eq!(provider.current_session().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_refresh_keeps_identity() {
        let (provider, _) = provider();
        provider.add_user("a@b.io", "Alan", "longenough").await.unwrap();
        provider.sign_in("a@b.io", "longenough").await.unwrap();
        let before = provider.current_session().await.unwrap().unwrap();

        let after = provider.refresh_session().await.unwrap();

        assert_eq!(after.identity, before.identity);
    }

    #[tokio::test]
    async fn test_refresh_token_from_other_secret_is_rejected() {
        let (issuer, store) = provider();
        issuer.add_user("a@b.io", "Alan", "longenough").await.unwrap();
        issuer.sign_in("a@b.io", "longenough").await.unwrap();

        let other = LocalIdentityProvider::new(
            LocalIdentityConfig {
                secret: "another-secret".to_string(),
                ..LocalIdentityConfig::default()
            },
            store,
        );

        assert!(matches!(
            other.refresh_session().await,
            Err(IdentityError::Rejected { .. })
        ));
    }

    #[tokio::test]
    async fn test_sign_out_clears_tokens() {
        let (provider, store) = provider();
        provider.add_user("a@b.io", "Alan", "longenough").await.unwrap();
        provider.sign_in("a@b.io", "longenough").await.unwrap();

        provider.sign_out().await.unwrap();

        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_session_manager_over_local_provider() {
        let (provider, _) = provider();
        provider.add_user("a@b.io", "Alan", "longenough").await.unwrap();
        let manager = SessionManager::new(Arc::new(provider));

        manager.initialize().await;
        assert_eq!(manager.session().status, SessionStatus::Anonymous);
        assert_eq!(manager.get_token().await, None);

        let session = manager
            .sign_in_with_credentials("a@b.io", "longenough")
            .await
            .unwrap();
        assert!(session.is_authenticated());
        assert!(manager.get_token().await.is_some());

        manager.sign_out().await.unwrap();
        assert_eq!(manager.session().status, SessionStatus::Anonymous);
    }

    #[test]
    fn test_config_from_lookup() {
        let config = LocalIdentityConfig::from_lookup(|key| match key {
            "LOCAL_IDENTITY_SECRET" => Some("s3cret".to_string()),
            "LOCAL_IDENTITY_TTL_SECS" => Some("120".to_string()),
            _ => None,
        });

        assert_eq!(config.secret, "s3cret");
        assert_eq!(config.token_ttl, TimeDelta::seconds(120));
        assert_eq!(config.issuer, "surge-local");
    }
}
