//! Amazon Cognito identity provider.
//!
//! Redirect sign-in goes through the hosted UI (`/oauth2/authorize` and
//! `/oauth2/token`); everything else uses the Cognito JSON API
//! (`InitiateAuth`, `SignUp`, `GlobalSignOut`).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use reqwest::{Client, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::sync::Mutex;

use surge_core::domain::AuthSession;
use surge_core::ports::{IdentityError, IdentityProvider, TokenSet, TokenStore};

use super::RedirectLauncher;
use super::claims::session_from_id_token;
use crate::config::IdentityConfig;
use crate::http::TransportConfig;

const AMZ_JSON: &str = "application/x-amz-json-1.1";
const TARGET_PREFIX: &str = "AWSCognitoIdentityProviderService";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InitiateAuthResponse {
    #[serde(default)]
    authentication_result: Option<AuthenticationResult>,
    #[serde(default)]
    challenge_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AuthenticationResult {
    id_token: String,
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct OAuthTokenResponse {
    id_token: String,
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    expires_in: i64,
}

#[derive(Debug, Default, Deserialize)]
struct CognitoErrorBody {
    #[serde(rename = "__type", default)]
    error_type: Option<String>,
    #[serde(alias = "Message", default)]
    message: Option<String>,
    /// OAuth endpoints report `error` / `error_description` instead.
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Cognito user pool client.
pub struct CognitoIdentityProvider {
    config: IdentityConfig,
    client: Client,
    store: Arc<dyn TokenStore>,
    launcher: RedirectLauncher,
    pending_state: Mutex<Option<String>>,
}

impl CognitoIdentityProvider {
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        config: IdentityConfig,
        store: Arc<dyn TokenStore>,
        transport: &TransportConfig,
    ) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder().user_agent(transport.user_agent.as_str());
        if let Some(timeout) = transport.timeout {
            builder = builder.timeout(timeout);
        }

        if !config.is_configured() {
            tracing::warn!("Cognito not configured - identity features disabled");
        }

        Ok(Self {
            config,
            client: builder.build()?,
            store,
            launcher: Box::new(|url| tracing::info!(url = %url, "Open this URL to sign in")),
            pending_state: Mutex::new(None),
        })
    }

    /// Replace what happens with the hosted UI URL (open a browser, print it).
    pub fn with_launcher(mut self, launcher: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.launcher = Box::new(launcher);
        self
    }

    /// Hosted UI authorize URL for an external provider such as `Google`.
    pub fn authorize_url(&self, provider: &str, state: &str) -> Result<Url, IdentityError> {
        let redirect_uri = self.redirect_uri()?;
        let base = format!("https://{}/oauth2/authorize", self.config.oauth_domain);
        let scope = self.config.scopes.join(" ");

        Url::parse_with_params(
            &base,
            [
                ("identity_provider", provider),
                ("redirect_uri", redirect_uri),
                ("response_type", self.config.response_type.as_str()),
                ("client_id", self.config.client_id.as_str()),
                ("scope", scope.as_str()),
                ("state", state),
            ],
        )
        .map_err(|e| IdentityError::Protocol(format!("invalid hosted UI domain: {e}")))
    }

    fn ensure_configured(&self) -> Result<(), IdentityError> {
        if self.config.is_configured() {
            Ok(())
        } else {
            Err(IdentityError::NotConfigured)
        }
    }

    fn redirect_uri(&self) -> Result<&str, IdentityError> {
        if !self.config.supports_redirect() {
            return Err(IdentityError::NotConfigured);
        }
        self.config
            .redirect_sign_in
            .first()
            .map(String::as_str)
            .ok_or(IdentityError::NotConfigured)
    }

    /// One call against the Cognito JSON API.
    async fn idp_call<T: DeserializeOwned>(&self, action: &str, body: Value) -> Result<T, IdentityError> {
        let endpoint = self.config.idp_endpoint().ok_or(IdentityError::NotConfigured)?;

        let response = self
            .client
            .post(endpoint)
            .header(reqwest::header::CONTENT_TYPE, AMZ_JSON)
            .header("X-Amz-Target", format!("{TARGET_PREFIX}.{action}"))
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| IdentityError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| IdentityError::Network(e.to_string()))?;
        if !status.is_success() {
            tracing::debug!(action = %action, status = status.as_u16(), "Cognito call rejected");
            return Err(parse_error(status.as_u16(), &text));
        }

        serde_json::from_str(&text).map_err(|e| IdentityError::Protocol(format!("{action}: {e}")))
    }

    async fn initiate_auth(&self, flow: &str, parameters: Value) -> Result<AuthenticationResult, IdentityError> {
        let response: InitiateAuthResponse = self
            .idp_call(
                "InitiateAuth",
                json!({
                    "AuthFlow": flow,
                    "ClientId": self.config.client_id,
                    "AuthParameters": parameters,
                }),
            )
            .await?;

        match (response.authentication_result, response.challenge_name) {
            (Some(result), _) => Ok(result),
            (None, Some(challenge)) => Err(IdentityError::Protocol(format!(
                "sign-in challenge {challenge} is not supported"
            ))),
            (None, None) => Err(IdentityError::Protocol(
                "InitiateAuth returned no tokens".to_string(),
            )),
        }
    }

    async fn store_tokens(&self, tokens: TokenSet) -> Result<AuthSession, IdentityError> {
        let session = session_from_id_token(&tokens.id_token)?;
        self.store.save(&tokens).await?;
        Ok(session)
    }
}

#[async_trait]
impl IdentityProvider for CognitoIdentityProvider {
    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    async fn current_session(&self) -> Result<Option<AuthSession>, IdentityError> {
        self.ensure_configured()?;
        match self.store.load().await? {
            Some(tokens) => session_from_id_token(&tokens.id_token).map(Some),
            None => Ok(None),
        }
    }

    async fn refresh_session(&self) -> Result<AuthSession, IdentityError> {
        self.ensure_configured()?;
        let tokens = self.store.load().await?.ok_or(IdentityError::NoSession)?;
        let refresh_token = tokens.refresh_token.ok_or(IdentityError::NoSession)?;

        let result = self
            .initiate_auth("REFRESH_TOKEN_AUTH", json!({ "REFRESH_TOKEN": refresh_token }))
            .await?;

        tracing::debug!("Cognito tokens refreshed");
        self.store_tokens(TokenSet {
            id_token: result.id_token,
            access_token: result.access_token,
            // Cognito does not rotate refresh tokens on this flow.
            refresh_token: result.refresh_token.or(Some(refresh_token)),
            expires_at: Utc::now() + TimeDelta::seconds(result.expires_in),
        })
        .await
    }

    async fn sign_in_with_redirect(&self, provider: &str) -> Result<(), IdentityError> {
        self.ensure_configured()?;
        let state = uuid::Uuid::new_v4().simple().to_string();
        let url = self.authorize_url(provider, &state)?;

        *self.pending_state.lock().await = Some(state);
        (self.launcher)(url.as_str());
        Ok(())
    }

    async fn handle_redirect(&self, callback_url: &str) -> Result<(), IdentityError> {
        self.ensure_configured()?;
        let callback = Url::parse(callback_url)
            .map_err(|e| IdentityError::Protocol(format!("invalid callback URL: {e}")))?;
        let param = |name: &str| {
            callback
                .query_pairs()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned())
        };

        let expected_state = self.pending_state.lock().await.take();
        if let Some(error) = param("error") {
            return Err(IdentityError::Rejected {
                message: param("error_description").unwrap_or_else(|| error.clone()),
                code: error,
            });
        }
        let code = param("code")
            .ok_or_else(|| IdentityError::Protocol("callback has no authorization code".to_string()))?;
        match expected_state {
            None => {
                return Err(IdentityError::Protocol(
                    "no redirect sign-in in progress".to_string(),
                ));
            }
            Some(expected) if param("state").as_deref() != Some(expected.as_str()) => {
                return Err(IdentityError::Protocol("redirect state mismatch".to_string()));
            }
            Some(_) => {}
        }

        let token_url = format!("https://{}/oauth2/token", self.config.oauth_domain);
        let redirect_uri = self.redirect_uri()?;
        let response = self
            .client
            .post(token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("client_id", self.config.client_id.as_str()),
                ("code", code.as_str()),
                ("redirect_uri", redirect_uri),
            ])
            .send()
            .await
            .map_err(|e| IdentityError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| IdentityError::Network(e.to_string()))?;
        if !status.is_success() {
            return Err(parse_error(status.as_u16(), &text));
        }
        let tokens: OAuthTokenResponse = serde_json::from_str(&text)
            .map_err(|e| IdentityError::Protocol(format!("token exchange: {e}")))?;

        let session = self
            .store_tokens(TokenSet {
                id_token: tokens.id_token,
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
                expires_at: Utc::now() + TimeDelta::seconds(tokens.expires_in),
            })
            .await?;
        tracing::info!(user_id = %session.identity.user_id, "Redirect sign-in completed");
        Ok(())
    }

    async fn sign_in(&self, username: &str, password: &str) -> Result<(), IdentityError> {
        self.ensure_configured()?;
        let result = self
            .initiate_auth(
                "USER_PASSWORD_AUTH",
                json!({ "USERNAME": username, "PASSWORD": password }),
            )
            .await?;

        self.store_tokens(TokenSet {
            id_token: result.id_token,
            access_token: result.access_token,
            refresh_token: result.refresh_token,
            expires_at: Utc::now() + TimeDelta::seconds(result.expires_in),
        })
        .await?;
        Ok(())
    }

    async fn sign_up(&self, username: &str, password: &str, name: &str) -> Result<(), IdentityError> {
        self.ensure_configured()?;
        let _: Value = self
            .idp_call(
                "SignUp",
                json!({
                    "ClientId": self.config.client_id,
                    "Username": username,
                    "Password": password,
                    "UserAttributes": [
                        { "Name": "email", "Value": username },
                        { "Name": "name", "Value": name },
                    ],
                }),
            )
            .await?;
        tracing::info!("Cognito sign-up submitted");
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        self.ensure_configured()?;
        let remote = match self.store.load().await? {
            Some(tokens) => self
                .idp_call::<Value>("GlobalSignOut", json!({ "AccessToken": tokens.access_token }))
                .await
                .map(|_| ()),
            None => Ok(()),
        };
        self.store.clear().await?;
        remote
    }
}

/// Map a Cognito or OAuth error body onto [`IdentityError`].
fn parse_error(status: u16, body: &str) -> IdentityError {
    let parsed: CognitoErrorBody = serde_json::from_str(body).unwrap_or_default();

    let code = parsed
        .error_type
        .as_deref()
        .map(|t| t.rsplit('#').next().unwrap_or(t).to_string())
        .or(parsed.error);
    let message = parsed.message.or(parsed.error_description);

    match (code, message) {
        (Some(code), Some(message)) => IdentityError::Rejected { code, message },
        (Some(code), None) => IdentityError::Rejected {
            message: code.clone(),
            code,
        },
        (None, message) => IdentityError::Rejected {
            code: format!("HTTP {status}"),
            message: message.unwrap_or_else(|| body.trim().to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use jsonwebtoken::{EncodingKey, Header, encode};

    use super::*;
    use crate::store::InMemoryTokenStore;

    fn config() -> IdentityConfig {
        IdentityConfig {
            user_pool_id: "us-east-1_EktqgQ3JB".to_string(),
            client_id: "2mibkeeeec0m928jovj4bgmb00".to_string(),
            oauth_domain: "surge.auth.us-east-1.amazoncognito.com".to_string(),
            redirect_sign_in: vec!["http://localhost:3000/surge/".to_string()],
            // Unroutable, so an accidental network call fails fast.
            idp_endpoint: Some("http://127.0.0.1:9/".to_string()),
            ..IdentityConfig::default()
        }
    }

    fn provider(store: Arc<InMemoryTokenStore>) -> (CognitoIdentityProvider, Arc<StdMutex<Vec<String>>>) {
        let launched = Arc::new(StdMutex::new(Vec::new()));
        let sink = launched.clone();
        let provider = CognitoIdentityProvider::new(config(), store, &TransportConfig::default())
            .unwrap()
            .with_launcher(move |url| sink.lock().unwrap().push(url.to_string()));
        (provider, launched)
    }

    fn id_token(exp: i64) -> String {
        let claims = json!({"sub": "u-42", "email": "ada@example.com", "exp": exp});
        encode(&Header::default(), &claims, &EncodingKey::from_secret(b"k")).unwrap()
    }

    #[test]
    fn test_authorize_url_carries_oauth_parameters() {
        let (provider, _) = provider(Arc::new(InMemoryTokenStore::new()));

        let url = provider.authorize_url("Google", "s1").unwrap();
        let params: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert_eq!(url.host_str(), Some("surge.auth.us-east-1.amazoncognito.com"));
        assert_eq!(url.path(), "/oauth2/authorize");
        assert!(params.contains(&("identity_provider".to_string(), "Google".to_string())));
        assert!(params.contains(&("response_type".to_string(), "code".to_string())));
        assert!(params.contains(&("scope".to_string(), "email openid profile".to_string())));
        assert!(params.contains(&("redirect_uri".to_string(), "http://localhost:3000/surge/".to_string())));
        assert!(params.contains(&("state".to_string(), "s1".to_string())));
    }

    #[tokio::test]
    async fn test_redirect_hands_url_to_launcher() {
        let (provider, launched) = provider(Arc::new(InMemoryTokenStore::new()));

        provider.sign_in_with_redirect("Google").await.unwrap();

        let urls = launched.lock().unwrap().clone();
        assert_eq!(urls.len(), 1);
        assert!(urls[0].contains("identity_provider=Google"));
        assert!(provider.pending_state.lock().await.is_some());
    }

    #[tokio::test]
    async fn test_callback_without_pending_redirect_is_rejected() {
        let (provider, _) = provider(Arc::new(InMemoryTokenStore::new()));

        let result = provider
            .handle_redirect("http://localhost:3000/surge/?code=abc&state=zzz")
            .await;

        assert!(matches!(result, Err(IdentityError::Protocol(_))));
    }

    #[tokio::test]
    async fn test_callback_with_wrong_state_is_rejected() {
        let (provider, _) = provider(Arc::new(InMemoryTokenStore::new()));
        provider.sign_in_with_redirect("Google").await.unwrap();

        let result = provider
            .handle_redirect("http://localhost:3000/surge/?code=abc&state=forged")
            .await;

        assert!(matches!(result, Err(IdentityError::Protocol(m)) if m.contains("state")));
    }

    #[tokio::test]
    async fn test_callback_error_is_surfaced() {
        let (provider, _) = provider(Arc::new(InMemoryTokenStore::new()));
        provider.sign_in_with_redirect("Google").await.unwrap();

        let result = provider
            .handle_redirect(
                "http://localhost:3000/surge/?error=access_denied&error_description=User+cancelled",
            )
            .await;

        match result {
            Err(IdentityError::Rejected { code, message }) => {
                assert_eq!(code, "access_denied");
                assert_eq!(message, "User cancelled");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_current_session_reads_stored_tokens() {
        let store = Arc::new(InMemoryTokenStore::new());
        let (provider, _) = provider(store.clone());
        assert_eq!(provider.current_session().await.unwrap(), None);

        let token = id_token(1_900_000_000);
        store
            .save(&TokenSet {
                id_token: token.clone(),
                access_token: "a".to_string(),
                refresh_token: None,
                expires_at: Utc::now(),
            })
            .await
            .unwrap();

        let session = provider.current_session().await.unwrap().unwrap();
        assert_eq!(session.identity.user_id, "u-42");
        assert_eq!(session.credential.token(), token);
    }

    #[tokio::test]
    async fn test_refresh_without_refresh_token_is_no_session() {
        let store = Arc::new(InMemoryTokenStore::new());
        store
            .save(&TokenSet {
                id_token: id_token(1),
                access_token: "a".to_string(),
                refresh_token: None,
                expires_at: Utc::now(),
            })
            .await
            .unwrap();
        let (provider, _) = provider(store);

        let result = provider.refresh_session().await;

        assert!(matches!(result, Err(IdentityError::NoSession)));
    }

    #[tokio::test]
    async fn test_sign_out_without_tokens_stays_local() {
        let (provider, _) = provider(Arc::new(InMemoryTokenStore::new()));
        provider.sign_out().await.unwrap();
    }

    #[tokio::test]
    async fn test_unconfigured_provider_refuses_everything() {
        let provider = CognitoIdentityProvider::new(
            IdentityConfig::default(),
            Arc::new(InMemoryTokenStore::new()),
            &TransportConfig::default(),
        )
        .unwrap();

        assert!(!provider.is_configured());
        assert!(matches!(
            provider.current_session().await,
            Err(IdentityError::NotConfigured)
        ));
        assert!(matches!(
            provider.sign_in_with_redirect("Google").await,
            Err(IdentityError::NotConfigured)
        ));
        assert!(matches!(
            provider.sign_in("a@b.c", "pw").await,
            Err(IdentityError::NotConfigured)
        ));
    }

    #[test]
    fn test_parse_error_shapes() {
        let err = parse_error(
            400,
            r#"{"__type":"com.amazonaws#NotAuthorizedException","message":"Incorrect username or password."}"#,
        );
        assert!(matches!(
            err,
            IdentityError::Rejected { ref code, ref message }
                if code == "NotAuthorizedException" && message == "Incorrect username or password."
        ));

        let err = parse_error(400, r#"{"error":"invalid_grant"}"#);
        assert!(matches!(err, IdentityError::Rejected { ref code, .. } if code == "invalid_grant"));

        let err = parse_error(502, "Bad Gateway");
        assert_eq!(err.to_string(), "Bad Gateway");
    }
}
