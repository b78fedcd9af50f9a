//! Identity provider configuration loaded from environment variables.

const PLACEHOLDER_MARKER: &str = "XXXX";
const DEFAULT_SCOPES: [&str; 3] = ["email", "openid", "profile"];
const DEFAULT_REDIRECT: &str = "http://localhost:3000/surge-trading-platform/";

/// Static identity provider settings, consumed once at startup.
///
/// Missing or placeholder values are not an error: they disable identity
/// features (see [`IdentityConfig::is_configured`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityConfig {
    pub user_pool_id: String,
    pub client_id: String,
    /// Hosted UI domain, without scheme.
    pub oauth_domain: String,
    pub scopes: Vec<String>,
    pub redirect_sign_in: Vec<String>,
    pub redirect_sign_out: Vec<String>,
    pub response_type: String,
    /// Override for the Cognito JSON API endpoint (local emulators).
    pub idp_endpoint: Option<String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            user_pool_id: "us-east-1_XXXXXXXXX".to_string(),
            client_id: "XXXXXXXXXXXXXXXXXXXXXXXXXX".to_string(),
            oauth_domain: String::new(),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            redirect_sign_in: vec![DEFAULT_REDIRECT.to_string()],
            redirect_sign_out: vec![DEFAULT_REDIRECT.to_string()],
            response_type: "code".to_string(),
            idp_endpoint: None,
        }
    }
}

impl IdentityConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Lists accept commas or whitespace.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let value = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let list = |key: &str| value(key).map(|v| split_list(&v));

        Self {
            user_pool_id: value("COGNITO_USER_POOL_ID").unwrap_or(defaults.user_pool_id),
            client_id: value("COGNITO_CLIENT_ID").unwrap_or(defaults.client_id),
            oauth_domain: value("COGNITO_DOMAIN")
                .map(|d| strip_scheme(&d))
                .unwrap_or(defaults.oauth_domain),
            scopes: list("COGNITO_SCOPES").unwrap_or(defaults.scopes),
            redirect_sign_in: list("COGNITO_REDIRECT_SIGN_IN").unwrap_or(defaults.redirect_sign_in),
            redirect_sign_out: list("COGNITO_REDIRECT_SIGN_OUT").unwrap_or(defaults.redirect_sign_out),
            response_type: defaults.response_type,
            idp_endpoint: value("COGNITO_IDP_ENDPOINT"),
        }
    }

    /// True when the pool and client identifiers are real values.
    pub fn is_configured(&self) -> bool {
        let real = |v: &str| !v.is_empty() && !v.contains(PLACEHOLDER_MARKER);
        real(&self.user_pool_id) && real(&self.client_id) && self.region().is_some()
    }

    /// Whether redirect sign-in can be offered (needs the hosted UI domain).
    pub fn supports_redirect(&self) -> bool {
        self.is_configured() && !self.oauth_domain.is_empty() && !self.redirect_sign_in.is_empty()
    }

    /// AWS region, taken from the pool id prefix (`us-east-1_abc` → `us-east-1`).
    pub fn region(&self) -> Option<&str> {
        self.user_pool_id
            .split_once('_')
            .map(|(region, _)| region)
            .filter(|region| !region.is_empty())
    }

    /// Endpoint for the Cognito JSON API.
    pub fn idp_endpoint(&self) -> Option<String> {
        if let Some(endpoint) = &self.idp_endpoint {
            return Some(endpoint.clone());
        }
        self.region()
            .map(|region| format!("https://cognito-idp.{region}.amazonaws.com/"))
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn strip_scheme(domain: &str) -> String {
    domain
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/')
        .to_string()
}
