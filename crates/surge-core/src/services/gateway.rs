//! API gateway client - authorized JSON calls against the Surge backend.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::domain::{ApiEnvironment, ApiRequest, Method};
use crate::error::ClientError;
use crate::ports::{HttpRequest, HttpTransport};
use crate::services::SessionManager;

const NO_CONTENT: u16 = 204;

/// Turns [`ApiRequest`] descriptors into authorized HTTP exchanges.
///
/// Each call is independent and at-most-once: no retries, no caching and no
/// de-duplication. Concurrent calls never share state beyond the session.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    session: Arc<SessionManager>,
    transport: Arc<dyn HttpTransport>,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        session: Arc<SessionManager>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            session,
            transport,
        }
    }

    pub fn for_environment(
        environment: ApiEnvironment,
        session: Arc<SessionManager>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self::new(environment.base_url(), session, transport)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// Dispatch one request and return the decoded JSON body.
    pub async fn call(&self, request: ApiRequest) -> Result<Value, ClientError> {
        let token = self.session.get_token().await;
        if request.protected && token.is_none() {
            tracing::warn!(path = %request.path, "Protected request attempted without a credential");
            return Err(ClientError::Unauthenticated);
        }

        let http = self.compose(request, token.as_deref())?;
        tracing::debug!(method = %http.method, url = %http.url, "Dispatching API request");

        let response = self.transport.send(http).await?;
        if !response.is_success() {
            tracing::warn!(status = response.status, "API request failed");
            return Err(ClientError::RequestFailed {
                status: response.status,
                body: response.body,
            });
        }

        if response.status == NO_CONTENT || response.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&response.body).map_err(|e| ClientError::MalformedResponse(e.to_string()))
    }

    /// [`call`](Self::call), then decode the payload into `T`.
    pub async fn call_as<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ClientError> {
        let value = self.call(request).await?;
        serde_json::from_value(value).map_err(|e| ClientError::MalformedResponse(e.to_string()))
    }

    pub async fn get(&self, path: &str) -> Result<Value, ClientError> {
        self.call(ApiRequest::get(path)).await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, ClientError> {
        self.call(ApiRequest::post(path, to_json(body)?)).await
    }

    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, ClientError> {
        self.call(ApiRequest::put(path, to_json(body)?)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value, ClientError> {
        self.call(ApiRequest::delete(path)).await
    }

    fn compose(&self, request: ApiRequest, token: Option<&str>) -> Result<HttpRequest, ClientError> {
        let url = if request.path.starts_with('/') {
            format!("{}{}", self.base_url, request.path)
        } else {
            format!("{}/{}", self.base_url, request.path)
        };

        // Caller headers may replace the content type, never the credential.
        let mut headers: Vec<(String, String)> = request
            .headers
            .into_iter()
            .filter(|(name, _)| !name.eq_ignore_ascii_case("authorization"))
            .collect();
        if !headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case("content-type"))
        {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }
        if let Some(token) = token {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }

        let body = match request.body {
            Some(value) if request.method != Method::Get => Some(
                serde_json::to_string(&value).map_err(|e| ClientError::InvalidRequest(e.to_string()))?,
            ),
            _ => None,
        };

        Ok(HttpRequest {
            method: request.method,
            url,
            headers,
            body,
        })
    }
}

fn to_json<B: Serialize + ?Sized>(body: &B) -> Result<Value, ClientError> {
    serde_json::to_value(body).map_err(|e| ClientError::InvalidRequest(e.to_string()))
}
