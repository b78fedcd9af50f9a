//! Hand-written port fakes for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};

use crate::domain::{AuthSession, Credential, Identity};
use crate::ports::{
    HttpRequest, HttpResponse, HttpTransport, IdentityError, IdentityProvider, TransportError,
};

pub const PASSWORD: &str = "correct-horse";

pub fn auth_session(token: &str, ttl_secs: i64) -> AuthSession {
    AuthSession {
        identity: Identity {
            user_id: "0b3c5d1e-user".to_string(),
            name: "Ada Trader".to_string(),
            email: Some("ada@example.com".to_string()),
        },
        credential: Credential::new(token, Utc::now() + TimeDelta::seconds(ttl_secs)),
    }
}

/// Scriptable identity provider that counts calls.
pub struct FakeProvider {
    pub configured: bool,
    pub session: Mutex<Option<AuthSession>>,
    pub fail_current: bool,
    pub fail_sign_out: bool,
    pub refreshed: Mutex<Option<AuthSession>>,
    pub latency: Duration,
    pub current_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub sign_out_calls: AtomicUsize,
    pub redirects: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub fn signed_out() -> Self {
        Self {
            configured: true,
            session: Mutex::new(None),
            fail_current: false,
            fail_sign_out: false,
            refreshed: Mutex::new(None),
            latency: Duration::ZERO,
            current_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            sign_out_calls: AtomicUsize::new(0),
            redirects: Mutex::new(Vec::new()),
        }
    }

    pub fn signed_in(token: &str) -> Self {
        let provider = Self::signed_out();
        *provider.session.lock().unwrap() = Some(auth_session(token, 3600));
        provider
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::signed_out()
        }
    }
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn current_session(&self) -> Result<Option<AuthSession>, IdentityError> {
        self.current_calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.fail_current {
            return Err(IdentityError::Network("provider unreachable".to_string()));
        }
        Ok(self.session.lock().unwrap().clone())
    }

    async fn refresh_session(&self) -> Result<AuthSession, IdentityError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        let refreshed = self.refreshed.lock().unwrap().clone();
        match refreshed {
            Some(auth) => {
                *self.session.lock().unwrap() = Some(auth.clone());
                Ok(auth)
            }
            None => Err(IdentityError::Rejected {
                code: "NotAuthorizedException".to_string(),
                message: "Refresh Token has expired".to_string(),
            }),
        }
    }

    async fn sign_in_with_redirect(&self, provider: &str) -> Result<(), IdentityError> {
        self.redirects.lock().unwrap().push(provider.to_string());
        Ok(())
    }

    async fn handle_redirect(&self, callback_url: &str) -> Result<(), IdentityError> {
        if !callback_url.contains("code=") {
            return Err(IdentityError::Protocol("missing authorization code".to_string()));
        }
        *self.session.lock().unwrap() = Some(auth_session("redirect-token", 3600));
        Ok(())
    }

    async fn sign_in(&self, _username: &str, password: &str) -> Result<(), IdentityError> {
        if password != PASSWORD {
            return Err(IdentityError::Rejected {
                code: "NotAuthorizedException".to_string(),
                message: "Incorrect username or password.".to_string(),
            });
        }
        *self.session.lock().unwrap() = Some(auth_session("fresh-token", 3600));
        Ok(())
    }

    async fn sign_up(
        &self,
        username: &str,
        _password: &str,
        _name: &str,
    ) -> Result<(), IdentityError> {
        if username.contains('@') {
            Ok(())
        } else {
            Err(IdentityError::Rejected {
                code: "InvalidParameterException".to_string(),
                message: "Invalid email address format.".to_string(),
            })
        }
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        *self.session.lock().unwrap() = None;
        if self.fail_sign_out {
            return Err(IdentityError::Network("connection reset".to_string()));
        }
        Ok(())
    }
}

/// Transport that records every request and replays queued responses.
pub struct RecordingTransport {
    pub requests: Mutex<Vec<HttpRequest>>,
    responses: Mutex<VecDeque<HttpResponse>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            responses: Mutex::new(VecDeque::new()),
        }
    }

    pub fn respond(self, status: u16, body: &str) -> Self {
        self.responses.lock().unwrap().push_back(HttpResponse {
            status,
            body: body.to_string(),
        });
        self
    }

    pub fn sent(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for RecordingTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        Ok(self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(HttpResponse {
                status: 200,
                body: "{}".to_string(),
            }))
    }
}
