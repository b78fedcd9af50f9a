//! Session manager - the single owner of the application's identity state.

use std::fmt::Display;
use std::sync::Arc;

use tokio::sync::{OnceCell, watch};

use crate::domain::{AuthSession, Session, SessionStatus};
use crate::error::ClientError;
use crate::ports::{IdentityError, IdentityProvider};

/// Owns the live [`Session`] and is the only component that talks to the
/// identity provider.
///
/// State transitions are published through a `watch` channel; views call
/// [`SessionManager::subscribe`] and treat `loading` as a gate until the
/// startup check has settled.
pub struct SessionManager {
    provider: Arc<dyn IdentityProvider>,
    state: watch::Sender<Session>,
    startup: OnceCell<()>,
}

impl SessionManager {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        let (state, _) = watch::channel(Session {
            loading: true,
            ..Session::default()
        });
        Self {
            provider,
            state,
            startup: OnceCell::new(),
        }
    }

    /// Current session snapshot.
    pub fn session(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Receive every state transition from now on.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_configured()
    }

    /// Startup identity check. Runs once per manager; later or concurrent
    /// callers wait for the same check. Never fails: anything that goes
    /// wrong settles the session as anonymous.
    pub async fn initialize(&self) {
        self.startup
            .get_or_init(|| async {
                self.state.send_modify(|session| {
                    session.status = SessionStatus::Checking;
                    session.loading = true;
                });

                let settled = self.load_session().await;
                tracing::info!(
                    status = ?settled.status,
                    "Startup identity check settled"
                );
                self.state.send_replace(settled);
            })
            .await;
    }

    /// Re-read the provider session and replace the local one wholesale.
    ///
    /// Unlike [`initialize`](Self::initialize) this never re-enters
    /// `Checking`; it is how a finished redirect sign-in becomes visible.
    pub async fn check_user(&self) -> Session {
        let session = self.load_session().await;
        self.state.send_replace(session.clone());
        session
    }

    /// Start a redirect sign-in with an external provider such as `Google`.
    ///
    /// Resolves once the redirect has been handed off, not when the user is
    /// signed in. `loading` stays set until the redirect is completed.
    pub async fn sign_in_with_provider(&self, provider_name: &str) -> Result<(), ClientError> {
        self.ensure_configured(&format!("{provider_name} sign-in"))?;

        self.begin_operation();
        match self.provider.sign_in_with_redirect(provider_name).await {
            Ok(()) => {
                tracing::info!(provider = %provider_name, "Redirect sign-in started");
                Ok(())
            }
            Err(e) => {
                tracing::error!(provider = %provider_name, error = %e, "Error starting redirect sign-in");
                self.fail_operation(&e);
                Err(e.into())
            }
        }
    }

    /// Hand the URL the redirect returned to back to the provider, then
    /// refresh the session from it.
    pub async fn complete_redirect(&self, callback_url: &str) -> Result<Session, ClientError> {
        self.ensure_configured("Redirect sign-in")?;

        self.begin_operation();
        if let Err(e) = self.provider.handle_redirect(callback_url).await {
            tracing::error!(error = %e, "Error completing redirect sign-in");
            self.fail_operation(&e);
            return Err(e.into());
        }
        Ok(self.check_user().await)
    }

    /// Username/password sign-in. Failures are returned so a form can show
    /// them; the session is left as it was.
    pub async fn sign_in_with_credentials(
        &self,
        identifier: &str,
        secret: &str,
    ) -> Result<Session, ClientError> {
        self.ensure_configured("Sign-in")?;

        self.begin_operation();
        if let Err(e) = self.provider.sign_in(identifier, secret).await {
            tracing::warn!(error = %e, "Error signing in");
            self.fail_operation(&e);
            return Err(e.into());
        }

        let session = self.check_user().await;
        if !session.is_authenticated() {
            let err = ClientError::Unauthenticated;
            self.fail_operation(&err);
            return Err(err);
        }
        Ok(session)
    }

    /// Create an account. Does not sign the new user in.
    pub async fn sign_up(&self, identifier: &str, secret: &str, name: &str) -> Result<(), ClientError> {
        self.ensure_configured("Sign-up")?;

        self.begin_operation();
        match self.provider.sign_up(identifier, secret, name).await {
            Ok(()) => {
                self.state.send_modify(|session| session.loading = false);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Error signing up");
                self.fail_operation(&e);
                Err(e.into())
            }
        }
    }

    /// Sign out. The local session is always reset, even when the provider
    /// call fails; that failure is still returned.
    pub async fn sign_out(&self) -> Result<(), ClientError> {
        let status = self.state.borrow().status;
        if status == SessionStatus::Anonymous || !self.provider.is_configured() {
            self.state.send_replace(Session::anonymous());
            return Ok(());
        }

        self.begin_operation();
        let result = self.provider.sign_out().await;

        let mut next = Session::anonymous();
        if let Err(e) = &result {
            tracing::error!(error = %e, "Error signing out, local session cleared anyway");
            next.last_error = Some(e.to_string());
        } else {
            tracing::info!("Signed out");
        }
        self.state.send_replace(next);

        result.map_err(ClientError::from)
    }

    /// Current bearer credential, refreshed first when it has expired.
    ///
    /// Returns `None` when nobody is signed in or the credential could not
    /// be refreshed; it never fails.
    pub async fn get_token(&self) -> Option<String> {
        if let Some(credential) = self.state.borrow().credential.as_ref() {
            if !credential.is_expired() {
                return Some(credential.token().to_string());
            }
        }

        // Only a live session may be renewed; signing back in goes through sign_in.
        let live = self.state.borrow().status == SessionStatus::Authenticated;
        if !live || !self.provider.is_configured() {
            return None;
        }

        match self.resolve_session().await {
            Ok(Some(auth)) => {
                let token = auth.credential.token().to_string();
                self.adopt(auth);
                Some(token)
            }
            Ok(None) => {
                self.drop_stale_session(None);
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Error getting token");
                self.drop_stale_session(Some(e.to_string()));
                None
            }
        }
    }

    async fn load_session(&self) -> Session {
        if !self.provider.is_configured() {
            tracing::info!("Identity provider not configured - skipping auth check");
            return Session::anonymous();
        }

        match self.resolve_session().await {
            Ok(Some(auth)) => {
                tracing::info!(
                    user_id = %auth.identity.user_id,
                    email = ?auth.identity.email,
                    "User authenticated"
                );
                Session::authenticated(auth)
            }
            Ok(None) => {
                tracing::debug!("No existing identity session");
                Session::anonymous()
            }
            Err(e) => {
                tracing::info!(error = %e, "Not authenticated");
                Session::anonymous()
            }
        }
    }

    /// Provider session with an unexpired credential, refreshing if needed.
    async fn resolve_session(&self) -> Result<Option<AuthSession>, IdentityError> {
        let Some(current) = self.provider.current_session().await? else {
            return Ok(None);
        };
        if !current.credential.is_expired() {
            return Ok(Some(current));
        }

        tracing::debug!(user_id = %current.identity.user_id, "Credential expired, refreshing");
        self.provider.refresh_session().await.map(Some)
    }

    /// Swap in a refreshed credential without disturbing anything else.
    fn adopt(&self, auth: AuthSession) {
        self.state.send_if_modified(|session| {
            if session.status != SessionStatus::Authenticated {
                return false;
            }
            session.identity = Some(auth.identity);
            session.credential = Some(auth.credential);
            true
        });
    }

    /// The provider no longer backs the session we hold: fall back to anonymous.
    fn drop_stale_session(&self, error: Option<String>) {
        self.state.send_if_modified(|session| {
            if session.status != SessionStatus::Authenticated {
                return false;
            }
            tracing::info!("Credential rejected, session reset to anonymous");
            *session = Session {
                last_error: error,
                ..Session::anonymous()
            };
            true
        });
    }

    fn ensure_configured(&self, feature: &str) -> Result<(), ClientError> {
        if self.provider.is_configured() {
            return Ok(());
        }
        let message = format!("{feature} is not configured yet; set the identity provider settings first");
        tracing::warn!(feature = %feature, "Identity provider not configured");
        self.state.send_modify(|session| session.last_error = Some(message.clone()));
        Err(ClientError::ConfigurationMissing(message))
    }

    fn begin_operation(&self) {
        self.state.send_modify(|session| {
            session.loading = true;
            session.last_error = None;
        });
    }

    fn fail_operation(&self, error: &impl Display) {
        let message = error.to_string();
        self.state.send_modify(|session| {
            session.loading = false;
            session.last_error = Some(message);
        });
    }
}
