use crate::error::{ClientError, ClientResult};
use crate::events::{Action, Notifier};
use crate::gateway::HttpGateway;
use crate::models::{AuthCredentials, FederatedProvider};
use crate::token_store::TokenStore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

pub const MISSING_FIELDS: &str = "Enter email and password";
const AUTH_FALLBACK: &str = "Auth failed";

/// Which form the auth view is showing.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    #[default]
    Login,
    Register,
}

impl AuthMode {
    pub fn title(self) -> &'static str {
        match self {
            Self::Login => "Sign in",
            Self::Register => "Create account",
        }
    }
}

/// Transient state of the auth form.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthFormState {
    pub mode: AuthMode,
    pub email: String,
    pub password: String,
    pub submitting: bool,
}

impl fmt::Debug for AuthFormState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthFormState")
            .field("mode", &self.mode)
            .field("email", &self.email)
            .field("password", &if self.password.is_empty() { "" } else { "[REDACTED]" })
            .field("submitting", &self.submitting)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStatus {
    Anonymous,
    Submitting,
    Authenticated,
    /// The whole client should leave for the identity provider.
    Redirecting(Url),
    /// Last attempt failed; the form stays editable.
    Error(String),
}

impl AuthStatus {
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Anonymous | Self::Error(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Credential stored; show the landing view.
    SignedIn,
    /// Account created; the form is back in login mode.
    Registered,
}

/// Drives sign-in, registration and redirect-based sign-in.
pub struct AuthFlow {
    gateway: Arc<dyn HttpGateway>,
    tokens: TokenStore,
    notifier: Notifier,
    form: AuthFormState,
    status: AuthStatus,
    retain_password: bool,
}

impl AuthFlow {
    pub fn new(gateway: Arc<dyn HttpGateway>, tokens: TokenStore, notifier: Notifier) -> Self {
        let status = if tokens.is_authenticated() {
            AuthStatus::Authenticated
        } else {
            AuthStatus::Anonymous
        };
        Self {
            gateway,
            tokens,
            notifier,
            form: AuthFormState::default(),
            status,
            retain_password: true,
        }
    }

    /// Whether the typed password survives a failed attempt.
    pub fn retain_password(mut self, retain: bool) -> Self {
        self.retain_password = retain;
        self
    }

    pub fn form(&self) -> &AuthFormState {
        &self.form
    }

    pub fn status(&self) -> &AuthStatus {
        &self.status
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.form.email = email.into();
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.form.password = password.into();
    }

    pub fn set_mode(&mut self, mode: AuthMode) {
        self.form.mode = mode;
    }

    pub async fn submit(&mut self) -> ClientResult<AuthOutcome> {
        let mode = self.form.mode;
        let action = self.notifier.begin(match mode {
            AuthMode::Login => Action::Login,
            AuthMode::Register => Action::Register,
        });
        if self.form.email.trim().is_empty() || self.form.password.is_empty() {
            action.rejected(MISSING_FIELDS);
            return Err(ClientError::validation(MISSING_FIELDS));
        }

        let credentials = AuthCredentials {
            email: self.form.email.clone(),
            password: self.form.password.clone(),
        };
        self.form.submitting = true;
        self.status = AuthStatus::Submitting;
        action.started(match mode {
            AuthMode::Login => "Signing in...",
            AuthMode::Register => "Creating account...",
        });

        let result = match mode {
            AuthMode::Login => self.login(&credentials).await,
            AuthMode::Register => self.register(&credentials).await,
        };
        self.form.submitting = false;

        match result {
            Ok(AuthOutcome::SignedIn) => {
                self.status = AuthStatus::Authenticated;
                action.succeeded("Signed in");
                Ok(AuthOutcome::SignedIn)
            }
            Ok(AuthOutcome::Registered) => {
                self.form.mode = AuthMode::Login;
                self.status = AuthStatus::Anonymous;
                action.succeeded("Registered. You can sign in now.");
                Ok(AuthOutcome::Registered)
            }
            Err(err) => {
                let message = err.user_message(AUTH_FALLBACK);
                warn!(%err, mode = ?mode, "authentication failed");
                if !self.retain_password {
                    self.form.password.clear();
                }
                self.status = AuthStatus::Error(message.clone());
                action.failed(message);
                Err(err)
            }
        }
    }

    async fn login(&self, credentials: &AuthCredentials) -> ClientResult<AuthOutcome> {
        let credential = self.gateway.login(credentials).await?;
        if let Err(err) = self.tokens.set(Some(credential)) {
            // Still signed in for this session; only persistence failed.
            warn!(%err, "failed to persist credential");
        }
        info!(email = %credentials.email, "signed in");
        Ok(AuthOutcome::SignedIn)
    }

    async fn register(&self, credentials: &AuthCredentials) -> ClientResult<AuthOutcome> {
        self.gateway.register(credentials).await?;
        info!(email = %credentials.email, "account registered");
        Ok(AuthOutcome::Registered)
    }

    /// Ask the backend where to send the user for `provider` sign-in.
    ///
    /// A successful reply without an `auth_url` counts as an unconfigured
    /// provider and ends in [`AuthStatus::Error`] rather than doing nothing.
    pub async fn start_federated(&mut self, provider: FederatedProvider) -> ClientResult<Url> {
        let action = self.notifier.begin(Action::FederatedLogin(provider));
        let fallback = format!("{} sign-in not configured yet", provider.display_name());
        let result = match self.gateway.federated_login_url(provider).await {
            Ok(Some(url)) => Ok(url),
            Ok(None) => Err(ClientError::remote(None, None)),
            Err(err) => Err(err),
        };
        match result {
            Ok(url) => {
                info!(provider = %provider, "redirecting to identity provider");
                self.status = AuthStatus::Redirecting(url.clone());
                action.succeeded(format!("Redirecting to {}", provider.display_name()));
                Ok(url)
            }
            Err(err) => {
                let message = err.user_message(&fallback);
                warn!(%err, provider = %provider, "federated sign-in unavailable");
                self.status = AuthStatus::Error(message.clone());
                action.failed(message);
                Err(err)
            }
        }
    }

    pub fn logout(&mut self) -> ClientResult<()> {
        logout(&self.tokens, &self.notifier)?;
        self.status = AuthStatus::Anonymous;
        Ok(())
    }
}

/// Forget the stored credential.
pub fn logout(tokens: &TokenStore, notifier: &Notifier) -> ClientResult<()> {
    let action = notifier.begin(Action::Logout);
    match tokens.clear() {
        Ok(()) => {
            action.succeeded("Logged out");
            Ok(())
        }
        Err(err) => {
            action.failed(err.user_message("Could not remove the stored credential"));
            Err(err)
        }
    }
}
