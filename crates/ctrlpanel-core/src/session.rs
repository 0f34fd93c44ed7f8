//! Session store: anonymous/authenticated state, login, registration, logout.
//!
//! # Design
//! - The [`SessionSlot`] is owned by one [`ApiClient`](crate::ApiClient); the
//!   store publishes into it and the client reads the token per request.
//! - Subscribers observe transitions through a `watch` channel, so screens
//!   react to login/logout without a reload.
//! - Logout is fail-open: local state is cleared whatever the backend says.

use std::sync::Arc;

use ctrlpanel_api_models::Credentials;
use thiserror::Error;
use tokio::sync::watch;

use crate::api::AuthClient;
use crate::error::{ApiError, ErrorKind};
use crate::store::{StoreError, TokenStore};

/// Current authentication state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No token.
    #[default]
    Anonymous,
    /// A bearer token is held.
    Authenticated {
        /// Opaque bearer token.
        token: String,
    },
}

impl SessionState {
    /// Token, when authenticated.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated { token } => Some(token),
        }
    }

    /// Whether a token is held.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }
}

/// Shared cell holding the session state for one API client.
#[derive(Clone, Debug)]
pub struct SessionSlot {
    inner: Arc<watch::Sender<SessionState>>,
}

impl SessionSlot {
    /// Slot starting anonymous.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(SessionState::Anonymous);
        Self {
            inner: Arc::new(sender),
        }
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn current(&self) -> SessionState {
        self.inner.borrow().clone()
    }

    /// Current token, if any.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.inner.borrow().token().map(str::to_string)
    }

    /// Replace the state and notify subscribers.
    pub fn publish(&self, state: SessionState) {
        self.inner.send_replace(state);
    }

    /// Receiver notified on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.subscribe()
    }
}

impl Default for SessionSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// Failures surfaced by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Username or password was empty.
    #[error("username and password are required")]
    MissingCredentials,
    /// The backend refused the credentials.
    #[error("invalid username or password")]
    InvalidCredentials,
    /// Registration was refused.
    #[error("registration failed")]
    RegistrationRejected(#[source] ApiError),
    /// The backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
    /// Persisting the token failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of a logout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutOutcome {
    /// The backend acknowledged the logout.
    Acknowledged,
    /// The backend call failed; local state was cleared anyway.
    LocalOnly,
}

/// Session store bound to one API client and one token store.
pub struct SessionStore<S: TokenStore> {
    auth: AuthClient,
    store: S,
}

impl<S: TokenStore> SessionStore<S> {
    /// Restore any persisted token into the client's slot.
    ///
    /// A corrupt session file is treated as anonymous.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Store`] when the session storage cannot be read.
    pub fn open(auth: AuthClient, store: S) -> Result<Self, SessionError> {
        let restored = match store.load() {
            Ok(token) => token,
            Err(StoreError::Corrupt { path, .. }) => {
                tracing::warn!(path = %path.display(), "ignoring corrupt session file");
                None
            }
            Err(err) => return Err(err.into()),
        };
        if let Some(token) = restored {
            tracing::info!("restored persisted session");
            auth.api()
                .session()
                .publish(SessionState::Authenticated { token });
        }
        Ok(Self { auth, store })
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.auth.api().session().current()
    }

    /// Receiver notified on every transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.auth.api().session().subscribe()
    }

    /// Log in, persist the token and publish it before returning.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::MissingCredentials`] for empty input,
    /// [`SessionError::InvalidCredentials`] when the backend refuses them, or
    /// another [`SessionError`] when the call or persistence fails.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), SessionError> {
        let credentials = credentials(username, password)?;
        let token = self
            .auth
            .login(&credentials)
            .await
            .map_err(|err| match err.kind() {
                ErrorKind::Validation | ErrorKind::NotFound => SessionError::InvalidCredentials,
                _ => SessionError::Api(err),
            })?;
        self.store.save(&token)?;
        self.auth
            .api()
            .session()
            .publish(SessionState::Authenticated { token });
        tracing::info!(username = %credentials.username, "logged in");
        Ok(())
    }

    /// Register an account. The session state is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::MissingCredentials`] for empty input or
    /// [`SessionError::RegistrationRejected`] when the backend refuses.
    pub async fn register(&self, username: &str, password: &str) -> Result<(), SessionError> {
        let credentials = credentials(username, password)?;
        self.auth
            .register(&credentials)
            .await
            .map_err(SessionError::RegistrationRejected)?;
        tracing::info!(username = %credentials.username, "registered account");
        Ok(())
    }

    /// Log out on the backend, then clear local state regardless of outcome.
    pub async fn logout(&self) -> LogoutOutcome {
        let outcome = match self.auth.logout().await {
            Ok(()) => LogoutOutcome::Acknowledged,
            Err(err) => {
                tracing::warn!(error = %err, "backend logout failed; clearing local session");
                LogoutOutcome::LocalOnly
            }
        };
        self.clear();
        outcome
    }

    /// Drop the token locally without contacting the backend.
    pub fn clear(&self) {
        if let Err(err) = self.store.clear() {
            tracing::warn!(error = %err, "failed to clear persisted session");
        }
        self.auth.api().session().publish(SessionState::Anonymous);
        tracing::info!("session cleared");
    }
}

fn credentials(username: &str, password: &str) -> Result<Credentials, SessionError> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err(SessionError::MissingCredentials);
    }
    Ok(Credentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiClient;
    use crate::store::MemoryTokenStore;
    use httpmock::prelude::*;
    use reqwest::Client;
    use serde_json::json;

    fn session_for(server: &MockServer, store: MemoryTokenStore) -> SessionStore<MemoryTokenStore> {
        let base = format!("{}/api/v1", server.base_url())
            .parse()
            .expect("valid URL");
        let api = ApiClient::new(base, Client::new());
        SessionStore::open(api.auth(), store).expect("open")
    }

    #[tokio::test]
    async fn open_restores_persisted_token() {
        let server = MockServer::start_async().await;
        let session = session_for(&server, MemoryTokenStore::with_token("persisted"));
        assert_eq!(
            session.state(),
            SessionState::Authenticated {
                token: "persisted".into()
            }
        );
    }

    #[tokio::test]
    async fn login_publishes_to_subscribers() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/api/v1/auth");
            then.status(200).json_body(json!({"token": "fresh"}));
        });
        let session = session_for(&server, MemoryTokenStore::default());
        let mut updates = session.subscribe();

        session.login("operator", "secret").await.expect("login");

        assert!(updates.has_changed().expect("sender alive"));
        assert_eq!(updates.borrow_and_update().token(), Some("fresh"));
    }

    #[tokio::test]
    async fn rejected_login_keeps_anonymous() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/api/v1/auth");
            then.status(401);
        });
        let session = session_for(&server, MemoryTokenStore::default());

        let err = session.login("operator", "wrong").await.expect_err("refused");
        assert!(matches!(err, SessionError::InvalidCredentials));
        assert_eq!(session.state(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn empty_credentials_never_reach_backend() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.any_request();
            then.status(500);
        });
        let session = session_for(&server, MemoryTokenStore::default());

        assert!(matches!(
            session.login("  ", "secret").await,
            Err(SessionError::MissingCredentials)
        ));
        assert!(matches!(
            session.register("operator", "").await,
            Err(SessionError::MissingCredentials)
        ));
        mock.assert_calls(0);
    }

    #[tokio::test]
    async fn register_does_not_change_state() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/api/v1/registration");
            then.status(201);
        });
        let session = session_for(&server, MemoryTokenStore::default());

        session.register("operator", "secret").await.expect("register");
        assert_eq!(session.state(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn register_rejection_is_reported() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/api/v1/registration");
            then.status(409)
                .json_body(json!({"code": "USER_EXISTS", "message": "taken"}));
        });
        let session = session_for(&server, MemoryTokenStore::default());

        let err = session
            .register("operator", "secret")
            .await
            .expect_err("taken");
        match err {
            SessionError::RegistrationRejected(api) => {
                assert_eq!(api.info("Registration failed").code, "USER_EXISTS");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
