use std::sync::RwLock;

use edumed_api::{LoginRequest, Profile, RefreshRequest, RegisterRequest, User};
use tokio::sync::{Mutex, broadcast};

use crate::api::EdumedApi;
use crate::error::{Error, Result};
use crate::store::{StoredTokens, TokenStore};

/// Logical login state of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
    Refreshing,
}

/// Broadcast on every login-state change so other views can resynchronize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn,
    LoggedOut,
}

/// The process-wide session context: token store, login state and the
/// refresh-on-401 path, with subscribe/notify semantics for state changes.
///
/// A stored token is optimistically treated as a live session until the
/// first protected call proves otherwise. Concurrent 401s coalesce on a
/// single refresh exchange; a failed exchange clears the store and demands
/// a fresh login.
pub struct Session<A, S> {
    api: A,
    store: S,
    state: RwLock<SessionState>,
    refresh_gate: Mutex<()>,
    events: broadcast::Sender<SessionEvent>,
}

impl<A: EdumedApi, S: TokenStore> Session<A, S> {
    pub fn new(api: A, store: S) -> Self {
        let initial = if store.access_token().is_some() {
            SessionState::Authenticated
        } else {
            SessionState::Unauthenticated
        };
        let (events, _) = broadcast::channel(16);
        Self {
            api,
            store,
            state: RwLock::new(initial),
            refresh_gate: Mutex::new(()),
            events,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn state(&self) -> SessionState {
        self.state
            .read()
            .map(|state| *state)
            .unwrap_or(SessionState::Unauthenticated)
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() != SessionState::Unauthenticated
    }

    /// Subscribe to login-state changes.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Exchange credentials for a token pair and persist it.
    pub async fn login(&self, email: &str, password: &str) -> Result<()> {
        let pair = self
            .api
            .login(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;

        self.store
            .save(&StoredTokens::pair(pair.access, pair.refresh))?;
        self.set_state(SessionState::Authenticated);
        let _ = self.events.send(SessionEvent::LoggedIn);
        tracing::info!(email, "Logged in");
        Ok(())
    }

    /// Create an account. Issues no tokens; follow up with [`Session::login`].
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<User> {
        self.api
            .register(&RegisterRequest {
                username: username.to_string(),
                email: email.to_string(),
                password: password.to_string(),
            })
            .await
    }

    /// Drop the session: clear the store and notify subscribers.
    pub fn logout(&self) {
        if let Err(err) = self.store.clear() {
            tracing::warn!(error = %err, "Failed to clear token store");
        }
        self.set_state(SessionState::Unauthenticated);
        let _ = self.events.send(SessionEvent::LoggedOut);
    }

    /// The view-mount check: fetch the profile through the refresh path.
    pub async fn verify(&self) -> Result<Profile> {
        self.profile().await
    }

    /// Fetch the caller's profile, refreshing on 401.
    pub async fn profile(&self) -> Result<Profile> {
        self.with_auth(|token| async move { self.api.my_profile(&token).await })
            .await
    }

    /// Run a protected call with the stored access token. On a 401 the
    /// refresh path runs once and the call is retried once with the new
    /// token; any further 401 is returned as-is.
    pub async fn with_auth<T, F, Fut>(&self, call: F) -> Result<T>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let token = self.store.access_token().ok_or(Error::Unauthenticated)?;

        match call(token.clone()).await {
            Err(err) if err.is_unauthorized() => {
                tracing::debug!("Got 401, entering refresh path");
                let fresh = self.refresh_access_token(&token).await?;
                call(fresh).await
            }
            other => other,
        }
    }

    /// One coalesced refresh exchange. Callers that queued behind an
    /// in-flight exchange reuse its result instead of spending their own.
    async fn refresh_access_token(&self, stale: &str) -> Result<String> {
        self.set_state(SessionState::Refreshing);
        let _gate = self.refresh_gate.lock().await;

        // While we waited on the gate another caller may have finished the
        // exchange (the token changed) or given up (the session died).
        if self.state() == SessionState::Unauthenticated {
            return Err(Error::SessionExpired);
        }
        if let Some(current) = self.store.access_token()
            && current != stale
        {
            self.set_state(SessionState::Authenticated);
            return Ok(current);
        }

        let Some(refresh) = self.store.load().ok().and_then(|tokens| tokens.refresh) else {
            tracing::warn!("No refresh token available, logging out");
            self.logout();
            return Err(Error::SessionExpired);
        };

        match self.api.refresh(&RefreshRequest { refresh }).await {
            Ok(token) => {
                self.store.set_access(&token.access)?;
                self.set_state(SessionState::Authenticated);
                tracing::info!("Access token refreshed");
                Ok(token.access)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Token refresh failed, logging out");
                self.logout();
                Err(Error::SessionExpired)
            }
        }
    }

    fn set_state(&self, next: SessionState) {
        if let Ok(mut state) = self.state.write() {
            *state = next;
        }
    }
}
