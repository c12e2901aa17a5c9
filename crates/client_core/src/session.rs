use std::sync::Arc;

use gateway::RemoteDataGateway;
use shared::{domain::Session, records::ProfileRecord};
use storage::LocalSessionStore;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

use crate::error::{ClientError, ValidationField};

/// Fixed namespace key for the persisted session record.
pub const SESSION_STORAGE_KEY: &str = "@comanda:session";

const USERS_COLLECTION: &str = "users";
const EVENT_BUFFER: usize = 16;

/// Authentication lifecycle of the running client.
///
/// `Idle` exists only between construction and the initial `restore`;
/// every sign-in attempt passes through `Authenticating` and ends in either
/// `Authenticated` or `Unauthenticated`, including on failure paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Authenticating,
    Authenticated(Session),
    Unauthenticated,
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    PhaseChanged(SessionPhase),
}

/// Owns authentication state, session persistence and the sign-in/out/reset
/// flows. Consumers hold an explicit reference; there is no ambient global.
pub struct SessionManager {
    gateway: Arc<dyn RemoteDataGateway>,
    store: Arc<dyn LocalSessionStore>,
    phase: Mutex<SessionPhase>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionManager {
    pub fn new(gateway: Arc<dyn RemoteDataGateway>, store: Arc<dyn LocalSessionStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            gateway,
            store,
            phase: Mutex::new(SessionPhase::Idle),
            events,
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn phase(&self) -> SessionPhase {
        self.phase.lock().await.clone()
    }

    pub async fn current_session(&self) -> Option<Session> {
        match &*self.phase.lock().await {
            SessionPhase::Authenticated(session) => Some(session.clone()),
            _ => None,
        }
    }

    pub async fn is_authenticating(&self) -> bool {
        matches!(*self.phase.lock().await, SessionPhase::Authenticating)
    }

    async fn set_phase(&self, phase: SessionPhase) {
        *self.phase.lock().await = phase.clone();
        let _ = self.events.send(SessionEvent::PhaseChanged(phase));
    }

    /// Rehydrates a persisted session at process start. A missing, unreadable
    /// or corrupt record all land in `Unauthenticated`; only sign-in failures
    /// are errors, never cold-start restoration.
    pub async fn restore(&self) -> Option<Session> {
        self.set_phase(SessionPhase::Authenticating).await;

        let stored = match self.store.get(SESSION_STORAGE_KEY).await {
            Ok(stored) => stored,
            Err(err) => {
                warn!("session store read failed during restore: {err}");
                None
            }
        };

        match stored.as_deref().map(serde_json::from_str::<Session>) {
            Some(Ok(session)) => {
                info!(user_id = %session.user_id, "session restored from local storage");
                self.set_phase(SessionPhase::Authenticated(session.clone()))
                    .await;
                Some(session)
            }
            Some(Err(err)) => {
                warn!("discarding corrupt persisted session record: {err}");
                self.set_phase(SessionPhase::Unauthenticated).await;
                None
            }
            None => {
                self.set_phase(SessionPhase::Unauthenticated).await;
                None
            }
        }
    }

    /// Authenticates against the gateway and merges the remote profile into a
    /// session. Empty or whitespace-only credentials fail before any network
    /// call. A missing profile is an authentication failure; an
    /// authentication success alone never creates a session.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        if email.trim().is_empty() || password.trim().is_empty() {
            return Err(ClientError::validation(ValidationField::Credentials));
        }

        self.set_phase(SessionPhase::Authenticating).await;
        let result = self.sign_in_inner(email, password).await;
        // The authenticating phase must clear on every exit path.
        match &result {
            Ok(session) => {
                self.set_phase(SessionPhase::Authenticated(session.clone()))
                    .await;
            }
            Err(_) => self.set_phase(SessionPhase::Unauthenticated).await,
        }
        result
    }

    async fn sign_in_inner(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        let identity = self
            .gateway
            .authenticate(email, password)
            .await
            .map_err(|err| {
                if err.is_credential_rejection() {
                    ClientError::InvalidCredentials
                } else {
                    ClientError::SignInFailed(err)
                }
            })?;

        let document = self
            .gateway
            .fetch_document(USERS_COLLECTION, &identity.user_id)
            .await
            .map_err(|err| {
                warn!(user_id = %identity.user_id, "profile fetch failed: {err}");
                ClientError::ProfileNotFound
            })?;
        let Some(document) = document else {
            warn!(user_id = %identity.user_id, "authenticated identity has no profile record");
            return Err(ClientError::ProfileNotFound);
        };

        let profile: ProfileRecord = serde_json::from_value(document.data).map_err(|err| {
            warn!(user_id = %identity.user_id, "malformed profile record: {err}");
            ClientError::ProfileNotFound
        })?;

        let session = profile.into_session(identity.user_id);
        let record = serde_json::to_string(&session)
            .map_err(|err| ClientError::Storage(err.to_string()))?;
        self.store
            .set(SESSION_STORAGE_KEY, &record)
            .await
            .map_err(|err| ClientError::Storage(err.to_string()))?;

        info!(user_id = %session.user_id, is_admin = session.is_admin, "signed in");
        Ok(session)
    }

    /// Ends the remote session (when one is active), removes the persisted
    /// record and transitions to `Unauthenticated`. Idempotent: calling it
    /// without an active session touches neither the gateway's auth surface
    /// nor errors out.
    pub async fn sign_out(&self) -> Result<(), ClientError> {
        let had_session = matches!(*self.phase.lock().await, SessionPhase::Authenticated(_));
        if had_session {
            // Local sign-out proceeds even if remote termination fails; a
            // dead session server-side is the backend's cleanup problem.
            if let Err(err) = self.gateway.end_session().await {
                warn!("remote session termination failed: {err}");
            }
        }

        self.store
            .remove(SESSION_STORAGE_KEY)
            .await
            .map_err(|err| ClientError::Storage(err.to_string()))?;
        self.set_phase(SessionPhase::Unauthenticated).await;
        Ok(())
    }

    /// Requests a credential-reset dispatch. Success and failure are both
    /// user-visible outcomes; neither changes session state.
    pub async fn forgot_password(&self, email: &str) -> Result<(), ClientError> {
        if email.trim().is_empty() {
            return Err(ClientError::validation(ValidationField::Email));
        }

        self.gateway
            .reset_credential(email)
            .await
            .map_err(ClientError::PasswordResetFailed)
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
