//! Session controller: the single source of truth for "is the user authenticated".
//!
//! `Anonymous` → (login success) → `Authenticated` → (logout | unauthorized response) → `Anonymous`.

use std::sync::Arc;

use models::Credential;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::errors::ClientError;
use crate::storage::CredentialStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated,
}

pub struct SessionController {
    store: Arc<dyn CredentialStore>,
    state: watch::Sender<SessionState>,
}

impl SessionController {
    /// Build a controller over `store`. A credential already held by the store
    /// (persisted by an earlier run) starts the session authenticated.
    pub async fn new(store: Arc<dyn CredentialStore>) -> Result<Arc<Self>, ClientError> {
        let initial = match store.get().await? {
            Some(_) => SessionState::Authenticated,
            None => SessionState::Anonymous,
        };
        debug!(state = ?initial, "session restored");
        let (state, _) = watch::channel(initial);
        Ok(Arc::new(Self { store, state }))
    }

    /// Stores the credential, replacing any prior value.
    pub async fn set_credential(&self, credential: Credential) -> Result<(), ClientError> {
        self.store.set(credential).await?;
        self.transition(SessionState::Authenticated);
        Ok(())
    }

    pub async fn current_credential(&self) -> Result<Option<Credential>, ClientError> {
        self.store.get().await
    }

    pub async fn clear_credential(&self) -> Result<(), ClientError> {
        self.store.clear().await?;
        self.transition(SessionState::Anonymous);
        Ok(())
    }

    /// Explicit user logout.
    pub async fn logout(&self) -> Result<(), ClientError> {
        self.clear_credential().await?;
        info!("session_logout");
        Ok(())
    }

    /// The only automatic invalidation path: called by whoever observed an
    /// unauthorized response. Ends in `Anonymous` even if the store fails to clear.
    pub async fn invalidate(&self) {
        warn!("credential rejected by backend; ending session");
        if let Err(e) = self.store.clear().await {
            warn!(error = %e, "failed to clear stored credential");
        }
        self.transition(SessionState::Anonymous);
    }

    /// Gate for protected views: the credential, or `Unauthorized` without any request.
    pub async fn require_authenticated(&self) -> Result<Credential, ClientError> {
        match self.store.get().await? {
            Some(credential) => Ok(credential),
            None => {
                self.transition(SessionState::Anonymous);
                Err(ClientError::Unauthorized)
            }
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() == SessionState::Authenticated
    }

    /// Observe state transitions (e.g. to send the user back to the login screen).
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    fn transition(&self, next: SessionState) {
        self.state.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            debug!(from = ?*current, to = ?next, "session_transition");
            *current = next;
            true
        });
    }
}
