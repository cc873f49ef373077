//! Auth form controller: mediates between entered credentials and the backend,
//! honouring the selected [`AuthIntent`].

use std::sync::Arc;

use models::AuthIntent;
use tracing::{info, warn};

use crate::api::TaskBackend;
use crate::errors::{ClientError, GENERIC_ERROR_MESSAGE};
use crate::session::SessionController;

pub const REGISTERED_NOTICE: &str = "Registration successful! Please log in.";

/// What the rendering surface should do after a successful submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Logged in; show the task view.
    ProceedToTasks,
    /// Registered; the form switched to login. No session was established.
    SwitchToLogin { notice: &'static str },
}

pub struct AuthFormController<B> {
    backend: Arc<B>,
    session: Arc<SessionController>,
    intent: AuthIntent,
    error: Option<String>,
}

impl<B: TaskBackend> AuthFormController<B> {
    pub fn new(backend: Arc<B>, session: Arc<SessionController>) -> Self {
        Self { backend, session, intent: AuthIntent::default(), error: None }
    }

    pub fn intent(&self) -> AuthIntent {
        self.intent
    }

    pub fn set_intent(&mut self, intent: AuthIntent) {
        self.intent = intent;
    }

    pub fn toggle_intent(&mut self) -> AuthIntent {
        self.intent = self.intent.toggled();
        self.intent
    }

    /// Message from the last failed submit.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Submit with the intent currently selected on the form.
    pub async fn submit_current(&mut self, email: &str, password: &str) -> Result<AuthOutcome, ClientError> {
        let intent = self.intent;
        self.submit(intent, email, password).await
    }

    /// Login stores the returned credential; register never does.
    pub async fn submit(&mut self, intent: AuthIntent, email: &str, password: &str) -> Result<AuthOutcome, ClientError> {
        self.error = None;
        match self.try_submit(intent, email, password).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                let message = e.user_message(GENERIC_ERROR_MESSAGE);
                warn!(?intent, code = e.code(), error = %e, "auth_submit_failed");
                self.error = Some(message);
                Err(e)
            }
        }
    }

    async fn try_submit(&mut self, intent: AuthIntent, email: &str, password: &str) -> Result<AuthOutcome, ClientError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(ClientError::Validation("email and password are required".into()));
        }
        match intent {
            AuthIntent::Login => {
                let credential = self.backend.login(email, password).await?;
                self.session.set_credential(credential).await?;
                info!(email, "session_started");
                Ok(AuthOutcome::ProceedToTasks)
            }
            AuthIntent::Register => {
                self.backend.register(email, password).await?;
                self.intent = AuthIntent::Login;
                info!(email, "account_registered");
                Ok(AuthOutcome::SwitchToLogin { notice: REGISTERED_NOTICE })
            }
        }
    }
}
