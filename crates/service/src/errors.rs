use thiserror::Error;

/// Generic text shown when neither the backend nor the failure carries a usable message.
pub const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred.";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("authentication rejected: {}", .0.as_deref().unwrap_or("no reason given"))]
    Auth(Option<String>),
    #[error("credential missing or rejected")]
    Unauthorized,
    #[error("validation error: {0}")]
    Validation(String),
    #[error("backend rejected request with status {status}: {}", .message.as_deref().unwrap_or("no reason given"))]
    Rejected { status: u16, message: Option<String> },
    #[error("network error: {0}")]
    Network(String),
    #[error("operation already in flight: {0}")]
    InFlight(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl ClientError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            ClientError::Auth(_) => 1001,
            ClientError::Unauthorized => 1002,
            ClientError::Validation(_) => 1003,
            ClientError::Rejected { .. } => 1004,
            ClientError::Network(_) => 1101,
            ClientError::InFlight(_) => 1102,
            ClientError::Storage(_) => 1200,
        }
    }

    /// Message supplied by the backend, if the failure came with one.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            ClientError::Auth(msg) | ClientError::Rejected { message: msg, .. } => msg.as_deref(),
            _ => None,
        }
    }

    /// Text for the user: the backend's message when present, otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        self.backend_message().unwrap_or(fallback).to_string()
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized)
    }
}

impl From<models::ModelError> for ClientError {
    fn from(e: models::ModelError) -> Self {
        match e {
            models::ModelError::Validation(msg) => ClientError::Validation(msg),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Network(e.to_string())
    }
}
