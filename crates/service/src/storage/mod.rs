//! Credential storage capability.
//!
//! The session controller only ever talks to a [`CredentialStore`]; the medium
//! behind it (process memory, a JSON file on disk) is chosen at construction.

pub mod file;
pub mod memory;

use async_trait::async_trait;
use models::Credential;

use crate::errors::ClientError;

pub use file::FileCredentialStore;
pub use memory::MemoryCredentialStore;

/// Holds at most one credential.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self) -> Result<Option<Credential>, ClientError>;
    /// Replaces any prior value.
    async fn set(&self, credential: Credential) -> Result<(), ClientError>;
    async fn clear(&self) -> Result<(), ClientError>;
}
