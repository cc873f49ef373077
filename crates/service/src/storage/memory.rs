use async_trait::async_trait;
use models::Credential;
use tokio::sync::RwLock;

use super::CredentialStore;
use crate::errors::ClientError;

/// Process-lifetime credential store.
#[derive(Default)]
pub struct MemoryCredentialStore {
    inner: RwLock<Option<Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: Credential) -> Self {
        Self { inner: RwLock::new(Some(credential)) }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self) -> Result<Option<Credential>, ClientError> {
        Ok(self.inner.read().await.clone())
    }

    async fn set(&self, credential: Credential) -> Result<(), ClientError> {
        *self.inner.write().await = Some(credential);
        Ok(())
    }

    async fn clear(&self) -> Result<(), ClientError> {
        self.inner.write().await.take();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_replaces_and_clear_removes() -> Result<(), anyhow::Error> {
        let store = MemoryCredentialStore::new();
        assert_eq!(store.get().await?, None);

        store.set(Credential::new("first")).await?;
        store.set(Credential::new("second")).await?;
        assert_eq!(store.get().await?, Some(Credential::new("second")));

        store.clear().await?;
        assert_eq!(store.get().await?, None);
        Ok(())
    }
}
