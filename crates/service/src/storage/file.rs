use std::{collections::HashMap, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use models::Credential;
use tokio::{fs, sync::RwLock};
use tracing::warn;

use super::CredentialStore;
use crate::errors::ClientError;

/// Key the credential is persisted under.
pub const TOKEN_KEY: &str = "token";

/// JSON file-backed credential store.
///
/// The file holds a small string map; only [`TOKEN_KEY`] is ever written, so the
/// persisted state is exactly one credential string or nothing.
#[derive(Clone)]
pub struct FileCredentialStore {
    inner: Arc<RwLock<HashMap<String, String>>>,
    file_path: PathBuf,
}

impl FileCredentialStore {
    /// Open the store at `path`, creating the file (and parent directory) if missing.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ClientError> {
        let file_path = path.into();
        common::env::ensure_parent_dir(&file_path)
            .await
            .map_err(|e| ClientError::Storage(e.to_string()))?;

        let map: HashMap<String, String> = match fs::read(&file_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!(path = %file_path.display(), error = %e, "unreadable session file; starting empty");
                HashMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let empty: HashMap<String, String> = HashMap::new();
                write_map(&file_path, &empty).await?;
                empty
            }
            Err(e) => {
                return Err(ClientError::Storage(format!("reading {}: {e}", file_path.display())));
            }
        };

        Ok(Arc::new(Self { inner: Arc::new(RwLock::new(map)), file_path }))
    }

    pub fn path(&self) -> &std::path::Path {
        &self.file_path
    }

    async fn save(&self) -> Result<(), ClientError> {
        let map = self.inner.read().await;
        write_map(&self.file_path, &map).await
    }
}

async fn write_map(path: &std::path::Path, map: &HashMap<String, String>) -> Result<(), ClientError> {
    let data = serde_json::to_vec(map).map_err(|e| ClientError::Storage(e.to_string()))?;
    fs::write(path, data).await.map_err(|e| ClientError::Storage(e.to_string()))
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn get(&self) -> Result<Option<Credential>, ClientError> {
        let map = self.inner.read().await;
        Ok(map.get(TOKEN_KEY).filter(|t| !t.is_empty()).cloned().map(Credential::new))
    }

    async fn set(&self, credential: Credential) -> Result<(), ClientError> {
        let mut map = self.inner.write().await;
        map.insert(TOKEN_KEY.to_string(), credential.token().to_string());
        drop(map);
        self.save().await
    }

    async fn clear(&self) -> Result<(), ClientError> {
        let mut map = self.inner.write().await;
        let existed = map.remove(TOKEN_KEY).is_some();
        drop(map);
        if existed {
            self.save().await?;
        }
        Ok(())
    }
}
