use std::path::PathBuf;

use anyhow::{anyhow, Result};
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";
pub const DEV_JWT_SECRET: &str = "dev-secret-change-me";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the client sends its requests.
///
/// An empty `base_url` is filled during normalization: `TASKS_API_URL` first, then [`DEFAULT_BASE_URL`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub base_url: String,
    /// No timeout unless set; requests otherwise resolve on the network stack's timing.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    File,
    Memory,
}

/// Credential persistence.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub store: StoreKind,
    #[serde(default = "default_session_path")]
    pub path: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { store: StoreKind::File, path: default_session_path() }
    }
}

fn default_session_path() -> PathBuf { PathBuf::from("data/session.json") }

/// Reference backend settings. Empty `host` and `jwt_secret` are filled from the environment.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl_hours: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: String::new(), port: 8080, jwt_secret: String::new(), token_ttl_hours: 24 }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub json: bool,
}

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Like [`AppConfig::load_and_validate`], but a missing config file yields the defaults.
    pub fn load_or_default() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(e) if is_not_found(&e) => AppConfig::default(),
            Err(e) => return Err(e),
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.normalize_with(|key| std::env::var(key).ok())
    }

    /// Normalization with an injectable environment lookup.
    pub fn normalize_with<F>(&mut self, env: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.backend.normalize(&env);
        self.backend.validate()?;
        self.session.validate()?;
        self.server.normalize(&env)?;
        Ok(())
    }
}

fn is_not_found(e: &anyhow::Error) -> bool {
    e.downcast_ref::<std::io::Error>()
        .is_some_and(|io| io.kind() == std::io::ErrorKind::NotFound)
}

impl BackendConfig {
    fn normalize<F: Fn(&str) -> Option<String>>(&mut self, env: &F) {
        if self.base_url.trim().is_empty() {
            self.base_url = env("TASKS_API_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        }
        self.base_url = self.base_url.trim().trim_end_matches('/').to_string();
        if self.request_timeout_secs == Some(0) {
            self.request_timeout_secs = None;
        }
    }

    pub fn validate(&self) -> Result<()> {
        let lower = self.base_url.to_lowercase();
        if !(lower.starts_with("http://") || lower.starts_with("https://")) {
            return Err(anyhow!("backend.base_url must start with http:// or https://"));
        }
        Ok(())
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.store == StoreKind::File && self.path.as_os_str().is_empty() {
            return Err(anyhow!("session.path is required for the file store"));
        }
        Ok(())
    }
}

impl ServerConfig {
    fn normalize<F: Fn(&str) -> Option<String>>(&mut self, env: &F) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = env("SERVER_HOST").unwrap_or_else(|| DEFAULT_SERVER_HOST.to_string());
        }
        if let Some(port) = env("SERVER_PORT").and_then(|p| p.parse::<u16>().ok()) {
            self.port = port;
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        if self.jwt_secret.trim().is_empty() {
            self.jwt_secret = env("JWT_SECRET").unwrap_or_else(|| DEV_JWT_SECRET.to_string());
        }
        if self.token_ttl_hours == 0 {
            return Err(anyhow!("server.token_ttl_hours must be >= 1"));
        }
        Ok(())
    }
}
