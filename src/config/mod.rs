//! Configuration loading and management
//!
//! Settings come from three layers, later ones winning:
//!
//! 1. built-in defaults
//! 2. an optional YAML file named by `CONFIG_FILE`
//! 3. environment variables (after `.env` has been loaded by the binary)

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_MONGODB_URI: &str = "mongodb://localhost:27017/spiceCentral";
pub const DEFAULT_MEDIA_FOLDER: &str = "spice-central";

/// Deployment environment. Only `development` turns the keep-alive off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Environment::Development,
            _ => Environment::Production,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Mongodb,
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mongodb" | "mongo" => Ok(StorageBackend::Mongodb),
            "memory" | "in-memory" | "in_memory" => Ok(StorageBackend::Memory),
            other => Err(anyhow!("unknown storage backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub backend: StorageBackend,
    pub uri: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            uri: DEFAULT_MONGODB_URI.to_string(),
        }
    }
}

fn default_media_folder() -> String {
    DEFAULT_MEDIA_FOLDER.to_string()
}

/// Media host credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    #[serde(default = "default_media_folder")]
    pub folder: String,
}

impl MediaConfig {
    /// Parse the `cloudinary://<key>:<secret>@<cloud>` form
    pub fn from_url(url: &str) -> Result<Self> {
        let rest = url
            .trim()
            .strip_prefix("cloudinary://")
            .ok_or_else(|| anyhow!("media URL must start with cloudinary://"))?;
        let (credentials, cloud_name) = rest
            .rsplit_once('@')
            .ok_or_else(|| anyhow!("media URL is missing the cloud name"))?;
        let (api_key, api_secret) = credentials
            .split_once(':')
            .ok_or_else(|| anyhow!("media URL is missing the API secret"))?;
        let cloud_name = cloud_name.trim_end_matches('/');

        if api_key.is_empty() || api_secret.is_empty() || cloud_name.is_empty() {
            bail!("media URL has an empty component");
        }

        Ok(Self {
            cloud_name: cloud_name.to_string(),
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
            folder: default_media_folder(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeepAliveConfig {
    /// Base URL of this deployment; `/health` is appended
    pub url: Option<String>,
    pub interval_secs: u64,
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        Self {
            url: None,
            interval_secs: 14 * 60,
        }
    }
}

impl KeepAliveConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

/// Complete process configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub uploads_dir: String,
    pub media: Option<MediaConfig>,
    pub keep_alive: KeepAliveConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            uploads_dir: "uploads".to_string(),
            media: None,
            keep_alive: KeepAliveConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from `CONFIG_FILE` (if set) and the process environment
    pub fn load() -> Result<Self> {
        let base = match std::env::var("CONFIG_FILE") {
            Ok(path) if !path.trim().is_empty() => Self::from_yaml_file(&path)?,
            _ => Self::default(),
        };
        base.with_env(|key| std::env::var(key).ok())
    }

    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path))?;
        Self::from_yaml_str(&content).with_context(|| format!("parsing config file {}", path))
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Apply environment overrides. `lookup` returns the raw variable value.
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(env) = var("APP_ENV").or_else(|| var("NODE_ENV")) {
            self.environment = Environment::from_label(&env);
        }

        if let Some(host) = var("HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("PORT must be a port number, got '{}'", port))?;
        }

        if let Some(backend) = var("STORAGE_BACKEND") {
            self.database.backend = backend.parse()?;
        }
        if let Some(uri) = var("MONGODB_URI") {
            self.database.uri = uri;
        }

        if let Some(dir) = var("UPLOADS_DIR") {
            self.uploads_dir = dir;
        }

        match (
            var("CLOUDINARY_CLOUD_NAME"),
            var("CLOUDINARY_API_KEY"),
            var("CLOUDINARY_API_SECRET"),
        ) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => {
                self.media = Some(MediaConfig {
                    cloud_name,
                    api_key,
                    api_secret,
                    folder: default_media_folder(),
                });
            }
            _ => {
                if let Some(url) = var("CLOUDINARY_URL") {
                    self.media = Some(MediaConfig::from_url(&url)?);
                }
            }
        }
        if let (Some(folder), Some(media)) = (var("CLOUDINARY_FOLDER"), self.media.as_mut()) {
            media.folder = folder;
        }

        if let Some(url) = var("SELF_PING_URL").or_else(|| var("RENDER_EXTERNAL_URL")) {
            self.keep_alive.url = Some(url);
        }
        if let Some(secs) = var("SELF_PING_INTERVAL_SECS") {
            self.keep_alive.interval_secs = secs.trim().parse().with_context(|| {
                format!("SELF_PING_INTERVAL_SECS must be a number, got '{}'", secs)
            })?;
        }

        Ok(self)
    }

    /// Socket address to bind
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .with_context(|| {
                format!(
                    "invalid bind address {}:{}",
                    self.server.host, self.server.port
                )
            })
    }

    /// Keep-alive target, when the environment and settings call for one
    pub fn keep_alive_target(&self) -> Option<&str> {
        if self.environment == Environment::Development {
            return None;
        }
        self.keep_alive.url.as_deref()
    }
}
