use crate::constants::{
    CALENDAR_TIMEOUT_SECS, DEFAULT_MAIN_SITE, IMAGE_TIMEOUT_SECS, REDIRECT_TIMEOUT_SECS,
};
use crate::error::{ImportError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub main_site: MainSiteConfig,
    pub http: HttpConfig,
    pub storage: StorageConfig,
    pub hash_ids: HashIdConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MainSiteConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub calendar_timeout_secs: u64,
    pub image_timeout_secs: u64,
    pub redirect_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database_path: PathBuf,
    pub image_dir: PathBuf,
    pub cache_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HashIdConfig {
    pub salt: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub metrics_port: Option<u16>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            main_site: MainSiteConfig::default(),
            http: HttpConfig::default(),
            storage: StorageConfig::default(),
            hash_ids: HashIdConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Default for MainSiteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_MAIN_SITE.to_string(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            calendar_timeout_secs: CALENDAR_TIMEOUT_SECS,
            image_timeout_secs: IMAGE_TIMEOUT_SECS,
            redirect_timeout_secs: REDIRECT_TIMEOUT_SECS,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("data/carpool.db"),
            image_dir: PathBuf::from("storage/images"),
            cache_dir: PathBuf::from("storage/cache"),
        }
    }
}

impl Default for HashIdConfig {
    fn default() -> Self {
        Self {
            salt: "retreat-carpool".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            metrics_port: None,
        }
    }
}

impl HttpConfig {
    pub fn calendar_timeout(&self) -> Duration {
        Duration::from_secs(self.calendar_timeout_secs)
    }

    pub fn image_timeout(&self) -> Duration {
        Duration::from_secs(self.image_timeout_secs)
    }

    pub fn redirect_timeout(&self) -> Duration {
        Duration::from_secs(self.redirect_timeout_secs)
    }
}

impl Config {
    /// Load configuration from `path` when it exists, then apply
    /// `CARPOOL_*` environment overrides. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                ImportError::Config(format!(
                    "Failed to read config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
            Self::from_toml(&content)?
        } else {
            Self::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ImportError::Config(e.to_string()))
    }

    fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("CARPOOL_MAIN_SITE") {
            self.main_site.base_url = v;
        }
        if let Some(v) = lookup("CARPOOL_DATABASE_PATH") {
            self.storage.database_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("CARPOOL_IMAGE_DIR") {
            self.storage.image_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("CARPOOL_CACHE_DIR") {
            self.storage.cache_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("CARPOOL_HASH_SALT") {
            self.hash_ids.salt = v;
        }
        if let Some(v) = lookup("CARPOOL_PORT") {
            self.server.port = parse_port("CARPOOL_PORT", &v)?;
        }
        if let Some(v) = lookup("CARPOOL_METRICS_PORT") {
            self.server.metrics_port = Some(parse_port("CARPOOL_METRICS_PORT", &v)?);
        }
        Ok(())
    }
}

fn parse_port(key: &str, value: &str) -> Result<u16> {
    value
        .trim()
        .parse()
        .map_err(|_| ImportError::Config(format!("{key} must be a port number, got '{value}'")))
}
