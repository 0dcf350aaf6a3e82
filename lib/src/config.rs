use crate::error::{Result, SyncError};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Where bookmarks live
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// SQLite file on this machine
    #[default]
    Local,
    /// Hosted backend over HTTP
    Remote,
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: Backend,

    /// Local database file; defaults to the data directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,

    /// How often `watch` re-reads the local database file
    pub local_poll_interval_ms: u64,

    pub remote: RemoteConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::Local,
            db_path: None,
            local_poll_interval_ms: 1000,
            remote: RemoteConfig::default(),
        }
    }
}

/// Hosted backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Project URL, e.g. https://xyz.supabase.co
    pub url: String,

    /// Public (anon) API key
    pub anon_key: String,

    pub table: String,

    /// How often the live feed polls for changes
    pub poll_interval_ms: u64,

    /// Consecutive poll failures before the feed reports itself dropped
    pub max_poll_failures: u32,

    pub timeout_secs: u64,

    /// Custom user-agent string for HTTP requests
    pub user_agent: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            table: "bookmarks".to_string(),
            poll_interval_ms: 2000,
            max_poll_failures: 3,
            timeout_secs: 10,
            user_agent: default_user_agent(),
        }
    }
}

fn default_user_agent() -> String {
    format!("marksync/{}", env!("CARGO_PKG_VERSION"))
}

impl RemoteConfig {
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(SyncError::Config(
                "Missing backend URL. Set remote.url or MARKSYNC_SUPABASE_URL".to_string(),
            ));
        }
        if self.anon_key.trim().is_empty() {
            return Err(SyncError::Config(
                "Missing API key. Set remote.anon_key or MARKSYNC_SUPABASE_ANON_KEY".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(SyncError::Config("remote.poll_interval_ms must be positive".to_string()));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from a file path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from default location (~/.config/marksync/config.yml)
    /// Falls back to default config if file doesn't exist or can't be read
    pub fn load() -> Self {
        let config_path = crate::utils::config_dir().join("config.yml");

        if config_path.exists() {
            match Self::load_from_path(&config_path) {
                Ok(config) => config,
                Err(e) => {
                    warn!("Failed to load config from {:?}: {}", config_path, e);
                    warn!("Using default configuration");
                    Self::default()
                }
            }
        } else {
            Self::default()
        }
    }

    /// Save configuration to a file path
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;
        Ok(())
    }

    /// Apply MARKSYNC_* environment overrides
    pub fn with_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, keyed by environment variable name
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("MARKSYNC_SUPABASE_URL") {
            self.remote.url = url;
        }
        if let Some(key) = lookup("MARKSYNC_SUPABASE_ANON_KEY") {
            self.remote.anon_key = key;
        }
        if let Some(db) = lookup("MARKSYNC_DB") {
            self.db_path = Some(PathBuf::from(db));
        }
        if let Some(backend) = lookup("MARKSYNC_BACKEND") {
            match backend.to_lowercase().as_str() {
                "local" => self.backend = Backend::Local,
                "remote" => self.backend = Backend::Remote,
                other => warn!("Ignoring unknown MARKSYNC_BACKEND '{}'", other),
            }
        }
        self
    }

    /// The local database file to use
    pub fn db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| crate::utils::data_dir().join("bookmarks.db"))
    }

    /// Where the signed-in session is kept
    pub fn session_path(&self) -> PathBuf {
        crate::utils::config_dir().join("session.yml")
    }
}
