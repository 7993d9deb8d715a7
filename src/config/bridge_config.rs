//! jirabridge configuration file handling
//!
//! Loads and manages the ~/.config/jirabridge/config.yaml file describing the
//! two trackers, the webhook listener and the mapping database.

use super::tracker_endpoint::TrackerEndpoint;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Webhook listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the webhook server binds to
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Request body size limit in bytes
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

fn default_bind() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_max_body_size() -> usize {
    10 * 1024 * 1024 // 10MB
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_size: default_max_body_size(),
        }
    }
}

/// Mapping database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite mapping database
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

fn default_db_path() -> PathBuf {
    // Always use ~/.config for consistency across platforms (macOS, Linux)
    let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(".config");
    path.push("jirabridge");
    path.push("mappings.db");
    path
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    20
}

/// jirabridge configuration
///
/// Represents the complete config.yaml: the two tracker endpoints (fixed for the
/// lifetime of the process), the listener and the mapping store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Tracker A
    pub tracker_a: TrackerEndpoint,

    /// Tracker B
    pub tracker_b: TrackerEndpoint,

    /// Webhook listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Mapping store settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Timeout applied to every outbound tracker call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl BridgeConfig {
    /// Create a configuration for the two given trackers with default settings
    pub fn new(tracker_a: TrackerEndpoint, tracker_b: TrackerEndpoint) -> Self {
        Self {
            tracker_a,
            tracker_b,
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }

    /// Starter configuration written by `jirabridge init`
    pub fn sample() -> Self {
        Self::new(
            TrackerEndpoint::new("A", "http://jira-a.example.com:8081", "$JIRA_A_TOKEN", "TEST"),
            TrackerEndpoint::new("B", "http://jira-b.example.com:8081", "$JIRA_B_TOKEN", "TEST"),
        )
    }

    /// Load configuration from the default path (~/.config/jirabridge/config.yaml)
    pub fn load_default() -> Result<Self> {
        let path = Self::default_path();
        Self::load(&path)
    }

    /// Load configuration from a specific path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(crate::BridgeError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        tracing::info!(path = %path.display(), "Loading jirabridge configuration");

        let content = fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;

        tracing::debug!(
            tracker_a = %config.tracker_a.base_url(),
            tracker_b = %config.tracker_b.base_url(),
            bind = %config.server.bind,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        tracing::info!(path = %path.display(), "Saving jirabridge configuration");

        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;

        Ok(())
    }

    /// Get the default config path (~/.config/jirabridge/config.yaml)
    pub fn default_path() -> PathBuf {
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".config");
        path.push("jirabridge");
        path.push("config.yaml");
        path
    }

    /// Per-call timeout for outbound requests
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
