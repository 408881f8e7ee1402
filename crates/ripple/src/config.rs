//! Configuration for ripple.
//!
//! Loaded from a YAML file such as:
//!
//! ```yaml
//! store:
//!   backend: jsonl
//!   state-dir: .ripple/graphs
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Default directory for graph snapshots, relative to the workspace root
pub const DEFAULT_STATE_DIR: &str = ".ripple/graphs";

/// Conventional name of the configuration file
pub const CONFIG_FILE_NAME: &str = "ripple.yaml";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RippleConfig {
    /// Snapshot store configuration
    #[serde(default)]
    pub store: StoreConfig,
}

/// Snapshot store configuration section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct StoreConfig {
    /// Where snapshots are kept
    #[serde(default)]
    pub backend: StoreBackend,

    /// Snapshot directory for the JSONL backend
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
}

/// Snapshot backend type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoreBackend {
    /// One JSONL file per project
    #[default]
    Jsonl,
    /// Process memory only; nothing survives a restart
    Memory,
}

fn default_state_dir() -> PathBuf {
    PathBuf::from(DEFAULT_STATE_DIR)
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            state_dir: default_state_dir(),
        }
    }
}

impl RippleConfig {
    /// Load configuration from a file
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, or
    /// [`Error::Config`] if it is not valid configuration YAML.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        serde_yaml::from_str(&content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Save configuration to a file
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if serialization fails, or [`Error::Io`]
    /// if the file cannot be written.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::Config(format!("YAML error: {e}")))?;
        fs::write(path, content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let config = RippleConfig {
            store: StoreConfig {
                backend: StoreBackend::Memory,
                state_dir: PathBuf::from("state"),
            },
        };

        config.save(&path).await.unwrap();
        let loaded = RippleConfig::load(&path).await.unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: RippleConfig = serde_yaml::from_str("store:\n  backend: memory\n").unwrap();
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.store.state_dir, PathBuf::from(DEFAULT_STATE_DIR));

        let empty: RippleConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(empty, RippleConfig::default());
    }

    #[test]
    fn keys_are_kebab_case() {
        let yaml = serde_yaml::to_string(&RippleConfig::default()).unwrap();
        assert!(yaml.contains("state-dir: .ripple/graphs"));
        assert!(yaml.contains("backend: jsonl"));
    }

    #[tokio::test]
    async fn unknown_backend_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        tokio::fs::write(&path, "store:\n  backend: postgres\n")
            .await
            .unwrap();

        assert!(matches!(
            RippleConfig::load(&path).await,
            Err(Error::Config(_))
        ));
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();

        assert!(matches!(
            RippleConfig::load(&dir.path().join(CONFIG_FILE_NAME)).await,
            Err(Error::Io(_))
        ));
    }
}
