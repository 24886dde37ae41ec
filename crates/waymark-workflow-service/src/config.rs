//! Service configuration storage
//!
//! Selects the workflow store and tunes the save pipeline and editing
//! sessions. Stored as camelCase JSON; environment variables win over
//! the file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::constants::{defaults, env};
use crate::error::{Result, WorkflowServiceError};

/// Where workflows are persisted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StoreConfig {
    /// Process memory; lost on exit
    #[default]
    Memory,
    /// One JSON record per workflow in a directory
    File { dir: PathBuf },
}

/// Full service configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfig {
    #[serde(default)]
    pub store: StoreConfig,
    /// Undo snapshots kept per editing session
    #[serde(default = "default_history_depth")]
    pub history_depth: usize,
    /// Treat validation warnings as blocking on save
    #[serde(default)]
    pub reject_on_warnings: bool,
}

fn default_history_depth() -> usize {
    defaults::HISTORY_DEPTH
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            history_depth: defaults::HISTORY_DEPTH,
            reject_on_warnings: defaults::REJECT_ON_WARNINGS,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from disk; a missing file yields the defaults
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("No config at {:?}, using defaults", path);
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        let config = serde_json::from_str(&contents)?;
        log::info!("Configuration loaded from {:?}", path);
        Ok(config)
    }

    /// Save configuration to disk
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents).await?;
        log::info!("Configuration saved to {:?}", path);
        Ok(())
    }

    /// Apply `WAYMARK_*` environment overrides
    pub fn apply_env(self) -> Result<Self> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup
    pub fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(dir) = lookup(env::STORE_DIR).filter(|d| !d.trim().is_empty()) {
            self.store = StoreConfig::File {
                dir: PathBuf::from(dir),
            };
        }

        if let Some(raw) = lookup(env::HISTORY_DEPTH) {
            self.history_depth = raw.trim().parse().map_err(|_| {
                WorkflowServiceError::Config(format!(
                    "{} must be a whole number, got '{}'",
                    env::HISTORY_DEPTH,
                    raw
                ))
            })?;
        }

        if let Some(raw) = lookup(env::REJECT_ON_WARNINGS) {
            self.reject_on_warnings = parse_flag(&raw).ok_or_else(|| {
                WorkflowServiceError::Config(format!(
                    "{} must be true or false, got '{}'",
                    env::REJECT_ON_WARNINGS,
                    raw
                ))
            })?;
        }

        Ok(self)
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn overrides(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[tokio::test]
    async fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = ServiceConfig::load(temp.path().join("absent.json"))
            .await
            .unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.history_depth, 100);
        assert!(!config.reject_on_warnings);
    }

    #[tokio::test]
    async fn test_unreadable_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let err = ServiceConfig::load(temp.path()).await.unwrap_err();
        assert!(matches!(err, WorkflowServiceError::Io(_)));
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join(defaults::CONFIG_FILE);
        let config = ServiceConfig {
            store: StoreConfig::File {
                dir: temp.path().join("workflows"),
            },
            history_depth: 25,
            reject_on_warnings: true,
        };

        config.save(&path).await.unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"historyDepth\": 25"));
        assert!(raw.contains("\"type\": \"file\""));

        assert_eq!(ServiceConfig::load(&path).await.unwrap(), config);
    }

    #[tokio::test]
    async fn test_partial_file_fills_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        std::fs::write(&path, r#"{"rejectOnWarnings": true}"#).unwrap();

        let config = ServiceConfig::load(&path).await.unwrap();
        assert!(config.reject_on_warnings);
        assert_eq!(config.store, StoreConfig::Memory);
        assert_eq!(config.history_depth, 100);
    }

    #[test]
    fn test_overrides() {
        let config = ServiceConfig::default()
            .apply_overrides(overrides(&[
                (env::STORE_DIR, "/var/lib/waymark"),
                (env::HISTORY_DEPTH, " 10 "),
                (env::REJECT_ON_WARNINGS, "yes"),
            ]))
            .unwrap();
        assert_eq!(
            config.store,
            StoreConfig::File {
                dir: PathBuf::from("/var/lib/waymark")
            }
        );
        assert_eq!(config.history_depth, 10);
        assert!(config.reject_on_warnings);
    }

    #[test]
    fn test_bad_overrides_are_config_errors() {
        let err = ServiceConfig::default()
            .apply_overrides(overrides(&[(env::HISTORY_DEPTH, "lots")]))
            .unwrap_err();
        assert!(matches!(err, WorkflowServiceError::Config(_)));

        let err = ServiceConfig::default()
            .apply_overrides(overrides(&[(env::REJECT_ON_WARNINGS, "maybe")]))
            .unwrap_err();
        assert!(err.to_string().contains(env::REJECT_ON_WARNINGS));
    }
}
