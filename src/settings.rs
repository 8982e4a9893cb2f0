//! Persisted client settings
//!
//! Currently a single preference: the base URL of the remote assistant
//! service. Loaded once at startup and rewritten on each change.

use crate::{ParleyError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

/// Default endpoint matching the bundled development server
pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub endpoint: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

impl Settings {
    /// Get the settings file path
    fn settings_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
                PathBuf::from(home).join(".config")
            })
            .join("parley");

        config_dir.join("settings.toml")
    }

    /// Load settings from disk, falling back to defaults
    pub fn load() -> Self {
        Self::load_from(&Self::settings_path())
    }

    /// Load settings from a specific file, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<Settings>(&content) {
                Ok(settings) => {
                    debug!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    warn!(
                        "Failed to parse settings file {}: {e}. Using defaults.",
                        path.display()
                    );
                    Self::default()
                }
            },
            Err(e) => {
                debug!(
                    "Settings file {} not found or unreadable: {e}. Using defaults.",
                    path.display()
                );
                Self::default()
            }
        }
    }

    /// Save settings to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::settings_path())
    }

    /// Save settings to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ParleyError::ConfigError(format!("Failed to serialize settings: {e}")))?;
        fs::write(path, content)?;

        debug!("Saved settings to {}", path.display());
        Ok(())
    }

    /// Update the endpoint and save to disk
    pub fn update_endpoint(&mut self, endpoint: impl Into<String>) {
        self.endpoint = endpoint.into();
        if let Err(e) = self.save() {
            error!("Failed to save settings after endpoint update: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoint() {
        let settings = Settings::default();
        assert_eq!(settings.endpoint, "http://localhost:5000");
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");

        let settings = Settings {
            endpoint: "http://example.com:8080".to_string(),
        };
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(&path);
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Settings::load_from(&dir.path().join("nope.toml"));
        assert_eq!(loaded, Settings::default());
    }

    #[test]
    fn test_corrupt_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "endpoint = [not valid toml").unwrap();

        let loaded = Settings::load_from(&path);
        assert_eq!(loaded, Settings::default());
    }
}
