//! vg_config - Configuration for vmgrep
//!
//! This crate provides:
//! - TOML config file loading and discovery
//! - Defaults for every setting so a config file is optional
//! - Resolution of the snapshot directory and SSH username

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Cannot resolve home directory")]
    NoHomeDir,
}

/// Top-level vmgrep configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VmgrepConfig {
    /// Projects refreshed when `update` is run without an explicit target
    pub projects: Vec<String>,

    /// Username for generated SSH commands (defaults to $USER)
    pub ssh_user: Option<String>,

    /// Snapshot directory override (defaults to ~/.vmgrep)
    pub data_dir: Option<PathBuf>,

    /// Inventory tool binary
    pub gcloud_bin: String,

    /// Per-project fetch timeout in seconds
    pub fetch_timeout_secs: u64,
}

impl Default for VmgrepConfig {
    fn default() -> Self {
        Self {
            projects: vec![],
            ssh_user: None,
            data_dir: None,
            gcloud_bin: "gcloud".to_string(),
            fetch_timeout_secs: 120,
        }
    }
}

impl VmgrepConfig {
    /// Load configuration from a specific file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::ParseError {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Discover a config file from the standard search paths, falling back
    /// to defaults when none exists
    pub fn discover() -> Result<Self, ConfigError> {
        for path in Self::config_paths() {
            if path.exists() {
                return Self::load(&path);
            }
        }
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Config file search paths, in order of precedence
    pub fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("vmgrep.toml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("vmgrep").join("config.toml"));
        }
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".vmgrep.toml"));
        }
        paths
    }

    /// Resolve the snapshot directory: explicit override, else ~/.vmgrep
    pub fn data_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => {
                let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
                Ok(home.join(".vmgrep"))
            }
        }
    }

    /// Resolve the SSH username: config value, else $USER, else root
    pub fn ssh_user(&self) -> String {
        self.ssh_user
            .clone()
            .or_else(|| std::env::var("USER").ok())
            .unwrap_or_else(|| "root".to_string())
    }

    /// Serialize the current configuration as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Generate a commented default config file
    pub fn generate_default_toml() -> String {
        r#"# vmgrep configuration

# Projects refreshed by `vmgrep update` when no --project is given
projects = []

# Username used in generated SSH commands. Defaults to $USER.
# ssh_user = "ops"

# Snapshot directory. Defaults to ~/.vmgrep
# data_dir = "/var/cache/vmgrep"

# Inventory tool binary
gcloud_bin = "gcloud"

# Per-project fetch timeout in seconds
fetch_timeout_secs = 120
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = VmgrepConfig::default();
        assert!(config.projects.is_empty());
        assert_eq!(config.gcloud_bin, "gcloud");
        assert_eq!(config.fetch_timeout_secs, 120);
    }

    #[test]
    fn test_load_partial_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vmgrep.toml");
        std::fs::write(&path, "projects = [\"infra-prod\", \"infra-dev\"]\n").unwrap();

        let config = VmgrepConfig::load(&path).unwrap();
        assert_eq!(config.projects, vec!["infra-prod", "infra-dev"]);
        // Unspecified fields keep their defaults
        assert_eq!(config.gcloud_bin, "gcloud");
    }

    #[test]
    fn test_load_rejects_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vmgrep.toml");
        std::fs::write(&path, "projects = not-a-list").unwrap();

        let err = VmgrepConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_data_dir_override() {
        let config = VmgrepConfig {
            data_dir: Some(PathBuf::from("/tmp/vmgrep-test")),
            ..VmgrepConfig::default()
        };
        assert_eq!(config.data_dir().unwrap(), PathBuf::from("/tmp/vmgrep-test"));
    }

    #[test]
    fn test_generated_default_parses() {
        let config: VmgrepConfig = toml::from_str(&VmgrepConfig::generate_default_toml()).unwrap();
        assert_eq!(config, VmgrepConfig::default());
    }

    #[test]
    fn test_to_toml_round_trip() {
        let config = VmgrepConfig {
            projects: vec!["p1".to_string()],
            ssh_user: Some("ops".to_string()),
            ..VmgrepConfig::default()
        };
        let parsed: VmgrepConfig = toml::from_str(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }
}
