//! Engine configuration
//!
//! Loaded from a YAML file; every field has a default so partial files work.
//!
//! ```yaml
//! predecessor_field: prev
//! aliases_field: aliases
//! created_field: created
//! extensions: [md]
//! event_capacity: 64
//! queue_capacity: 256
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Configuration shared by the vault store, the service and the CLI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Front matter key holding the predecessor declaration
    pub predecessor_field: String,
    /// Front matter key holding the alias list
    pub aliases_field: String,
    /// Front matter key overriding the filesystem creation time
    pub created_field: String,
    /// File extensions treated as documents (without the dot)
    pub extensions: Vec<String>,
    /// Buffer size of the change notification broadcast
    pub event_capacity: usize,
    /// Buffer size of the notification queue
    pub queue_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            predecessor_field: "prev".to_string(),
            aliases_field: "aliases".to_string(),
            created_field: "created".to_string(),
            extensions: vec!["md".to_string()],
            event_capacity: 64,
            queue_capacity: 256,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse configuration from YAML text; an empty document yields defaults
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    /// Load `path` if given, else the user config file if present, else defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    /// `<config dir>/chainweave/config.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("chainweave").join("config.yaml"))
    }

    /// Whether a file name has one of the configured document extensions
    pub fn is_document(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = EngineConfig::from_yaml("predecessor_field: parent\n").unwrap();
        assert_eq!(config.predecessor_field, "parent");
        assert_eq!(config.aliases_field, "aliases");
        assert_eq!(config.extensions, vec!["md".to_string()]);
    }

    #[test]
    fn empty_yaml_is_default() {
        assert_eq!(EngineConfig::from_yaml("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn load_reports_path_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "extensions: 7\n").unwrap();

        let err = EngineConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
        assert!(err.to_string().contains("config.yaml"));
    }

    #[test]
    fn explicit_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.yaml");
        std::fs::write(&path, "extensions: [md, markdown]\n").unwrap();

        let config = EngineConfig::load_or_default(Some(&path)).unwrap();
        assert!(config.is_document(Path::new("notes/a.markdown")));
        assert!(config.is_document(Path::new("a.MD")));
        assert!(!config.is_document(Path::new("a.txt")));
    }
}
