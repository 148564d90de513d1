//! Configuration - layered YAML settings
//!
//! Layers, lowest precedence first:
//! 1. built-in defaults
//! 2. user config (`$DLMS_CONFIG`, or `<config dir>/dlms/config.yaml`)
//! 3. data directory config (`<data_dir>/dlms.yaml`)
//!
//! Environment variables and command-line flags are applied on top by the CLI.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::workflow::WorkflowConfig;

/// Environment variable overriding the user config file location
pub const CONFIG_ENV: &str = "DLMS_CONFIG";

/// Name of the per-data-directory config file
pub const DATA_DIR_CONFIG: &str = "dlms.yaml";

/// Data directory used when nothing else is configured
pub const DEFAULT_DATA_DIR: &str = "dlms-data";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config in {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the CSV tables
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Operator used when `--user` is not given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_user: Option<String>,

    pub workflow: WorkflowConfig,
}

impl Config {
    /// Load the user layer and the data directory layer
    ///
    /// `data_dir` (from flag or environment) wins over any `data_dir` set in
    /// the user config.
    pub fn load(data_dir: Option<&Path>) -> Result<Self, ConfigError> {
        let user_layer = match Self::user_config_path() {
            Some(path) => read_layer(&path)?,
            None => None,
        };
        Self::load_layers(user_layer, data_dir)
    }

    fn load_layers(
        user_layer: Option<serde_yml::Value>,
        data_dir: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let mut merged = serde_yml::Value::Mapping(serde_yml::Mapping::new());
        if let Some(layer) = user_layer {
            merge(&mut merged, layer);
        }

        let partial: Config = from_value(&merged, Path::new("<user config>"))?;
        let resolved_dir = data_dir
            .map(Path::to_path_buf)
            .or(partial.data_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let data_config = resolved_dir.join(DATA_DIR_CONFIG);
        if let Some(layer) = read_layer(&data_config)? {
            merge(&mut merged, layer);
        }

        let mut config: Config = from_value(&merged, &data_config)?;
        config.data_dir = Some(resolved_dir);
        Ok(config)
    }

    /// Location of the user config file, if one can be determined
    pub fn user_config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        ProjectDirs::from("", "", "dlms").map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Resolved data directory
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
    }
}

fn read_layer(path: &Path) -> Result<Option<serde_yml::Value>, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    if content.trim().is_empty() {
        return Ok(None);
    }
    serde_yml::from_str(&content)
        .map(Some)
        .map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

fn from_value(value: &serde_yml::Value, path: &Path) -> Result<Config, ConfigError> {
    serde_yml::from_value(value.clone()).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Deep-merge `overlay` into `base`; mappings merge key by key, anything else replaces
fn merge(base: &mut serde_yml::Value, overlay: serde_yml::Value) {
    match (base, overlay) {
        (serde_yml::Value::Mapping(base_map), serde_yml::Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let tmp = tempdir().unwrap();
        let config = Config::load_layers(None, Some(tmp.path())).unwrap();
        assert_eq!(config.data_dir(), tmp.path());
        assert!(config.default_user.is_none());
        assert!(!config.workflow.complete_returns);
        assert!(!config.workflow.allow_admin_approval);
    }

    #[test]
    fn test_data_dir_layer_overrides_user_layer() {
        let tmp = tempdir().unwrap();
        std::fs::write(
            tmp.path().join(DATA_DIR_CONFIG),
            "workflow:\n  complete_returns: true\n",
        )
        .unwrap();

        let user: serde_yml::Value = serde_yml::from_str(
            "default_user: ravi\nworkflow:\n  complete_returns: false\n  allow_admin_approval: true\n",
        )
        .unwrap();

        let config = Config::load_layers(Some(user), Some(tmp.path())).unwrap();
        assert_eq!(config.default_user.as_deref(), Some("ravi"));
        assert!(config.workflow.complete_returns);
        assert!(config.workflow.allow_admin_approval);
    }

    #[test]
    fn test_user_layer_selects_data_dir() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path().join("store");
        let user: serde_yml::Value =
            serde_yml::from_str(&format!("data_dir: {}\n", dir.display())).unwrap();

        let config = Config::load_layers(Some(user), None).unwrap();
        assert_eq!(config.data_dir(), dir);
    }

    #[test]
    fn test_invalid_yaml_is_reported() {
        let tmp = tempdir().unwrap();
        std::fs::write(tmp.path().join(DATA_DIR_CONFIG), "workflow: [unclosed\n").unwrap();
        let err = Config::load_layers(None, Some(tmp.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
