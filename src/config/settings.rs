use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const DEFAULT_BIND: &str = "127.0.0.1:3210";

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PanelSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default)]
    pub state_root: Option<PathBuf>,
    #[serde(default)]
    pub antfarm_db: Option<PathBuf>,
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            state_root: None,
            antfarm_db: None,
        }
    }
}

impl PanelSettings {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Loads the settings file, treating a missing file as all defaults.
    pub fn from_optional_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::from_path(path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        self.validate_paths()
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind.parse::<SocketAddr>().map_err(|_| {
            ConfigError::Settings(format!(
                "`bind` must be a socket address like {DEFAULT_BIND}, got `{}`",
                self.bind
            ))
        })
    }

    pub(crate) fn validate_paths(&self) -> Result<(), ConfigError> {
        if let Some(root) = &self.state_root {
            if !root.is_absolute() {
                return Err(ConfigError::Settings(
                    "`state_root` must be an absolute path".to_string(),
                ));
            }
        }
        if let Some(db) = &self.antfarm_db {
            if !db.is_absolute() {
                return Err(ConfigError::Settings(
                    "`antfarm_db` must be an absolute path".to_string(),
                ));
            }
        }
        Ok(())
    }
}
