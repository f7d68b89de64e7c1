use crate::config::ConfigError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const PANEL_STATE_DIR: &str = ".clawpanel";
pub const PANEL_SETTINGS_FILE_NAME: &str = "config.yaml";
pub const ANTFARM_DB_ENV: &str = "ANTFARM_DB_PATH";
pub const DEFAULT_ANTFARM_DB_RELATIVE: &str = ".openclaw/antfarm/antfarm.db";

pub fn home_dir() -> Result<PathBuf, ConfigError> {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .ok_or(ConfigError::HomeDirectoryUnavailable)
}

pub fn default_state_root(home: &Path) -> PathBuf {
    home.join(PANEL_STATE_DIR)
}

pub fn default_settings_path(home: &Path) -> PathBuf {
    default_state_root(home).join(PANEL_SETTINGS_FILE_NAME)
}

pub fn default_antfarm_db_path(home: &Path) -> PathBuf {
    home.join(DEFAULT_ANTFARM_DB_RELATIVE)
}

/// Picks the antfarm store location.
///
/// Precedence: explicit override (the `ANTFARM_DB_PATH` value read at startup),
/// then the `antfarm_db` setting, then `~/.openclaw/antfarm/antfarm.db`.
/// An empty override counts as unset.
pub fn resolve_antfarm_db_path(
    env_override: Option<OsString>,
    configured: Option<&Path>,
    home: &Path,
) -> PathBuf {
    if let Some(value) = env_override.filter(|value| !value.is_empty()) {
        return PathBuf::from(value);
    }
    if let Some(path) = configured {
        return path.to_path_buf();
    }
    default_antfarm_db_path(home)
}
