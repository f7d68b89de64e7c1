use super::paths::{
    default_settings_path, default_state_root, home_dir, resolve_antfarm_db_path, ANTFARM_DB_ENV,
};
use super::{ConfigError, PanelSettings};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Fully resolved startup configuration.
///
/// Built once by the binary and handed to the server; nothing downstream reads
/// the process environment again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelConfig {
    pub bind: SocketAddr,
    pub state_root: PathBuf,
    pub antfarm_db: PathBuf,
}

impl PanelConfig {
    pub fn from_settings(
        settings: &PanelSettings,
        env_override: Option<std::ffi::OsString>,
        home: &Path,
    ) -> Result<Self, ConfigError> {
        let bind = settings.bind_addr()?;
        settings.validate_paths()?;
        let state_root = settings
            .state_root
            .clone()
            .unwrap_or_else(|| default_state_root(home));
        let antfarm_db =
            resolve_antfarm_db_path(env_override, settings.antfarm_db.as_deref(), home);
        Ok(Self {
            bind,
            state_root,
            antfarm_db,
        })
    }
}

pub fn load_panel_config() -> Result<PanelConfig, ConfigError> {
    let home = home_dir()?;
    let settings = PanelSettings::from_optional_path(&default_settings_path(&home))?;
    PanelConfig::from_settings(&settings, std::env::var_os(ANTFARM_DB_ENV), &home)
}
