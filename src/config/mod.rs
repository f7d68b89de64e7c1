pub mod error;
pub mod load;
pub mod paths;
pub mod settings;

pub use error::ConfigError;
pub use load::{load_panel_config, PanelConfig};
pub use paths::{
    default_antfarm_db_path, default_settings_path, default_state_root, resolve_antfarm_db_path,
    ANTFARM_DB_ENV, PANEL_SETTINGS_FILE_NAME, PANEL_STATE_DIR,
};
pub use settings::{PanelSettings, DEFAULT_BIND};
