use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub fn panel_log_path(state_root: &Path) -> PathBuf {
    state_root.join("logs/clawpanel.log")
}

/// Append-only JSON-lines log under the panel state root.
///
/// Write failures are swallowed: a broken log directory must never fail a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelLog {
    path: PathBuf,
}

impl PanelLog {
    pub fn new(state_root: &Path) -> Self {
        Self {
            path: panel_log_path(state_root),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn info(&self, event: &str, message: &str, fields: &[(&str, Value)]) {
        self.append("info", event, message, fields);
    }

    pub fn warn(&self, event: &str, message: &str, fields: &[(&str, Value)]) {
        self.append("warn", event, message, fields);
    }

    pub fn error(&self, event: &str, message: &str, fields: &[(&str, Value)]) {
        self.append("error", event, message, fields);
    }

    fn append(&self, level: &str, event: &str, message: &str, fields: &[(&str, Value)]) {
        let line = render_log_line(now_secs(), level, event, message, fields);

        if let Some(parent) = self.path.parent() {
            if fs::create_dir_all(parent).is_err() {
                return;
            }
        }
        let Ok(mut file) = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
        else {
            return;
        };
        let _ = writeln!(file, "{line}");
    }
}

fn render_log_line(
    timestamp: i64,
    level: &str,
    event: &str,
    message: &str,
    fields: &[(&str, Value)],
) -> String {
    let mut payload = Map::new();
    payload.insert("timestamp".to_string(), Value::from(timestamp));
    payload.insert("level".to_string(), Value::String(level.to_string()));
    payload.insert("event".to_string(), Value::String(event.to_string()));
    payload.insert("message".to_string(), Value::String(message.to_string()));
    for (key, value) in fields {
        payload.insert((*key).to_string(), value.clone());
    }
    Value::Object(payload).to_string()
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs() as i64)
        .unwrap_or(0)
}
