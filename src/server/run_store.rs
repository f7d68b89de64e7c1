#![cfg(not(target_arch = "wasm32"))]
//! Read-only view over the antfarm workflow store.
//!
//! Server execution only. Client builds (wasm32) compile this module out, and
//! `tests/server_boundary_module.rs` keeps every importer under
//! `src/server/routes/`.

use crate::shared::logging::PanelLog;
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OpenFlags, Params};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_secs(2);
/// Keys the reader adds to a run; same-named store columns are not passed through.
const RESERVED_RUN_KEYS: &[&str] = &["steps", "contextJson"];

#[derive(Debug, thiserror::Error)]
pub enum RunStoreError {
    #[error("antfarm run store unavailable")]
    Unavailable {
        #[source]
        source: rusqlite::Error,
    },
}

fn unavailable(source: rusqlite::Error) -> RunStoreError {
    RunStoreError::Unavailable { source }
}

/// Parsed form of a run's `context` column.
///
/// Serializes as the parsed JSON, or `null` when the column was NULL or did not
/// parse. The two `null` cases stay distinct in Rust.
#[derive(Debug, Clone, PartialEq)]
pub enum RunContext {
    Absent,
    Parsed(Value),
    Unparsable,
}

impl RunContext {
    pub fn from_column(raw: Option<&str>) -> Self {
        match raw {
            None => Self::Absent,
            Some(raw) => serde_json::from_str(raw)
                .map(Self::Parsed)
                .unwrap_or(Self::Unparsable),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Parsed(value) => Some(value),
            Self::Absent | Self::Unparsable => None,
        }
    }
}

impl Serialize for RunContext {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Parsed(value) => value.serialize(serializer),
            Self::Absent | Self::Unparsable => serializer.serialize_none(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRecord {
    pub id: String,
    pub run_id: String,
    pub step_index: i64,
    pub name: Option<String>,
    /// Every other `steps` column, passed through as stored.
    #[serde(flatten)]
    pub columns: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRecord {
    pub id: String,
    pub created_at: Option<String>,
    pub status: Option<String>,
    pub context: Option<String>,
    #[serde(rename = "contextJson")]
    pub context_json: RunContext,
    /// Every other `runs` column, passed through as stored.
    #[serde(flatten)]
    pub columns: Map<String, Value>,
    pub steps: Vec<StepRecord>,
}

#[derive(Debug, Clone)]
pub struct RunStore {
    db_path: PathBuf,
    log: Option<PanelLog>,
}

impl RunStore {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            log: None,
        }
    }

    pub fn with_log(mut self, log: PanelLog) -> Self {
        self.log = Some(log);
        self
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// All runs, newest first, each with its steps in `step_index` order.
    ///
    /// Steps come from one scan of the `steps` table. Steps whose `run_id`
    /// is NULL or matches no run are dropped. A malformed row is skipped and
    /// logged without failing the listing.
    pub fn list_runs_with_steps(&self) -> Result<Vec<RunRecord>, RunStoreError> {
        let connection = self.connect()?;

        let mut steps_by_run: HashMap<String, Vec<StepRecord>> = HashMap::new();
        let step_rows = query_rows(
            &connection,
            "SELECT * FROM steps ORDER BY run_id ASC, step_index ASC, id ASC",
            [],
        )?;
        for row in step_rows {
            let Some(step) = self.step_or_skip(row) else {
                continue;
            };
            steps_by_run
                .entry(step.run_id.clone())
                .or_default()
                .push(step);
        }

        let run_rows = query_rows(
            &connection,
            "SELECT * FROM runs ORDER BY created_at DESC, id ASC",
            [],
        )?;
        let mut runs = Vec::with_capacity(run_rows.len());
        for row in run_rows {
            let Some(mut run) = self.run_or_skip(row) else {
                continue;
            };
            run.steps = steps_by_run.remove(&run.id).unwrap_or_default();
            runs.push(run);
        }
        Ok(runs)
    }

    /// One run with its ordered steps; `Ok(None)` when no run has that id.
    pub fn get_run_with_steps(&self, run_id: &str) -> Result<Option<RunRecord>, RunStoreError> {
        let connection = self.connect()?;

        let Some(row) = query_rows(
            &connection,
            "SELECT * FROM runs WHERE id = ?1 LIMIT 1",
            params![run_id],
        )?
        .into_iter()
        .next() else {
            return Ok(None);
        };
        let Some(mut run) = self.run_or_skip(row) else {
            return Ok(None);
        };

        run.steps = query_rows(
            &connection,
            "SELECT * FROM steps WHERE run_id = ?1 ORDER BY step_index ASC, id ASC",
            params![run_id],
        )?
        .into_iter()
        .filter_map(|row| self.step_or_skip(row))
        .collect();
        Ok(Some(run))
    }

    fn connect(&self) -> Result<Connection, RunStoreError> {
        let connection = Connection::open_with_flags(
            &self.db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(unavailable)?;
        connection.busy_timeout(BUSY_TIMEOUT).map_err(unavailable)?;
        Ok(connection)
    }

    fn run_or_skip(&self, mut row: Map<String, Value>) -> Option<RunRecord> {
        let Some(id) = take_optional_string(&mut row, "id") else {
            self.warn_malformed("runs", "run row has no id".to_string());
            return None;
        };
        let created_at = take_optional_string(&mut row, "created_at");
        let status = take_optional_string(&mut row, "status");
        let context = take_optional_string(&mut row, "context");
        let context_json = RunContext::from_column(context.as_deref());
        for key in RESERVED_RUN_KEYS {
            row.remove(*key);
        }

        if context_json == RunContext::Unparsable {
            if let Some(log) = &self.log {
                log.warn(
                    "runs.context_unparsable",
                    "run context is not valid json",
                    &[("run_id", Value::String(id.clone()))],
                );
            }
        }

        Some(RunRecord {
            id,
            created_at,
            status,
            context,
            context_json,
            columns: row,
            steps: Vec::new(),
        })
    }

    fn step_or_skip(&self, row: Map<String, Value>) -> Option<StepRecord> {
        match step_from_row(row) {
            Ok(step) => step,
            Err(reason) => {
                self.warn_malformed("steps", reason);
                None
            }
        }
    }

    fn warn_malformed(&self, table: &str, reason: String) {
        if let Some(log) = &self.log {
            log.warn(
                "runs.row_malformed",
                &reason,
                &[("table", Value::String(table.to_string()))],
            );
        }
    }
}

/// `Ok(None)` for an orphan step with a NULL `run_id`; `Err` names what is malformed.
fn step_from_row(mut row: Map<String, Value>) -> Result<Option<StepRecord>, String> {
    let Some(run_id) = take_optional_string(&mut row, "run_id") else {
        return Ok(None);
    };
    let id = take_optional_string(&mut row, "id")
        .ok_or_else(|| format!("step of run `{run_id}` has no id"))?;
    let step_index = match row.remove("step_index") {
        Some(Value::Number(number)) if number.is_i64() => number.as_i64().unwrap_or_default(),
        other => {
            return Err(format!(
                "step `{id}` of run `{run_id}` has non-integer step_index {other:?}"
            ))
        }
    };
    let name = take_optional_string(&mut row, "name");
    Ok(Some(StepRecord {
        id,
        run_id,
        step_index,
        name,
        columns: row,
    }))
}

/// Runs `sql` and returns each row as a column-name keyed JSON object.
fn query_rows<P: Params>(
    connection: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<Map<String, Value>>, RunStoreError> {
    let mut statement = connection.prepare(sql).map_err(unavailable)?;
    let columns: Vec<String> = statement
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect();

    let mut rows = statement.query(params).map_err(unavailable)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().map_err(unavailable)? {
        let mut object = Map::new();
        for (idx, column) in columns.iter().enumerate() {
            let value = row.get_ref(idx).map_err(unavailable)?;
            object.insert(column.clone(), sql_value_to_json(value));
        }
        out.push(object);
    }
    Ok(out)
}

fn sql_value_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(number) => Value::from(number),
        ValueRef::Real(number) => Value::from(number),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Array(bytes.iter().map(|b| Value::from(*b)).collect()),
    }
}

fn take_optional_string(row: &mut Map<String, Value>, column: &str) -> Option<String> {
    match row.remove(column)? {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}
