use super::antfarm_cli::AntfarmCli;
use super::run_store::RunStore;
use crate::config::PanelConfig;
use crate::shared::logging::PanelLog;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;

pub mod antfarm;
pub mod responses;
pub mod runs;

#[derive(Debug, Clone)]
pub struct PanelState {
    run_store: Arc<RunStore>,
    antfarm: Arc<AntfarmCli>,
    log: PanelLog,
}

impl PanelState {
    pub fn from_config(config: &PanelConfig) -> Self {
        let log = PanelLog::new(&config.state_root);
        let run_store = RunStore::new(config.antfarm_db.clone()).with_log(log.clone());
        Self::with_parts(run_store, AntfarmCli::default(), log)
    }

    pub fn with_parts(run_store: RunStore, antfarm: AntfarmCli, log: PanelLog) -> Self {
        Self {
            run_store: Arc::new(run_store),
            antfarm: Arc::new(antfarm),
            log,
        }
    }
}

pub fn router(state: PanelState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/runs", get(runs::list_runs))
        .route("/runs/", get(runs::missing_run_id))
        .route("/runs/{id}", get(runs::get_run))
        .route("/antfarm/command", post(antfarm::run_command))
        .with_state(state)
}

pub async fn serve(config: &PanelConfig) -> std::io::Result<()> {
    let state = PanelState::from_config(config);
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    state.log.info(
        "server.started",
        "panel listening",
        &[("bind", Value::String(config.bind.to_string()))],
    );
    axum::serve(listener, router(state)).await
}

async fn health() -> Response {
    responses::no_store_json(StatusCode::OK, json!({ "ok": true }))
}
