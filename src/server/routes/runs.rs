use super::responses::{error_response, no_store_json};
use super::PanelState;
use crate::server::run_store::{RunRecord, RunStoreError};
use crate::shared::errors::ApiErrorCode;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
struct RunsBody {
    runs: Vec<RunRecord>,
}

#[derive(Debug, Serialize)]
struct RunBody {
    run: RunRecord,
}

pub async fn list_runs(State(state): State<PanelState>) -> Response {
    let store = state.run_store.clone();
    match tokio::task::spawn_blocking(move || store.list_runs_with_steps()).await {
        Ok(Ok(runs)) => no_store_json(StatusCode::OK, RunsBody { runs }),
        Ok(Err(err)) => store_unavailable(&state, &err),
        Err(err) => {
            state.log.error(
                "runs.task_failed",
                "run listing task did not complete",
                &[("reason", Value::String(err.to_string()))],
            );
            error_response(StatusCode::SERVICE_UNAVAILABLE, ApiErrorCode::StoreUnavailable)
        }
    }
}

pub async fn get_run(State(state): State<PanelState>, Path(id): Path<String>) -> Response {
    if id.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, ApiErrorCode::InvalidId);
    }

    let store = state.run_store.clone();
    match tokio::task::spawn_blocking(move || store.get_run_with_steps(&id)).await {
        Ok(Ok(Some(run))) => no_store_json(StatusCode::OK, RunBody { run }),
        Ok(Ok(None)) => error_response(StatusCode::NOT_FOUND, ApiErrorCode::NotFound),
        Ok(Err(err)) => store_unavailable(&state, &err),
        Err(err) => {
            state.log.error(
                "runs.task_failed",
                "run lookup task did not complete",
                &[("reason", Value::String(err.to_string()))],
            );
            error_response(StatusCode::SERVICE_UNAVAILABLE, ApiErrorCode::StoreUnavailable)
        }
    }
}

pub async fn missing_run_id() -> Response {
    error_response(StatusCode::BAD_REQUEST, ApiErrorCode::InvalidId)
}

fn store_unavailable(state: &PanelState, err: &RunStoreError) -> Response {
    let detail = std::error::Error::source(err)
        .map(ToString::to_string)
        .unwrap_or_default();
    state.log.error(
        "runs.store_unavailable",
        &err.to_string(),
        &[("detail", Value::String(detail))],
    );
    error_response(StatusCode::SERVICE_UNAVAILABLE, ApiErrorCode::StoreUnavailable)
}
