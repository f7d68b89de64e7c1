use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use clawpanel::server::antfarm_cli::AntfarmCli;
use clawpanel::server::routes::{router, PanelState};
use clawpanel::server::run_store::RunStore;
use clawpanel::shared::logging::PanelLog;
use rusqlite::Connection;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::tempdir;
use tower::ServiceExt;

fn seed_store(path: &Path) {
    Connection::open(path)
        .expect("open fixture db")
        .execute_batch(
            "
            CREATE TABLE runs (id TEXT PRIMARY KEY, created_at TEXT, status TEXT, context TEXT);
            CREATE TABLE steps (id TEXT PRIMARY KEY, run_id TEXT, step_index INTEGER, name TEXT);
            INSERT INTO runs VALUES ('run-1', '2026-03-01T10:00:00Z', 'running', '{\"flow\":\"alpha\"}');
            INSERT INTO steps VALUES ('s-2', 'run-1', 2, 'verify');
            INSERT INTO steps VALUES ('s-1', 'run-1', 1, 'plan');
            ",
        )
        .expect("seed store");
}

fn state_for(db: &Path, state_root: &Path) -> PanelState {
    let log = PanelLog::new(state_root);
    PanelState::with_parts(
        RunStore::new(db).with_log(log.clone()),
        AntfarmCli::with_binary(
            state_root.join("missing-antfarm").display().to_string(),
            Duration::from_secs(1),
        ),
        log,
    )
}

async fn send(state: PanelState, request: Request<Body>) -> (StatusCode, Option<String>, Value) {
    let response: Response = router(state).oneshot(request).await.expect("response");
    let status = response.status();
    let cache_control = response
        .headers()
        .get("cache-control")
        .map(|value| value.to_str().expect("header text").to_string());
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, cache_control, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request")
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

#[tokio::test]
async fn list_runs_returns_runs_with_ordered_steps() {
    let dir = tempdir().expect("tempdir");
    let db = dir.path().join("antfarm.db");
    seed_store(&db);

    let (status, cache, body) = send(state_for(&db, dir.path()), get("/runs")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cache.as_deref(), Some("no-store"));
    assert_eq!(body["runs"][0]["id"], "run-1");
    assert_eq!(body["runs"][0]["contextJson"]["flow"], "alpha");
    assert_eq!(body["runs"][0]["steps"][0]["name"], "plan");
    assert_eq!(body["runs"][0]["steps"][1]["name"], "verify");
}

#[tokio::test]
async fn list_runs_hides_store_path_when_unavailable() {
    let dir = tempdir().expect("tempdir");
    let db = dir.path().join("hidden-store-dir/antfarm.db");

    let (status, cache, body) = send(state_for(&db, dir.path()), get("/runs")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(cache.as_deref(), Some("no-store"));
    assert_eq!(body["error"], "antfarm store unavailable");
    assert!(!body.to_string().contains("hidden-store-dir"));

    let log = fs::read_to_string(dir.path().join("logs/clawpanel.log")).expect("panel log");
    assert!(log.contains("runs.store_unavailable"));
}

#[tokio::test]
async fn get_run_distinguishes_found_missing_invalid_and_unavailable() {
    let dir = tempdir().expect("tempdir");
    let db = dir.path().join("antfarm.db");
    seed_store(&db);

    let (status, cache, body) = send(state_for(&db, dir.path()), get("/runs/run-1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cache.as_deref(), Some("no-store"));
    assert_eq!(body["run"]["status"], "running");
    assert_eq!(body["run"]["steps"][0]["step_index"], 1);

    let (status, cache, body) = send(state_for(&db, dir.path()), get("/runs/missing-id")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(cache.as_deref(), Some("no-store"));
    assert_eq!(body["error"], "not_found");

    let (status, _, body) = send(state_for(&db, dir.path()), get("/runs/%20%20")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_id");

    let (status, _, body) = send(state_for(&db, dir.path()), get("/runs/%20run-1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, _, body) = send(state_for(&db, dir.path()), get("/runs/")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_id");

    let gone = dir.path().join("gone.db");
    let (status, cache, body) = send(state_for(&gone, dir.path()), get("/runs/run-1")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(cache.as_deref(), Some("no-store"));
    assert!(!body.to_string().contains("gone.db"));
}

#[tokio::test]
async fn antfarm_command_maps_rejection_and_failure_separately() {
    let dir = tempdir().expect("tempdir");
    let db = dir.path().join("antfarm.db");

    let (status, cache, body) = send(
        state_for(&db, dir.path()),
        post_json(
            "/antfarm/command",
            r#"{"action":"/bin/bash","args":["-c","echo pwned"]}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(cache.as_deref(), Some("no-store"));
    assert_eq!(body["error"], "unauthorized_action");

    let (status, _, body) = send(
        state_for(&db, dir.path()),
        post_json(
            "/antfarm/command",
            r#"{"action":"workflow","args":["status"]}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "antfarm command failed");

    let (status, _, body) = send(
        state_for(&db, dir.path()),
        post_json("/antfarm/command", "not json"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn health_is_always_ok() {
    let dir = tempdir().expect("tempdir");
    let (status, _, body) = send(
        state_for(&dir.path().join("antfarm.db"), dir.path()),
        get("/health"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
}
