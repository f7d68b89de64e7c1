use super::responses::{error_response, no_store_json};
use super::PanelState;
use crate::server::antfarm_cli::AntfarmCommandError;
use crate::shared::errors::ApiErrorCode;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub struct CommandRequest {
    pub action: String,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Serialize)]
struct CommandBody {
    stdout: String,
    stderr: String,
}

pub async fn run_command(
    State(state): State<PanelState>,
    payload: Result<Json<CommandRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(request)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, ApiErrorCode::InvalidRequest);
    };

    let cli = state.antfarm.clone();
    let action = request.action.clone();
    let args = request.args.clone();
    let outcome = tokio::task::spawn_blocking(move || cli.run(&action, &args)).await;

    match outcome {
        Ok(Ok(output)) => {
            state.log.info(
                "antfarm.completed",
                "antfarm command completed",
                &[("action", Value::String(request.action))],
            );
            no_store_json(
                StatusCode::OK,
                CommandBody {
                    stdout: output.stdout,
                    stderr: output.stderr,
                },
            )
        }
        Ok(Err(err @ AntfarmCommandError::Unauthorized { .. })) => {
            state.log.warn("antfarm.rejected", &err.to_string(), &[]);
            error_response(StatusCode::FORBIDDEN, ApiErrorCode::UnauthorizedAction)
        }
        Ok(Err(err)) => {
            state.log.error("antfarm.failed", &err.to_string(), &[]);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, ApiErrorCode::CommandFailed)
        }
        Err(err) => {
            state.log.error("antfarm.failed", &err.to_string(), &[]);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, ApiErrorCode::CommandFailed)
        }
    }
}
