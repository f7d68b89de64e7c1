use crate::shared::errors::{ApiErrorBody, ApiErrorCode};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// JSON response that proxies and browsers must not cache.
pub fn no_store_json<T: Serialize>(status: StatusCode, body: T) -> Response {
    (status, [(header::CACHE_CONTROL, "no-store")], Json(body)).into_response()
}

pub fn error_response(status: StatusCode, code: ApiErrorCode) -> Response {
    no_store_json(status, ApiErrorBody::from(code))
}
