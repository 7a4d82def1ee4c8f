use axum::extract::State;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use utoipa::OpenApi;

use crate::{responses, AppState};

/// Health probe.
#[utoipa::path(
    get,
    path = "/healthz",
    tag = "Meta",
    operation_id = "healthz_doc",
    description = "Service liveness probe.",
    responses(
        (status = 200, description = "Service healthy", body = crate::openapi::HealthOk)
    )
)]
pub async fn healthz() -> impl IntoResponse {
    responses::json_ok(json!({"ok": true}))
}

/// Service metadata and endpoints index.
#[utoipa::path(
    get,
    path = "/about",
    tag = "Meta",
    operation_id = "about_doc",
    description = "Service name, version, database file and registered endpoints.",
    responses(
        (status = 200, description = "Service metadata", body = crate::openapi::AboutResponse)
    )
)]
pub async fn about(State(state): State<AppState>) -> Response {
    let endpoints = state.endpoints();
    let endpoints_meta = state.endpoints_meta();
    responses::json_ok(json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "db_path": state.kernel().db_path(),
        "admin_token": crate::security::admin_token_set(),
        "endpoints": endpoints.as_ref(),
        "endpoints_meta": endpoints_meta.as_ref(),
    }))
}

/// Generated OpenAPI document.
pub async fn openapi_json() -> Response {
    match crate::openapi::ApiDoc::openapi().to_json() {
        Ok(body) => (
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        Err(err) => responses::problem(
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            "OpenAPI Unavailable",
            Some(&err.to_string()),
        ),
    }
}
