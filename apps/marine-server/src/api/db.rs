use std::path::{Path, PathBuf};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::{responses, security, AppState};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InitRequest {
    /// Script to run instead of the configured candidates.
    #[serde(default)]
    pub sql_path: Option<String>,
    /// Load the bundled schema when no configured script exists.
    #[serde(default)]
    pub bundled: Option<bool>,
}

/// Fallback command shown when initialisation fails; names `script` when the
/// request chose one, otherwise the first configured candidate.
fn manual_command(state: &AppState, script: Option<&Path>) -> String {
    let script = script
        .or_else(|| state.sql_candidates().first().map(PathBuf::as_path))
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<path/to/marine_schema.sql>".into());
    format!(
        "marine-cli db init --db \"{}\" --sql \"{}\"",
        state.kernel().db_path().display(),
        script
    )
}

#[utoipa::path(
    get,
    path = "/api/db/status",
    tag = "Database",
    responses((status = 200, description = "Table presence and init candidates", body = serde_json::Value))
)]
pub async fn status(State(state): State<AppState>) -> Response {
    match state.kernel().status_async().await {
        Ok(status) => responses::json_ok(json!({
            "db_path": status.db_path,
            "initialized": status.initialized,
            "present": status.present,
            "missing": status.missing,
            "sql_candidates": state.sql_candidates(),
            "manual_command": manual_command(&state, None),
        })),
        Err(err) => responses::kernel_error(&err),
    }
}

/// Create the marine tables unless they already exist.
#[utoipa::path(
    post,
    path = "/api/db/init",
    tag = "Database",
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Database present or initialised", body = serde_json::Value),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No SQL file found"),
        (status = 422, description = "A statement failed; nothing was applied"),
    )
)]
pub async fn init(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    if !security::admin_ok(&headers) {
        return responses::unauthorized();
    }
    let req: InitRequest = if body.iter().all(u8::is_ascii_whitespace) {
        InitRequest::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(req) => req,
            Err(err) => return responses::bad_request(&format!("invalid init request: {err}")),
        }
    };
    let explicit = req
        .sql_path
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from);
    let manual = manual_command(&state, explicit.as_deref());
    let (candidates, bundled) = match explicit {
        Some(path) => (vec![path], req.bundled.unwrap_or(false)),
        None => (state.sql_candidates().to_vec(), req.bundled.unwrap_or(true)),
    };
    let kernel = state.kernel();
    match kernel.ensure_initialized_async(candidates, bundled).await {
        Ok(outcome) => {
            let message = outcome.message(kernel.db_path());
            info!("{message}");
            responses::json_ok(json!({
                "message": message,
                "result": outcome,
                "db_path": kernel.db_path(),
            }))
        }
        Err(err) => {
            let (status, mut body) = responses::kernel_problem(&err);
            body["manual_command"] = json!(manual);
            responses::problem_response(status, body)
        }
    }
}
