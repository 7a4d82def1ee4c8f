use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use marine_kernel::{KernelError, ScriptError};
use serde::Serialize;
use serde_json::json;
use tracing::{error, warn};

const PROBLEM_JSON: &str = "application/problem+json";
const INIT_HINT: &str = "Open DB Init to create the marine tables, or run `marine-cli db init`.";

pub(crate) fn json_ok<T: Serialize>(value: T) -> Response {
    (StatusCode::OK, Json(value)).into_response()
}

pub(crate) fn created<T: Serialize>(value: T) -> Response {
    (StatusCode::CREATED, Json(value)).into_response()
}

pub(crate) fn problem(status: StatusCode, title: &str, detail: Option<&str>) -> Response {
    let mut body = json!({"type": "about:blank", "title": title, "status": status.as_u16()});
    if let Some(d) = detail {
        body["detail"] = json!(d);
    }
    (status, [(header::CONTENT_TYPE, PROBLEM_JSON)], body.to_string()).into_response()
}

pub(crate) fn unauthorized() -> Response {
    problem(
        StatusCode::UNAUTHORIZED,
        "Unauthorized",
        Some("admin token required for changes"),
    )
}

pub(crate) fn bad_request(detail: &str) -> Response {
    problem(StatusCode::BAD_REQUEST, "Bad Request", Some(detail))
}

pub(crate) fn bad_json(rejection: JsonRejection) -> Response {
    bad_request(&rejection.body_text())
}

pub(crate) fn bad_query(rejection: QueryRejection) -> Response {
    bad_request(&rejection.body_text())
}

fn problem_body(status: StatusCode, title: &str, detail: &str) -> serde_json::Value {
    json!({"type": "about:blank", "title": title, "status": status.as_u16(), "detail": detail})
}

pub(crate) fn problem_response(status: StatusCode, body: serde_json::Value) -> Response {
    (status, [(header::CONTENT_TYPE, PROBLEM_JSON)], body.to_string()).into_response()
}

fn not_initialized(err: &KernelError) -> (StatusCode, serde_json::Value) {
    let status = StatusCode::SERVICE_UNAVAILABLE;
    let mut body = problem_body(status, "Database Not Initialized", &err.to_string());
    body["hint"] = json!(INIT_HINT);
    if let KernelError::NotInitialized { missing } = err {
        body["missing"] = json!(missing);
    }
    (status, body)
}

/// Status and problem body for a kernel failure, for handlers that add fields.
pub(crate) fn kernel_problem(err: &KernelError) -> (StatusCode, serde_json::Value) {
    match err {
        KernelError::Validation(msg) => (
            StatusCode::BAD_REQUEST,
            problem_body(StatusCode::BAD_REQUEST, "Bad Request", msg),
        ),
        KernelError::UnknownTable(_) | KernelError::UnknownColumn { .. } => (
            StatusCode::BAD_REQUEST,
            problem_body(StatusCode::BAD_REQUEST, "Bad Request", &err.to_string()),
        ),
        KernelError::NotFound { .. } => (
            StatusCode::NOT_FOUND,
            problem_body(StatusCode::NOT_FOUND, "Not Found", &err.to_string()),
        ),
        KernelError::NotInitialized { .. } => not_initialized(err),
        KernelError::Sqlite(_) if err.is_missing_table() => not_initialized(err),
        KernelError::ScriptMissing { searched } => {
            let mut body =
                problem_body(StatusCode::NOT_FOUND, "SQL File Not Found", &err.to_string());
            body["searched"] = json!(searched);
            (StatusCode::NOT_FOUND, body)
        }
        KernelError::Script(script) => script_error(script),
        KernelError::Sqlite(_) | KernelError::Io { .. } | KernelError::Join(_) => {
            error!("kernel failure: {err}");
            let status = StatusCode::INTERNAL_SERVER_ERROR;
            (
                status,
                problem_body(status, "Internal Server Error", &err.to_string()),
            )
        }
    }
}

/// Map kernel failures to problem responses.
pub(crate) fn kernel_error(err: &KernelError) -> Response {
    let (status, body) = kernel_problem(err);
    problem_response(status, body)
}

fn script_error(err: &ScriptError) -> (StatusCode, serde_json::Value) {
    warn!("script failed: {err}");
    let status = StatusCode::UNPROCESSABLE_ENTITY;
    let mut body = problem_body(status, "SQL Script Failed", &err.to_string());
    match err {
        ScriptError::Execute {
            line, statement, ..
        } => {
            body["line"] = json!(line);
            body["statement"] = json!(statement);
        }
        ScriptError::NotFound(path) | ScriptError::Read { path, .. } => {
            body["path"] = json!(path);
        }
        ScriptError::Transaction(_) => {}
    }
    (status, body)
}
