use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use axum::Json;
use marine_kernel::model::NewConservationAction;
use serde_json::json;

use crate::{responses, security, AppState};

#[utoipa::path(
    get,
    path = "/api/actions",
    tag = "Actions",
    responses((status = 200, description = "Conservation actions, newest start first", body = serde_json::Value))
)]
pub async fn actions_list(State(state): State<AppState>) -> Response {
    match state.kernel().list_conservation_actions_async().await {
        Ok(rows) => responses::json_ok(rows),
        Err(err) => responses::kernel_error(&err),
    }
}

#[utoipa::path(
    post,
    path = "/api/actions",
    tag = "Actions",
    request_body = serde_json::Value,
    responses(
        (status = 201, description = "Action recorded", body = serde_json::Value),
        (status = 400, description = "Missing action type or end before start"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Unknown species"),
    )
)]
pub async fn actions_add(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<NewConservationAction>, JsonRejection>,
) -> Response {
    if !security::admin_ok(&headers) {
        return responses::unauthorized();
    }
    let Json(new) = match body {
        Ok(body) => body,
        Err(rejection) => return responses::bad_json(rejection),
    };
    match state.kernel().add_conservation_action_async(new).await {
        Ok(action_id) => responses::created(json!({ "action_id": action_id })),
        Err(err) => responses::kernel_error(&err),
    }
}
