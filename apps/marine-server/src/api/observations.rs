use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::Json;
use marine_kernel::model::ObservationForm;
use marine_kernel::DEFAULT_RECENT_LIMIT;
use serde::Deserialize;

use crate::{responses, security, AppState};

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/api/observations/recent",
    tag = "Observations",
    params(("limit" = Option<i64>, Query, description = "Rows to return (1-500, default 10)")),
    responses(
        (status = 200, description = "Newest observations first", body = serde_json::Value),
        (status = 503, description = "Database not initialized"),
    )
)]
pub async fn recent(
    State(state): State<AppState>,
    query: Result<Query<RecentQuery>, QueryRejection>,
) -> Response {
    let Query(q) = match query {
        Ok(q) => q,
        Err(rejection) => return responses::bad_query(rejection),
    };
    let limit = q.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
    match state.kernel().recent_observations_async(limit).await {
        Ok(rows) => responses::json_ok(rows),
        Err(err) => responses::kernel_error(&err),
    }
}

/// Label lists for the observation form.
#[utoipa::path(
    get,
    path = "/api/observations/options",
    tag = "Observations",
    responses(
        (status = 200, description = "Species, location and observer labels", body = serde_json::Value),
        (status = 503, description = "Database not initialized"),
    )
)]
pub async fn options(State(state): State<AppState>) -> Response {
    match state.kernel().form_options_async().await {
        Ok(opts) => responses::json_ok(opts),
        Err(err) => responses::kernel_error(&err),
    }
}

/// Record a sighting from form labels; new observer and water readings are optional.
#[utoipa::path(
    post,
    path = "/api/observations",
    tag = "Observations",
    request_body = serde_json::Value,
    responses(
        (status = 201, description = "Observation logged", body = serde_json::Value),
        (status = 400, description = "Unresolved selection or invalid readings"),
        (status = 401, description = "Unauthorized"),
    )
)]
pub async fn submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<ObservationForm>, JsonRejection>,
) -> Response {
    if !security::admin_ok(&headers) {
        return responses::unauthorized();
    }
    let Json(form) = match body {
        Ok(body) => body,
        Err(rejection) => return responses::bad_json(rejection),
    };
    match state.kernel().log_observation_async(form).await {
        Ok(logged) => responses::created(logged),
        Err(err) => responses::kernel_error(&err),
    }
}
