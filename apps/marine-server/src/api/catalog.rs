use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use axum::Json;
use marine_kernel::model::{NewLocation, NewObserver, NewSpecies};
use serde_json::json;
use tracing::info;

use crate::{responses, security, AppState};

#[utoipa::path(
    get,
    path = "/api/species",
    tag = "Catalog",
    responses((status = 200, description = "All species", body = serde_json::Value))
)]
pub async fn species_list(State(state): State<AppState>) -> Response {
    match state.kernel().list_species_async().await {
        Ok(rows) => responses::json_ok(rows),
        Err(err) => responses::kernel_error(&err),
    }
}

#[utoipa::path(
    post,
    path = "/api/species",
    tag = "Catalog",
    request_body = serde_json::Value,
    responses(
        (status = 201, description = "Species added", body = serde_json::Value),
        (status = 400, description = "Missing common name or unknown status"),
        (status = 401, description = "Unauthorized"),
    )
)]
pub async fn species_add(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<NewSpecies>, JsonRejection>,
) -> Response {
    if !security::admin_ok(&headers) {
        return responses::unauthorized();
    }
    let Json(new) = match body {
        Ok(body) => body,
        Err(rejection) => return responses::bad_json(rejection),
    };
    match state.kernel().add_species_async(new).await {
        Ok(species_id) => {
            info!(species_id, "species added");
            responses::created(json!({ "species_id": species_id }))
        }
        Err(err) => responses::kernel_error(&err),
    }
}

#[utoipa::path(
    get,
    path = "/api/observers",
    tag = "Catalog",
    responses((status = 200, description = "All observers", body = serde_json::Value))
)]
pub async fn observers_list(State(state): State<AppState>) -> Response {
    match state.kernel().list_observers_async().await {
        Ok(rows) => responses::json_ok(rows),
        Err(err) => responses::kernel_error(&err),
    }
}

#[utoipa::path(
    post,
    path = "/api/observers",
    tag = "Catalog",
    request_body = serde_json::Value,
    responses(
        (status = 201, description = "Observer added", body = serde_json::Value),
        (status = 400, description = "Missing name"),
        (status = 401, description = "Unauthorized"),
    )
)]
pub async fn observers_add(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<NewObserver>, JsonRejection>,
) -> Response {
    if !security::admin_ok(&headers) {
        return responses::unauthorized();
    }
    let Json(new) = match body {
        Ok(body) => body,
        Err(rejection) => return responses::bad_json(rejection),
    };
    match state.kernel().add_observer_async(new).await {
        Ok(observer_id) => responses::created(json!({ "observer_id": observer_id })),
        Err(err) => responses::kernel_error(&err),
    }
}

#[utoipa::path(
    get,
    path = "/api/locations",
    tag = "Catalog",
    responses((status = 200, description = "All survey locations", body = serde_json::Value))
)]
pub async fn locations_list(State(state): State<AppState>) -> Response {
    match state.kernel().list_locations_async().await {
        Ok(rows) => responses::json_ok(rows),
        Err(err) => responses::kernel_error(&err),
    }
}

#[utoipa::path(
    post,
    path = "/api/locations",
    tag = "Catalog",
    request_body = serde_json::Value,
    responses(
        (status = 201, description = "Location added", body = serde_json::Value),
        (status = 400, description = "Missing location name"),
        (status = 401, description = "Unauthorized"),
    )
)]
pub async fn locations_add(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<NewLocation>, JsonRejection>,
) -> Response {
    if !security::admin_ok(&headers) {
        return responses::unauthorized();
    }
    let Json(new) = match body {
        Ok(body) => body,
        Err(rejection) => return responses::bad_json(rejection),
    };
    match state.kernel().add_location_async(new).await {
        Ok(location_id) => responses::created(json!({ "location_id": location_id })),
        Err(err) => responses::kernel_error(&err),
    }
}
