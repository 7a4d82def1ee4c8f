use axum::extract::State;
use axum::response::Response;

use crate::{responses, AppState};

/// Totals, status breakdown, pollution by region and the latest sightings.
#[utoipa::path(
    get,
    path = "/api/dashboard",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Dashboard metrics", body = serde_json::Value),
        (status = 503, description = "Database not initialized"),
    )
)]
pub async fn dashboard(State(state): State<AppState>) -> Response {
    match state.kernel().dashboard_async().await {
        Ok(dash) => responses::json_ok(dash),
        Err(err) => responses::kernel_error(&err),
    }
}
