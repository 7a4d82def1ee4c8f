use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS};
use axum::response::{Html, IntoResponse, Redirect};

use crate::router::paths;

const DASHBOARD_HTML: &str = include_str!("../../assets/dashboard.html");
const OBSERVE_HTML: &str = include_str!("../../assets/observe.html");
const CATALOG_HTML: &str = include_str!("../../assets/catalog.html");
const SEARCH_HTML: &str = include_str!("../../assets/search.html");
const ACTIONS_HTML: &str = include_str!("../../assets/actions.html");
const DB_HTML: &str = include_str!("../../assets/db.html");
const APP_JS: &str = include_str!("../../assets/app.js");
const APP_CSS: &str = include_str!("../../assets/app.css");

fn common_headers() -> [(axum::http::HeaderName, &'static str); 3] {
    [
        (X_CONTENT_TYPE_OPTIONS, "nosniff"),
        (REFERRER_POLICY, "no-referrer"),
        (CACHE_CONTROL, "no-store"),
    ]
}

pub(crate) async fn index() -> Redirect {
    Redirect::to(paths::UI_DASHBOARD)
}

pub(crate) async fn dashboard_ui() -> impl IntoResponse {
    (common_headers(), Html(DASHBOARD_HTML))
}

pub(crate) async fn observe_ui() -> impl IntoResponse {
    (common_headers(), Html(OBSERVE_HTML))
}

pub(crate) async fn catalog_ui() -> impl IntoResponse {
    (common_headers(), Html(CATALOG_HTML))
}

pub(crate) async fn search_ui() -> impl IntoResponse {
    (common_headers(), Html(SEARCH_HTML))
}

pub(crate) async fn actions_ui() -> impl IntoResponse {
    (common_headers(), Html(ACTIONS_HTML))
}

pub(crate) async fn db_ui() -> impl IntoResponse {
    (common_headers(), Html(DB_HTML))
}

pub(crate) async fn app_js() -> impl IntoResponse {
    (
        common_headers(),
        [(CONTENT_TYPE, "application/javascript; charset=utf-8")],
        APP_JS,
    )
}

pub(crate) async fn app_css() -> impl IntoResponse {
    (
        common_headers(),
        [(CONTENT_TYPE, "text/css; charset=utf-8")],
        APP_CSS,
    )
}
