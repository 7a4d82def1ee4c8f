use std::mem;

use axum::{
    handler::Handler,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};

use crate::{api, AppState};

#[derive(Copy, Clone)]
pub(crate) enum Stability {
    Stable,
    Beta,
}

impl Stability {
    fn as_str(self) -> &'static str {
        match self {
            Stability::Stable => "stable",
            Stability::Beta => "beta",
        }
    }
}

/// Router plus the endpoint index served by `/about`.
pub(crate) struct RouterBuilder {
    router: Router<AppState>,
    endpoints: Vec<String>,
    endpoints_meta: Vec<Value>,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            endpoints: Vec::new(),
            endpoints_meta: Vec::new(),
        }
    }

    fn record(&mut self, method: &str, path: &'static str, stability: Option<Stability>) {
        self.endpoints.push(format!("{} {}", method, path));
        if let Some(stability) = stability {
            self.endpoints_meta.push(json!({
                "method": method,
                "path": path,
                "stability": stability.as_str(),
            }));
        }
    }

    pub fn route_get<H, T>(
        &mut self,
        path: &'static str,
        handler: H,
        stability: Option<Stability>,
    ) -> &mut Self
    where
        H: Handler<T, AppState> + Clone + 'static,
        T: Send + 'static,
    {
        self.record("GET", path, stability);
        let router = mem::take(&mut self.router);
        self.router = router.route(path, get(handler));
        self
    }

    pub fn route_post<H, T>(
        &mut self,
        path: &'static str,
        handler: H,
        stability: Option<Stability>,
    ) -> &mut Self
    where
        H: Handler<T, AppState> + Clone + 'static,
        T: Send + 'static,
    {
        self.record("POST", path, stability);
        let router = mem::take(&mut self.router);
        self.router = router.route(path, post(handler));
        self
    }

    pub fn build(self) -> (Router<AppState>, Vec<String>, Vec<Value>) {
        (self.router, self.endpoints, self.endpoints_meta)
    }
}

pub(crate) mod paths {
    pub const HEALTHZ: &str = "/healthz";
    pub const ABOUT: &str = "/about";
    pub const SPEC_OPENAPI: &str = "/spec/openapi.json";
    pub const DASHBOARD: &str = "/api/dashboard";
    pub const OBSERVATIONS: &str = "/api/observations";
    pub const OBSERVATIONS_RECENT: &str = "/api/observations/recent";
    pub const OBSERVATIONS_OPTIONS: &str = "/api/observations/options";
    pub const SPECIES: &str = "/api/species";
    pub const SPECIES_SEARCH: &str = "/api/species/search";
    pub const SPECIES_ACTIONS: &str = "/api/species/{id}/actions";
    pub const OBSERVERS: &str = "/api/observers";
    pub const LOCATIONS: &str = "/api/locations";
    pub const ACTIONS: &str = "/api/actions";
    pub const TABLES: &str = "/api/tables/{table}";
    pub const DB_STATUS: &str = "/api/db/status";
    pub const DB_INIT: &str = "/api/db/init";
    pub const UI_ROOT: &str = "/";
    pub const UI_DASHBOARD: &str = "/ui/dashboard";
    pub const UI_OBSERVE: &str = "/ui/observe";
    pub const UI_CATALOG: &str = "/ui/catalog";
    pub const UI_SEARCH: &str = "/ui/search";
    pub const UI_ACTIONS: &str = "/ui/actions";
    pub const UI_DB: &str = "/ui/db";
    pub const UI_APP_JS: &str = "/ui/assets/app.js";
    pub const UI_APP_CSS: &str = "/ui/assets/app.css";
}

pub(crate) fn build_router() -> (Router<AppState>, Vec<String>, Vec<Value>) {
    let mut builder = RouterBuilder::new();
    builder.route_get(paths::HEALTHZ, api::meta::healthz, Some(Stability::Stable));
    builder.route_get(paths::ABOUT, api::meta::about, Some(Stability::Stable));
    builder.route_get(
        paths::SPEC_OPENAPI,
        api::meta::openapi_json,
        Some(Stability::Beta),
    );
    builder.route_get(
        paths::DASHBOARD,
        api::dashboard::dashboard,
        Some(Stability::Stable),
    );
    register_observation_routes(&mut builder);
    register_catalog_routes(&mut builder);
    builder.route_get(paths::TABLES, api::tables::browse, Some(Stability::Beta));
    builder.route_get(paths::DB_STATUS, api::db::status, Some(Stability::Stable));
    builder.route_post(paths::DB_INIT, api::db::init, Some(Stability::Stable));
    register_ui_routes(&mut builder);
    builder.build()
}

fn register_observation_routes(builder: &mut RouterBuilder) {
    builder.route_get(
        paths::OBSERVATIONS_RECENT,
        api::observations::recent,
        Some(Stability::Stable),
    );
    builder.route_get(
        paths::OBSERVATIONS_OPTIONS,
        api::observations::options,
        Some(Stability::Stable),
    );
    builder.route_post(
        paths::OBSERVATIONS,
        api::observations::submit,
        Some(Stability::Stable),
    );
}

fn register_catalog_routes(builder: &mut RouterBuilder) {
    builder.route_get(
        paths::SPECIES,
        api::catalog::species_list,
        Some(Stability::Stable),
    );
    builder.route_post(
        paths::SPECIES,
        api::catalog::species_add,
        Some(Stability::Stable),
    );
    builder.route_get(
        paths::SPECIES_SEARCH,
        api::search::search_species,
        Some(Stability::Stable),
    );
    builder.route_get(
        paths::SPECIES_ACTIONS,
        api::search::species_actions,
        Some(Stability::Stable),
    );
    builder.route_get(
        paths::OBSERVERS,
        api::catalog::observers_list,
        Some(Stability::Stable),
    );
    builder.route_post(
        paths::OBSERVERS,
        api::catalog::observers_add,
        Some(Stability::Stable),
    );
    builder.route_get(
        paths::LOCATIONS,
        api::catalog::locations_list,
        Some(Stability::Stable),
    );
    builder.route_post(
        paths::LOCATIONS,
        api::catalog::locations_add,
        Some(Stability::Beta),
    );
    builder.route_get(
        paths::ACTIONS,
        api::actions::actions_list,
        Some(Stability::Stable),
    );
    builder.route_post(
        paths::ACTIONS,
        api::actions::actions_add,
        Some(Stability::Stable),
    );
}

fn register_ui_routes(builder: &mut RouterBuilder) {
    builder.route_get(paths::UI_ROOT, api::ui::index, None);
    builder.route_get(paths::UI_DASHBOARD, api::ui::dashboard_ui, None);
    builder.route_get(paths::UI_OBSERVE, api::ui::observe_ui, None);
    builder.route_get(paths::UI_CATALOG, api::ui::catalog_ui, None);
    builder.route_get(paths::UI_SEARCH, api::ui::search_ui, None);
    builder.route_get(paths::UI_ACTIONS, api::ui::actions_ui, None);
    builder.route_get(paths::UI_DB, api::ui::db_ui, None);
    builder.route_get(paths::UI_APP_JS, api::ui::app_js, None);
    builder.route_get(paths::UI_APP_CSS, api::ui::app_css, None);
}
