use utoipa::{OpenApi, ToSchema};

#[allow(dead_code)]
#[derive(ToSchema)]
pub struct HealthOk {
    pub ok: bool,
}

#[allow(dead_code)]
#[derive(ToSchema)]
pub struct AboutResponse {
    pub service: String,
    pub version: String,
    pub db_path: String,
    pub admin_token: bool,
    #[schema(example = json!( ["GET /healthz", "GET /about"] ))]
    pub endpoints: Vec<String>,
    #[schema(value_type = Vec<serde_json::Value>)]
    pub endpoints_meta: Vec<serde_json::Value>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::meta::healthz,
        crate::api::meta::about,
        crate::api::dashboard::dashboard,
        crate::api::observations::recent,
        crate::api::observations::options,
        crate::api::observations::submit,
        crate::api::catalog::species_list,
        crate::api::catalog::species_add,
        crate::api::catalog::observers_list,
        crate::api::catalog::observers_add,
        crate::api::catalog::locations_list,
        crate::api::catalog::locations_add,
        crate::api::search::search_species,
        crate::api::search::species_actions,
        crate::api::actions::actions_list,
        crate::api::actions::actions_add,
        crate::api::tables::browse,
        crate::api::db::status,
        crate::api::db::init,
    ),
    components(schemas(HealthOk, AboutResponse)),
    tags(
        (name = "Meta", description = "Service metadata and health"),
        (name = "Dashboard", description = "Headline metrics"),
        (name = "Observations", description = "Sightings and the observation form"),
        (name = "Catalog", description = "Species, observers and locations"),
        (name = "Search", description = "Species lookup with conservation actions"),
        (name = "Actions", description = "Conservation actions"),
        (name = "Tables", description = "Whitelisted raw table reads"),
        (name = "Database", description = "Schema status and initialisation")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_api_paths() {
        let doc = ApiDoc::openapi();
        let json = doc.to_json().unwrap();
        for path in ["/api/dashboard", "/api/species/{id}/actions", "/api/db/init"] {
            assert!(json.contains(path), "missing {path}");
        }
    }
}
