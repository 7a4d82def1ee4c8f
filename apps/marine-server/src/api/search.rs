use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::response::Response;
use marine_kernel::model::{ConservationAction, SpeciesMatch};
use serde::{Deserialize, Serialize};

use crate::{responses, AppState};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
struct SearchHit {
    #[serde(flatten)]
    species: SpeciesMatch,
    actions: Vec<ConservationAction>,
}

/// Name search over common and scientific names, each hit with its actions.
#[utoipa::path(
    get,
    path = "/api/species/search",
    tag = "Search",
    params(("q" = String, Query, description = "Substring of the common or scientific name")),
    responses(
        (status = 200, description = "Matching species", body = serde_json::Value),
        (status = 400, description = "Empty search term"),
    )
)]
pub async fn search_species(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Response {
    let Query(q) = match query {
        Ok(q) => q,
        Err(rejection) => return responses::bad_query(rejection),
    };
    let kernel = state.kernel();
    let matches = match kernel.search_species_async(q.q).await {
        Ok(rows) => rows,
        Err(err) => return responses::kernel_error(&err),
    };
    let mut hits = Vec::with_capacity(matches.len());
    for species in matches {
        let actions = match kernel
            .actions_for_species_async(species.species.species_id)
            .await
        {
            Ok(actions) => actions,
            Err(err) => return responses::kernel_error(&err),
        };
        hits.push(SearchHit { species, actions });
    }
    responses::json_ok(hits)
}

#[utoipa::path(
    get,
    path = "/api/species/{id}/actions",
    tag = "Search",
    params(("id" = i64, Path, description = "Species id")),
    responses(
        (status = 200, description = "Conservation actions for the species", body = serde_json::Value),
        (status = 404, description = "Unknown species"),
    )
)]
pub async fn species_actions(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match state.kernel().actions_for_species_async(id).await {
        Ok(actions) => responses::json_ok(actions),
        Err(err) => responses::kernel_error(&err),
    }
}
