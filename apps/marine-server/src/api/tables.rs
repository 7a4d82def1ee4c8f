use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::response::Response;
use marine_kernel::Table;
use serde::Deserialize;

use crate::{responses, AppState};

const DEFAULT_BROWSE_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct BrowseQuery {
    /// Comma-separated column names; empty selects every column.
    #[serde(default)]
    pub columns: Option<String>,
    pub limit: Option<i64>,
}

fn split_columns(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

#[utoipa::path(
    get,
    path = "/api/tables/{table}",
    tag = "Tables",
    params(
        ("table" = String, Path, description = "Whitelisted table name"),
        ("columns" = Option<String>, Query, description = "Comma-separated column names"),
        ("limit" = Option<i64>, Query, description = "Rows to return (1-1000, default 100)"),
    ),
    responses(
        (status = 200, description = "Rows keyed by column", body = serde_json::Value),
        (status = 400, description = "Unknown table or column"),
    )
)]
pub async fn browse(
    State(state): State<AppState>,
    Path(table): Path<String>,
    query: Result<Query<BrowseQuery>, QueryRejection>,
) -> Response {
    let Query(q) = match query {
        Ok(q) => q,
        Err(rejection) => return responses::bad_query(rejection),
    };
    let table: Table = match table.parse() {
        Ok(t) => t,
        Err(err) => return responses::kernel_error(&err),
    };
    let columns = split_columns(q.columns.as_deref());
    let limit = q.limit.unwrap_or(DEFAULT_BROWSE_LIMIT);
    match state.kernel().browse_table_async(table, columns, limit).await {
        Ok(result) => responses::json_ok(result),
        Err(err) => responses::kernel_error(&err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_split_on_commas() {
        assert_eq!(
            split_columns(Some(" common_name, ,conservation_status ")),
            vec!["common_name".to_string(), "conservation_status".to_string()]
        );
        assert!(split_columns(None).is_empty());
        assert!(split_columns(Some("")).is_empty());
    }
}
