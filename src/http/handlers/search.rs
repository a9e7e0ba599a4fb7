//! GET /files/search

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::Json;

use crate::error::FilegateError;
use crate::http::handlers::parse_bool_param;
use crate::http::state::AppState;
use crate::search::{search as do_search, SearchRequest, SearchResponse};

#[utoipa::path(
	get,
	path = "/files/search",
	params(
		("paths" = String, Query, description = "Comma-separated allowed base paths to search under"),
		("pattern" = String, Query, description = "Glob pattern to match"),
	),
	responses((status = 200, description = "Matching entries", body = SearchResponse)),
	tag = "files"
)]
pub async fn search(
	State(state): State<AppState>,
	Query(params): Query<HashMap<String, String>>,
) -> Result<Json<SearchResponse>, FilegateError> {
	let base_paths_raw =
		params.get("paths").ok_or_else(|| FilegateError::bad_request("paths is required"))?;
	let base_paths: Vec<String> =
		base_paths_raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect();

	let pattern = params.get("pattern").ok_or_else(|| FilegateError::bad_request("pattern is required"))?;
	let limit: usize = params
		.get("limit")
		.map(|v| v.parse())
		.transpose()
		.map_err(|_| FilegateError::bad_request("invalid limit"))?
		.unwrap_or(state.config.search_max_results);

	let files = parse_bool_param(params.get("files"), true);
	let directories = parse_bool_param(params.get("directories"), false);
	let show_hidden = parse_bool_param(params.get("showHidden"), false);

	let resp = do_search(
		&state.gate,
		SearchRequest {
			base_paths: &base_paths,
			pattern,
			limit: limit.min(state.config.search_max_results),
			files,
			directories,
			show_hidden,
			max_recursive_wildcards: state.config.search_max_recursive_wildcards,
		},
	)?;

	Ok(Json(resp))
}

// vim: ts=4
