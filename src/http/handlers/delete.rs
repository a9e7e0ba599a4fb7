//! DELETE /files/delete

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::http::StatusCode;

use crate::error::FilegateError;
use crate::http::state::AppState;

#[utoipa::path(
	delete,
	path = "/files/delete",
	params(("path" = String, Query, description = "Path to delete, recursively if a directory")),
	responses((status = 204, description = "Deleted")),
	tag = "files"
)]
pub async fn delete(
	State(state): State<AppState>,
	Query(params): Query<HashMap<String, String>>,
) -> Result<StatusCode, FilegateError> {
	let path = params.get("path").ok_or_else(|| FilegateError::bad_request("path is required"))?;
	crate::fileops::delete::delete(&state.gate, path, state.index.as_deref())?;
	Ok(StatusCode::NO_CONTENT)
}

// vim: ts=4
