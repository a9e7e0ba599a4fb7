//! GET /files/info

use std::collections::HashMap;
use std::path::Path;

use axum::extract::{Query, State};
use axum::Json;
use serde_json::Value;

use crate::error::FilegateError;
use crate::fileops::info::{build_dir_info, build_file_info, find_file_id_under};
use crate::http::handlers::parse_bool_param;
use crate::http::state::AppState;
use crate::pathgate::ValidateOptions;

#[utoipa::path(
	get,
	path = "/files/info",
	params(("path" = String, Query, description = "Path to stat, relative to an allowed base")),
	responses((status = 200, description = "File or directory metadata")),
	tag = "files"
)]
pub async fn info(
	State(state): State<AppState>,
	Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, FilegateError> {
	let path = params.get("path").ok_or_else(|| FilegateError::bad_request("path is required"))?;
	let show_hidden = parse_bool_param(params.get("showHidden"), false);
	let compute_sizes = parse_bool_param(params.get("computeSizes"), false);

	let gated = state.gate.validate(Path::new(path), ValidateOptions::default())?;
	let meta = std::fs::metadata(&gated.real_path)?;

	if meta.is_dir() {
		let index_ref = state.index.as_deref();
		let mut dir_info =
			build_dir_info(&gated.real_path, show_hidden, compute_sizes, index_ref, Some(&gated.base_path))?;
		if let Some(idx) = index_ref {
			dir_info.info.file_id = find_file_id_under(idx, &gated.base_path, &gated.real_path);
		}
		Ok(Json(serde_json::to_value(dir_info).unwrap()))
	} else {
		let mut file_info = build_file_info(&gated.real_path, None, false)?;
		if let Some(idx) = &state.index {
			file_info.file_id = find_file_id_under(idx, &gated.base_path, &gated.real_path);
		}
		Ok(Json(serde_json::to_value(file_info).unwrap()))
	}
}


// vim: ts=4
