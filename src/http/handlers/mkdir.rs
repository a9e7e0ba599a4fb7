//! POST /files/mkdir

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::error::FilegateError;
use crate::http::handlers::content::parse_ownership_headers;
use crate::http::state::AppState;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct MkdirRequest {
	pub path: String,
}

#[utoipa::path(
	post,
	path = "/files/mkdir",
	request_body = MkdirRequest,
	responses((status = 201, description = "Directory created")),
	tag = "files"
)]
pub async fn mkdir(
	State(state): State<AppState>,
	headers: axum::http::HeaderMap,
	Json(req): Json<MkdirRequest>,
) -> Result<Response, FilegateError> {
	let ownership = parse_ownership_headers(&headers)?;
	let info = crate::fileops::mkdir::mkdir(&state.gate, &req.path, ownership.as_ref())?;
	Ok((StatusCode::CREATED, Json(info)).into_response())
}

// vim: ts=4
