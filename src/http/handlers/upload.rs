//! POST /files/upload/start and POST /files/upload/chunk

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::error::FilegateError;
use crate::http::handlers::content::parse_ownership_headers;
use crate::http::state::AppState;
use crate::upload::engine::{UploadChunkResponse, UploadStartRequest, UploadStartResponse};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartBody {
	pub path: String,
	pub filename: String,
	pub size: u64,
	pub checksum: String,
	pub chunk_size: u64,
}

#[utoipa::path(
	post,
	path = "/files/upload/start",
	request_body = StartBody,
	responses((status = 200, description = "Upload session opened or resumed", body = UploadStartResponse)),
	tag = "files"
)]
pub async fn start(
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(body): Json<StartBody>,
) -> Result<Json<crate::upload::engine::UploadStartResponse>, FilegateError> {
	let ownership = parse_ownership_headers(&headers)?;

	let resp = state
		.uploads
		.start(UploadStartRequest {
			path: body.path,
			filename: body.filename,
			size: body.size,
			checksum: body.checksum,
			chunk_size: body.chunk_size,
			ownership,
		})
		.await
		.map_err(FilegateError::from)?;

	Ok(Json(resp))
}

#[utoipa::path(
	put,
	path = "/files/upload/chunk",
	responses((status = 200, description = "Chunk accepted", body = UploadChunkResponse)),
	tag = "files"
)]
pub async fn chunk(
	State(state): State<AppState>,
	headers: HeaderMap,
	body: Body,
) -> Result<Response, FilegateError> {
	let upload_id = header_str(&headers, "x-upload-id")
		.ok_or_else(|| FilegateError::bad_request("X-Upload-Id is required"))?;
	let chunk_index: u64 = header_str(&headers, "x-chunk-index")
		.ok_or_else(|| FilegateError::bad_request("X-Chunk-Index is required"))?
		.parse()
		.map_err(|_| FilegateError::bad_request("X-Chunk-Index must be a number"))?;
	let checksum = header_str(&headers, "x-chunk-checksum");

	let result = state
		.uploads
		.upload_chunk(&upload_id, chunk_index, checksum, body.into_data_stream())
		.await
		.map_err(FilegateError::from)?;

	let status = match &result {
		UploadChunkResponse::Completed { .. } => StatusCode::OK,
		UploadChunkResponse::Progress { .. } => StatusCode::OK,
	};

	Ok((status, Json(result)).into_response())
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
	headers.get(name).and_then(|v| v.to_str().ok()).map(|s| s.to_string())
}


// vim: ts=4
