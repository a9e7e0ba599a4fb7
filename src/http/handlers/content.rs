//! GET/PUT /files/content

use std::collections::HashMap;
use std::path::Path;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tokio_util::io::ReaderStream;

use crate::archive::{archive_name, stream_tar};
use crate::error::FilegateError;
use crate::fileops::download::{content_disposition, prepare_dir_download, prepare_file_download};
use crate::fileops::info::FileInfo;
use crate::fileops::upload_single::upload_single_file;
use crate::http::handlers::parse_bool_param;
use crate::http::state::AppState;
use crate::ownership::Ownership;
use crate::pathgate::ValidateOptions;

#[utoipa::path(
	get,
	path = "/files/content",
	params(("path" = String, Query, description = "File or directory to download")),
	responses((status = 200, description = "File bytes, or a tar stream for directories")),
	tag = "files"
)]
pub async fn download(
	State(state): State<AppState>,
	Query(params): Query<HashMap<String, String>>,
) -> Result<Response, FilegateError> {
	let path = params.get("path").ok_or_else(|| FilegateError::bad_request("path is required"))?;
	let inline = parse_bool_param(params.get("inline"), false);

	let gated = state.gate.validate(Path::new(path), ValidateOptions::default())?;
	let meta = std::fs::metadata(&gated.real_path)?;

	if meta.is_dir() {
		let info = prepare_dir_download(&gated.real_path, state.config.max_download_bytes)?;
		let body = Body::from_stream(ReaderStream::new(stream_tar(info.path)));
		let disposition = content_disposition(&archive_name(&gated.real_path), false);
		Ok((
			[
				(header::CONTENT_TYPE, "application/x-tar".to_string()),
				(header::CONTENT_DISPOSITION, disposition),
			],
			body,
		)
			.into_response())
	} else {
		let info = prepare_file_download(&gated.real_path, state.config.max_download_bytes)?;
		let file = tokio::fs::File::open(&info.path).await?;
		let body = Body::from_stream(ReaderStream::new(file));
		let disposition = content_disposition(&info.filename, inline);
		Ok((
			[
				(header::CONTENT_TYPE, info.mime_type),
				(header::CONTENT_LENGTH, info.size.to_string()),
				(header::CONTENT_DISPOSITION, disposition),
			],
			body,
		)
			.into_response())
	}
}

#[utoipa::path(
	put,
	path = "/files/content",
	responses((status = 201, description = "File stored", body = FileInfo)),
	tag = "files"
)]
pub async fn upload(
	State(state): State<AppState>,
	headers: axum::http::HeaderMap,
	body: Body,
) -> Result<Response, FilegateError> {
	let path = header_str(&headers, "x-file-path")
		.ok_or_else(|| FilegateError::bad_request("X-File-Path is required"))?;
	let filename = header_str(&headers, "x-file-name")
		.ok_or_else(|| FilegateError::bad_request("X-File-Name is required"))?;

	let ownership = parse_ownership_headers(&headers)?;

	let info = upload_single_file(
		&state.gate,
		&path,
		&filename,
		ownership.as_ref(),
		state.config.max_upload_bytes,
		body.into_data_stream(),
	)
	.await?;

	Ok((StatusCode::CREATED, Json(info)).into_response())
}

fn header_str(headers: &axum::http::HeaderMap, name: &str) -> Option<String> {
	headers.get(name).and_then(|v| v.to_str().ok()).map(|s| s.to_string())
}

pub fn parse_ownership_headers(headers: &axum::http::HeaderMap) -> Result<Option<Ownership>, FilegateError> {
	let uid = header_str(headers, "x-owner-uid");
	let gid = header_str(headers, "x-owner-gid");
	let file_mode = header_str(headers, "x-file-mode");
	let dir_mode = header_str(headers, "x-dir-mode");

	if uid.is_none() && gid.is_none() && file_mode.is_none() {
		return Ok(None);
	}

	let uid = crate::ownership::parse_id(
		&uid.ok_or_else(|| FilegateError::bad_request("X-Owner-UID is required with ownership"))?,
	)?;
	let gid = crate::ownership::parse_id(
		&gid.ok_or_else(|| FilegateError::bad_request("X-Owner-GID is required with ownership"))?,
	)?;
	let file_mode = crate::ownership::parse_mode(
		&file_mode.ok_or_else(|| FilegateError::bad_request("X-File-Mode is required with ownership"))?,
	)?;
	let dir_mode = dir_mode.map(|m| crate::ownership::parse_mode(&m)).transpose()?;

	Ok(Some(crate::ownership::Ownership::new(uid, gid, file_mode, dir_mode)?))
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::http::HeaderMap;

	#[test]
	fn no_ownership_headers_returns_none() {
		let headers = HeaderMap::new();
		assert!(parse_ownership_headers(&headers).unwrap().is_none());
	}

	#[test]
	fn partial_ownership_headers_is_an_error() {
		let mut headers = HeaderMap::new();
		headers.insert("x-owner-uid", "1000".parse().unwrap());
		let err = parse_ownership_headers(&headers).unwrap_err();
		assert_eq!(err.status, 400);
	}

	#[test]
	fn full_ownership_headers_parsed() {
		let mut headers = HeaderMap::new();
		headers.insert("x-owner-uid", "1000".parse().unwrap());
		headers.insert("x-owner-gid", "1000".parse().unwrap());
		headers.insert("x-file-mode", "644".parse().unwrap());
		let ownership = parse_ownership_headers(&headers).unwrap().unwrap();
		assert_eq!(ownership.uid, 1000);
		assert_eq!(ownership.dir_mode, 0o755);
	}
}

// vim: ts=4
