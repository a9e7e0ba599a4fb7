//! GET /files/thumbnail/image

use std::collections::HashMap;
use std::path::Path;

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::error::FilegateError;
use crate::pathgate::ValidateOptions;
use crate::thumbnail::{self, Fit, OutputFormat, Position, ThumbnailParams};

#[utoipa::path(
	get,
	path = "/files/thumbnail/image",
	params(("path" = String, Query, description = "Source image path")),
	responses(
		(status = 200, description = "Rendered thumbnail bytes"),
		(status = 304, description = "Not modified, matches If-None-Match or non-stale If-Modified-Since"),
	),
	tag = "files"
)]
pub async fn thumbnail(
	State(state): State<crate::http::state::AppState>,
	Query(params): Query<HashMap<String, String>>,
	headers: HeaderMap,
) -> Result<Response, FilegateError> {
	let path = params.get("path").ok_or_else(|| FilegateError::bad_request("path is required"))?;
	let gated = state.gate.validate(Path::new(path), ValidateOptions::default())?;

	let thumb_params = parse_params(&params)?;
	thumb_params.validate()?;

	let meta = std::fs::metadata(&gated.real_path)?;
	let mtime_ms = meta
		.modified()
		.ok()
		.and_then(|m| m.duration_since(std::time::UNIX_EPOCH).ok())
		.map(|d| d.as_millis() as i64)
		.unwrap_or(0);
	let etag = thumbnail::compute_etag(&gated.real_path, mtime_ms, &thumb_params);

	let if_none_match_hit =
		thumbnail::matches_if_none_match(&etag, headers.get(header::IF_NONE_MATCH).and_then(|v| v.to_str().ok()));
	let if_modified_since_fresh =
		is_fresh_for_if_modified_since(mtime_ms, headers.get(header::IF_MODIFIED_SINCE).and_then(|v| v.to_str().ok()));

	if if_none_match_hit || if_modified_since_fresh {
		return Ok(StatusCode::NOT_MODIFIED.into_response());
	}

	let rendered = thumbnail::render(&gated.real_path, &thumb_params)?;

	let last_modified = httpdate::fmt_http_date(std::time::UNIX_EPOCH + std::time::Duration::from_millis(mtime_ms.max(0) as u64));

	Ok((
		[
			(header::CONTENT_TYPE, rendered.mime_type.to_string()),
			(header::CACHE_CONTROL, "public, max-age=31536000, immutable".to_string()),
			(header::ETAG, format!("\"{}\"", rendered.etag)),
			(header::LAST_MODIFIED, last_modified),
		],
		rendered.bytes,
	)
		.into_response())
}

/// Whether the source is non-stale relative to a raw `If-Modified-Since`
/// header value: true when the header parses and the source's mtime is not
/// newer than the date it carries.
fn is_fresh_for_if_modified_since(mtime_ms: i64, raw: Option<&str>) -> bool {
	let raw = match raw {
		Some(r) => r,
		None => return false,
	};
	let since = match httpdate::parse_http_date(raw) {
		Ok(t) => t,
		Err(_) => return false,
	};
	let mtime = std::time::UNIX_EPOCH + std::time::Duration::from_millis(mtime_ms.max(0) as u64);
	mtime <= since
}

fn parse_params(params: &HashMap<String, String>) -> Result<ThumbnailParams, FilegateError> {
	let mut out = ThumbnailParams::default();

	if let Some(w) = params.get("width") {
		out.width = w.parse().map_err(|_| FilegateError::bad_request("invalid width"))?;
	}
	if let Some(h) = params.get("height") {
		out.height = h.parse().map_err(|_| FilegateError::bad_request("invalid height"))?;
	}
	if let Some(fit) = params.get("fit") {
		out.fit = Fit::parse(fit).ok_or_else(|| FilegateError::bad_request("invalid fit"))?;
	}
	if let Some(position) = params.get("position") {
		out.position = Position::parse(position).ok_or_else(|| FilegateError::bad_request("invalid position"))?;
	}
	if let Some(format) = params.get("format") {
		out.format = OutputFormat::parse(format).ok_or_else(|| FilegateError::bad_request("invalid format"))?;
	}
	if let Some(q) = params.get("quality") {
		out.quality = q.parse().map_err(|_| FilegateError::bad_request("invalid quality"))?;
	}

	Ok(out)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parse_params_defaults_when_absent() {
		let params = HashMap::new();
		let out = parse_params(&params).unwrap();
		assert_eq!(out.width, 200);
		assert_eq!(out.format, OutputFormat::Webp);
	}

	#[test]
	fn parse_params_rejects_unknown_fit() {
		let mut params = HashMap::new();
		params.insert("fit".to_string(), "zoom".to_string());
		let err = parse_params(&params).unwrap_err();
		assert_eq!(err.status, 400);
	}

	#[test]
	fn parse_params_reads_overrides() {
		let mut params = HashMap::new();
		params.insert("width".to_string(), "64".to_string());
		params.insert("format".to_string(), "png".to_string());
		let out = parse_params(&params).unwrap();
		assert_eq!(out.width, 64);
		assert_eq!(out.format, OutputFormat::Png);
	}

	#[test]
	fn if_modified_since_absent_is_not_fresh() {
		assert!(!is_fresh_for_if_modified_since(1_700_000_000_000, None));
	}

	#[test]
	fn if_modified_since_unparsable_is_not_fresh() {
		assert!(!is_fresh_for_if_modified_since(1_700_000_000_000, Some("not a date")));
	}

	#[test]
	fn if_modified_since_newer_than_mtime_is_fresh() {
		let mtime_ms = 1_700_000_000_000i64;
		let since = std::time::UNIX_EPOCH + std::time::Duration::from_millis(mtime_ms as u64 + 60_000);
		let header = httpdate::fmt_http_date(since);
		assert!(is_fresh_for_if_modified_since(mtime_ms, Some(&header)));
	}

	#[test]
	fn if_modified_since_older_than_mtime_is_not_fresh() {
		let mtime_ms = 1_700_000_000_000i64;
		let since = std::time::UNIX_EPOCH + std::time::Duration::from_millis(mtime_ms as u64 - 60_000);
		let header = httpdate::fmt_http_date(since);
		assert!(!is_fresh_for_if_modified_since(mtime_ms, Some(&header)));
	}
}

// vim: ts=4
