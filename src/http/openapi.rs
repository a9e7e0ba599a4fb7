//! OpenAPI document generation and Swagger UI mounting, served at `/files/docs`.

use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::fileops::info::{DirInfo, EntryType, FileInfo};
use crate::http::state::AppState;
use crate::search::SearchResponse;
use crate::upload::engine::{UploadChunkResponse, UploadStartResponse};

#[derive(OpenApi)]
#[openapi(
	paths(
		crate::http::handlers::info::info,
		crate::http::handlers::content::download,
		crate::http::handlers::content::upload,
		crate::http::handlers::mkdir::mkdir,
		crate::http::handlers::delete::delete,
		crate::http::handlers::transfer::transfer,
		crate::http::handlers::search::search,
		crate::http::handlers::thumbnail::thumbnail,
		crate::http::handlers::upload::start,
		crate::http::handlers::upload::chunk,
	),
	components(schemas(FileInfo, DirInfo, EntryType, SearchResponse, UploadStartResponse, UploadChunkResponse)),
	tags((name = "files", description = "Sandboxed file operations"))
)]
struct ApiDoc;

pub fn openapi_router() -> Router<AppState> {
	Router::new().merge(SwaggerUi::new("/files/docs").url("/files/openapi.json", ApiDoc::openapi()))
}

/// `GET /files/docs.md` — a plain-text method/path/summary table rendered
/// from the same `utoipa::OpenApi` document, for clients that would rather
/// grep a digest than load Swagger UI.
pub async fn docs_markdown() -> Response {
	let mut out = String::from("# Filegate API\n\n| Method | Path | Summary |\n|---|---|---|\n");

	let json = ApiDoc::openapi().to_pretty_json().unwrap_or_default();
	let value: serde_json::Value = serde_json::from_str(&json).unwrap_or(serde_json::Value::Null);

	if let Some(paths) = value.get("paths").and_then(|p| p.as_object()) {
		let mut path_entries: Vec<_> = paths.iter().collect();
		path_entries.sort_by(|a, b| a.0.cmp(b.0));
		for (path, methods) in path_entries {
			let Some(methods) = methods.as_object() else { continue };
			let mut method_entries: Vec<_> = methods.iter().collect();
			method_entries.sort_by(|a, b| a.0.cmp(b.0));
			for (method, op) in method_entries {
				let summary = op.get("summary").and_then(|s| s.as_str()).unwrap_or("");
				out.push_str(&format!("| {} | {} | {} |\n", method.to_uppercase(), path, summary));
			}
		}
	}

	([(header::CONTENT_TYPE, "text/markdown; charset=utf-8")], out).into_response()
}

// vim: ts=4
