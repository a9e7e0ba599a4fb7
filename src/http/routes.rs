//! Route table: everything under `/files` requires a bearer token except
//! `/health`, the OpenAPI/Swagger docs, and the plain markdown digest.

use axum::http::StatusCode;
use axum::middleware;
use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::http::auth::require_bearer_token;
use crate::http::handlers::{content, delete as delete_handler, info, mkdir, search, thumbnail, transfer, upload};
use crate::http::openapi::{docs_markdown, openapi_router};
use crate::http::state::AppState;

pub fn build_router(state: AppState) -> Router {
	let files = Router::new()
		.route("/files/info", get(info::info))
		.route("/files/content", get(content::download).put(content::upload))
		.route("/files/mkdir", post(mkdir::mkdir))
		.route("/files/delete", delete(delete_handler::delete))
		.route("/files/transfer", post(transfer::transfer))
		.route("/files/search", get(search::search))
		.route("/files/thumbnail/image", get(thumbnail::thumbnail))
		.route("/files/upload/start", post(upload::start))
		.route("/files/upload/chunk", put(upload::chunk))
		.route_layer(middleware::from_fn_with_state(state.clone(), require_bearer_token));

	Router::new()
		.route("/health", get(health))
		.route("/files/docs.md", get(docs_markdown))
		.merge(openapi_router())
		.merge(files)
		.layer(tower_http::trace::TraceLayer::new_for_http())
		.layer(tower_http::cors::CorsLayer::permissive())
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::Config;
	use tower::ServiceExt;

	fn test_state() -> AppState {
		let tmp = tempfile::TempDir::new().unwrap();
		let config = Config {
			file_proxy_token: "secret-token".to_string(),
			allowed_base_paths: vec![tmp.path().to_path_buf()],
			port: 0,
			max_upload_bytes: 1000,
			max_download_bytes: 1000,
			max_chunk_bytes: 1000,
			search_max_results: 10,
			search_max_recursive_wildcards: 10,
			upload_expiry_secs: 3600,
			upload_temp_dir: tmp.path().join("uploads"),
			disk_cleanup_interval: std::time::Duration::from_secs(3600),
			enable_index: false,
			index_database_url: ":memory:".to_string(),
			index_rescan_interval: std::time::Duration::from_secs(3600),
			index_scan_concurrency: 1,
			dev_uid_override: None,
			dev_gid_override: None,
		};
		AppState::new(config)
	}

	#[tokio::test]
	async fn health_is_public() {
		let app = build_router(test_state());

		let response = app
			.oneshot(axum::http::Request::builder().uri("/health").body(axum::body::Body::empty()).unwrap())
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::OK);
	}

	#[tokio::test]
	async fn docs_markdown_is_public() {
		let app = build_router(test_state());

		let response = app
			.oneshot(axum::http::Request::builder().uri("/files/docs.md").body(axum::body::Body::empty()).unwrap())
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::OK);
		let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
		let text = String::from_utf8(body.to_vec()).unwrap();
		assert!(text.contains("/files/info"));
	}

	#[tokio::test]
	async fn files_routes_require_auth() {
		let app = build_router(test_state());

		let response = app
			.oneshot(
				axum::http::Request::builder()
					.uri("/files/info?path=/")
					.body(axum::body::Body::empty())
					.unwrap(),
			)
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
	}
}

// vim: ts=4
