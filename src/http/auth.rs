//! Bearer-token authentication middleware for `/files/*`

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::http::state::AppState;

pub async fn require_bearer_token(
	State(state): State<AppState>,
	req: Request,
	next: Next,
) -> Response {
	let header = req
		.headers()
		.get(axum::http::header::AUTHORIZATION)
		.and_then(|v| v.to_str().ok());

	let token = header.and_then(|v| v.strip_prefix("Bearer "));

	match token {
		Some(t) if t == state.config.file_proxy_token => next.run(req).await,
		_ => unauthorized(),
	}
}

fn unauthorized() -> Response {
	(StatusCode::UNAUTHORIZED, Json(serde_json::json!({ "error": "unauthorized" }))).into_response()
}


// vim: ts=4
