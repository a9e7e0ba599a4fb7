//! POST /files/transfer

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::error::FilegateError;
use crate::fileops::info::FileInfo;
use crate::fileops::transfer::{transfer as do_transfer, TransferMode, TransferRequest};
use crate::http::state::AppState;
use crate::ownership::Ownership;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferBody {
	pub from: String,
	pub to: String,
	pub mode: String,
	#[serde(default)]
	pub ensure_unique_name: bool,
	pub owner_uid: Option<u32>,
	pub owner_gid: Option<u32>,
	pub file_mode: Option<String>,
	pub dir_mode: Option<String>,
}

#[utoipa::path(
	post,
	path = "/files/transfer",
	request_body = TransferBody,
	responses((status = 200, description = "Move or copy completed", body = FileInfo)),
	tag = "files"
)]
pub async fn transfer(
	State(state): State<AppState>,
	Json(body): Json<TransferBody>,
) -> Result<Json<FileInfo>, FilegateError> {
	let mode = match body.mode.as_str() {
		"move" => TransferMode::Move,
		"copy" => TransferMode::Copy,
		other => return Err(FilegateError::bad_request(format!("unknown transfer mode: {}", other))),
	};

	let ownership = build_ownership(&body)?;

	let info = do_transfer(
		&state.gate,
		state.index.as_deref(),
		TransferRequest {
			from: &body.from,
			to: &body.to,
			mode,
			ensure_unique_name: body.ensure_unique_name,
			ownership: ownership.as_ref(),
		},
	)?;

	Ok(Json(info))
}

fn build_ownership(body: &TransferBody) -> Result<Option<Ownership>, FilegateError> {
	match (body.owner_uid, body.owner_gid, &body.file_mode) {
		(None, None, None) => Ok(None),
		(Some(uid), Some(gid), Some(file_mode)) => {
			let file_mode = crate::ownership::parse_mode(file_mode)?;
			let dir_mode = body.dir_mode.as_ref().map(|m| crate::ownership::parse_mode(m)).transpose()?;
			Ok(Some(Ownership::new(uid, gid, file_mode, dir_mode)?))
		}
		_ => Err(FilegateError::bad_request(
			"ownerUid, ownerGid, and fileMode must all be supplied together",
		)),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn body(mode: &str) -> TransferBody {
		TransferBody {
			from: "/a".to_string(),
			to: "/b".to_string(),
			mode: mode.to_string(),
			ensure_unique_name: false,
			owner_uid: None,
			owner_gid: None,
			file_mode: None,
			dir_mode: None,
		}
	}

	#[test]
	fn build_ownership_requires_all_three_fields() {
		let mut b = body("copy");
		b.owner_uid = Some(1000);
		let err = build_ownership(&b).unwrap_err();
		assert_eq!(err.status, 400);
	}

	#[test]
	fn build_ownership_none_when_absent() {
		assert!(build_ownership(&body("copy")).unwrap().is_none());
	}
}

// vim: ts=4
