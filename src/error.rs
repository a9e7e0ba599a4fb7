//! Error types for Filegate operations
//!
//! Every component returns a discriminated result: success data, or a
//! `FilegateError` carrying the HTTP status that should be returned and a
//! short lowercase message safe to show to the caller.

use std::error::Error;
use std::fmt;
use std::io;

/// Unified error type for all Filegate operations
#[derive(Debug)]
pub struct FilegateError {
	pub status: u16,
	pub message: String,
}

impl FilegateError {
	pub fn new(status: u16, message: impl Into<String>) -> Self {
		FilegateError { status, message: message.into() }
	}

	pub fn bad_request(message: impl Into<String>) -> Self {
		Self::new(400, message)
	}

	pub fn forbidden(message: impl Into<String>) -> Self {
		Self::new(403, message)
	}

	pub fn not_found(message: impl Into<String>) -> Self {
		Self::new(404, message)
	}

	pub fn too_large(message: impl Into<String>) -> Self {
		Self::new(413, message)
	}

	pub fn internal(message: impl Into<String>) -> Self {
		Self::new(500, message)
	}
}

impl fmt::Display for FilegateError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}: {}", self.status, self.message)
	}
}

impl Error for FilegateError {}

impl From<io::Error> for FilegateError {
	fn from(e: io::Error) -> Self {
		match e.kind() {
			io::ErrorKind::NotFound => FilegateError::not_found("not found"),
			io::ErrorKind::PermissionDenied => {
				FilegateError::internal("permission denied (not root?)")
			}
			_ => FilegateError::internal(format!("i/o error: {}", e)),
		}
	}
}

impl From<rusqlite::Error> for FilegateError {
	fn from(e: rusqlite::Error) -> Self {
		FilegateError::internal(format!("index store error: {}", e))
	}
}

impl From<crate::pathgate::PathGateError> for FilegateError {
	fn from(e: crate::pathgate::PathGateError) -> Self {
		FilegateError::new(e.status, e.message)
	}
}

impl From<crate::ownership::OwnershipError> for FilegateError {
	fn from(e: crate::ownership::OwnershipError) -> Self {
		match e {
			crate::ownership::OwnershipError::InvalidFormat(m) => FilegateError::bad_request(m),
			crate::ownership::OwnershipError::PermissionDenied(m) => FilegateError::internal(m),
			crate::ownership::OwnershipError::InvalidId(m) => FilegateError::internal(m),
			crate::ownership::OwnershipError::Io(e) => e.into(),
		}
	}
}

impl From<crate::upload::UploadError> for FilegateError {
	fn from(e: crate::upload::UploadError) -> Self {
		match e {
			crate::upload::UploadError::Gate(g) => g.into(),
			crate::upload::UploadError::Ownership(o) => o.into(),
			crate::upload::UploadError::Io(e) => e.into(),
			crate::upload::UploadError::TooLarge(m) => FilegateError::too_large(m),
			crate::upload::UploadError::BadRequest(m) => FilegateError::bad_request(m),
			crate::upload::UploadError::NotFound(m) => FilegateError::not_found(m),
			crate::upload::UploadError::ChecksumMismatch { expected, actual } => {
				FilegateError::internal(format!(
					"checksum mismatch: expected {}, got {}",
					expected, actual
				))
			}
			crate::upload::UploadError::MissingChunks(idx) => {
				FilegateError::internal(format!("missing chunks: {:?}", idx))
			}
		}
	}
}

impl From<crate::search::SearchError> for FilegateError {
	fn from(e: crate::search::SearchError) -> Self {
		FilegateError::bad_request(e.to_string())
	}
}

impl axum::response::IntoResponse for FilegateError {
	fn into_response(self) -> axum::response::Response {
		let status = axum::http::StatusCode::from_u16(self.status)
			.unwrap_or(axum::http::StatusCode::INTERNAL_SERVER_ERROR);
		(status, axum::Json(serde_json::json!({ "error": self.message }))).into_response()
	}
}

// vim: ts=4
