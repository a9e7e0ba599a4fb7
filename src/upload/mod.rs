//! Resumable chunked-upload engine
//!
//! Content-addressed upload sessions staged under `uploadTempDir`. The
//! streaming-hash-while-writing pattern (hash accumulated alongside bytes
//! written, verified once the stream ends) is grounded in the retrieved
//! `attic` upload handler; the assembly keyed-lock is this crate's own
//! generalization of a single-writer-per-session invariant.

pub mod engine;
pub mod janitor;
pub mod meta;

use std::error::Error;
use std::fmt;

pub use engine::UploadEngine;
pub use meta::UploadMeta;

#[derive(Debug)]
pub enum UploadError {
	Gate(crate::pathgate::PathGateError),
	Ownership(crate::ownership::OwnershipError),
	Io(std::io::Error),
	TooLarge(String),
	BadRequest(String),
	NotFound(String),
	ChecksumMismatch { expected: String, actual: String },
	MissingChunks(Vec<u64>),
}

impl fmt::Display for UploadError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			UploadError::Gate(e) => write!(f, "{}", e),
			UploadError::Ownership(e) => write!(f, "{}", e),
			UploadError::Io(e) => write!(f, "{}", e),
			UploadError::TooLarge(m) => write!(f, "{}", m),
			UploadError::BadRequest(m) => write!(f, "{}", m),
			UploadError::NotFound(m) => write!(f, "{}", m),
			UploadError::ChecksumMismatch { expected, actual } => {
				write!(f, "checksum mismatch: expected {}, got {}", expected, actual)
			}
			UploadError::MissingChunks(idx) => write!(f, "missing chunks: {:?}", idx),
		}
	}
}

impl Error for UploadError {}

impl From<std::io::Error> for UploadError {
	fn from(e: std::io::Error) -> Self {
		UploadError::Io(e)
	}
}

impl From<crate::pathgate::PathGateError> for UploadError {
	fn from(e: crate::pathgate::PathGateError) -> Self {
		UploadError::Gate(e)
	}
}

impl From<crate::ownership::OwnershipError> for UploadError {
	fn from(e: crate::ownership::OwnershipError) -> Self {
		UploadError::Ownership(e)
	}
}

/// `uploadId = first 16 hex chars of SHA-256(path + ":" + filename + ":" + checksum)`
///
/// Deterministic so an identical retry resumes the same session directory.
pub fn compute_upload_id(path: &str, filename: &str, checksum: &str) -> String {
	use sha2::{Digest, Sha256};
	let mut hasher = Sha256::new();
	hasher.update(path.as_bytes());
	hasher.update(b":");
	hasher.update(filename.as_bytes());
	hasher.update(b":");
	hasher.update(checksum.as_bytes());
	let digest = hasher.finalize();
	hex::encode(&digest[..8])
}

pub fn total_chunks(size: u64, chunk_size: u64) -> u64 {
	if chunk_size == 0 {
		return 0;
	}
	(size + chunk_size - 1) / chunk_size
}


// vim: ts=4
