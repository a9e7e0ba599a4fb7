//! Upload session metadata persisted as `<tempDir>/<uploadId>/meta.json`

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ownership::Ownership;
use crate::upload::UploadError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnershipMeta {
	pub uid: u32,
	pub gid: u32,
	pub file_mode: u32,
	pub dir_mode: u32,
}

impl From<Ownership> for OwnershipMeta {
	fn from(o: Ownership) -> Self {
		OwnershipMeta { uid: o.uid, gid: o.gid, file_mode: o.file_mode, dir_mode: o.dir_mode }
	}
}

impl From<OwnershipMeta> for Ownership {
	fn from(m: OwnershipMeta) -> Self {
		Ownership { uid: m.uid, gid: m.gid, file_mode: m.file_mode, dir_mode: m.dir_mode }
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadMeta {
	pub upload_id: String,
	pub path: String,
	pub filename: String,
	pub size: u64,
	pub checksum: String,
	pub chunk_size: u64,
	pub total_chunks: u64,
	pub ownership: Option<OwnershipMeta>,
	pub created_at: i64,
}

impl UploadMeta {
	pub fn session_dir(temp_dir: &Path, upload_id: &str) -> PathBuf {
		temp_dir.join(upload_id)
	}

	pub fn meta_path(temp_dir: &Path, upload_id: &str) -> PathBuf {
		Self::session_dir(temp_dir, upload_id).join("meta.json")
	}

	pub fn load(temp_dir: &Path, upload_id: &str) -> Result<Option<Self>, UploadError> {
		let path = Self::meta_path(temp_dir, upload_id);
		match std::fs::read(&path) {
			Ok(bytes) => {
				let meta: UploadMeta = serde_json::from_slice(&bytes)
					.map_err(|e| UploadError::BadRequest(format!("corrupt upload metadata: {}", e)))?;
				Ok(Some(meta))
			}
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
			Err(e) => Err(e.into()),
		}
	}

	pub fn save_to(&self, temp_dir: &Path) -> Result<(), UploadError> {
		let dir = Self::session_dir(temp_dir, &self.upload_id);
		std::fs::create_dir_all(&dir)?;
		let bytes = serde_json::to_vec_pretty(self)
			.map_err(|e| UploadError::BadRequest(format!("cannot serialize metadata: {}", e)))?;
		std::fs::write(Self::meta_path(temp_dir, &self.upload_id), bytes)?;
		Ok(())
	}
}


// vim: ts=4
