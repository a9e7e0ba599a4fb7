//! Chunk session lifecycle: start, chunk ingestion, and assembly
//!
//! The streaming-hash-while-writing pattern below (hash accumulated while
//! bytes are written to the temp file, verified before the atomic rename)
//! follows the retrieved `attic` upload handler's `HashReader` approach.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::TryStreamExt;
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::io::StreamReader;

use crate::fileops::info::{build_file_info, FileInfo};
use crate::ownership::Ownership;
use crate::pathgate::{PathGate, ValidateOptions};
use crate::upload::meta::{OwnershipMeta, UploadMeta};
use crate::upload::{compute_upload_id, total_chunks, UploadError};

pub struct UploadStartRequest {
	pub path: String,
	pub filename: String,
	pub size: u64,
	pub checksum: String,
	pub chunk_size: u64,
	pub ownership: Option<Ownership>,
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadStartResponse {
	pub upload_id: String,
	pub total_chunks: u64,
	pub chunk_size: u64,
	pub uploaded_chunks: Vec<u64>,
	pub completed: bool,
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
#[serde(untagged, rename_all = "camelCase")]
pub enum UploadChunkResponse {
	Progress { chunk_index: u64, uploaded_chunks: Vec<u64>, completed: bool },
	Completed { completed: bool, file: FileInfo },
}

/// Owns the per-session assembly locks; one engine instance per process.
pub struct UploadEngine {
	temp_dir: PathBuf,
	max_upload_bytes: u64,
	max_chunk_bytes: u64,
	gate: Arc<PathGate>,
	assembly_locks: AsyncMutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl UploadEngine {
	pub fn new(temp_dir: PathBuf, max_upload_bytes: u64, max_chunk_bytes: u64, gate: Arc<PathGate>) -> Self {
		UploadEngine { temp_dir, max_upload_bytes, max_chunk_bytes, gate, assembly_locks: AsyncMutex::new(HashMap::new()) }
	}

	async fn lock_for(&self, upload_id: &str) -> Arc<AsyncMutex<()>> {
		let mut locks = self.assembly_locks.lock().await;
		locks.entry(upload_id.to_string()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
	}

	pub async fn start(&self, req: UploadStartRequest) -> Result<UploadStartResponse, UploadError> {
		if req.size > self.max_upload_bytes {
			return Err(UploadError::TooLarge("upload exceeds maximum size".to_string()));
		}
		if req.chunk_size > self.max_chunk_bytes {
			return Err(UploadError::BadRequest("chunk size exceeds maximum".to_string()));
		}

		let upload_id = compute_upload_id(&req.path, &req.filename, &req.checksum);
		let target = format!("{}/{}", req.path.trim_end_matches('/'), req.filename);
		self.gate.validate(
			Path::new(&target),
			ValidateOptions { create_parents: true, ownership: req.ownership.as_ref(), ..Default::default() },
		)?;

		if let Some(mut meta) = UploadMeta::load(&self.temp_dir, &upload_id)? {
			meta.created_at = crate::index::now_ms();
			meta.save_to(&self.temp_dir)?;
			let uploaded_chunks = self.list_committed_chunks(&upload_id)?;
			return Ok(UploadStartResponse {
				upload_id,
				total_chunks: meta.total_chunks,
				chunk_size: meta.chunk_size,
				uploaded_chunks,
				completed: false,
			});
		}

		let total = total_chunks(req.size, req.chunk_size);
		let meta = UploadMeta {
			upload_id: upload_id.clone(),
			path: req.path,
			filename: req.filename,
			size: req.size,
			checksum: req.checksum,
			chunk_size: req.chunk_size,
			total_chunks: total,
			ownership: req.ownership.map(OwnershipMeta::from),
			created_at: crate::index::now_ms(),
		};
		meta.save_to(&self.temp_dir)?;

		Ok(UploadStartResponse {
			upload_id,
			total_chunks: total,
			chunk_size: meta.chunk_size,
			uploaded_chunks: Vec::new(),
			completed: false,
		})
	}

	fn list_committed_chunks(&self, upload_id: &str) -> Result<Vec<u64>, UploadError> {
		let dir = UploadMeta::session_dir(&self.temp_dir, upload_id);
		let mut out = Vec::new();
		if let Ok(entries) = std::fs::read_dir(&dir) {
			for entry in entries.flatten() {
				let name = entry.file_name();
				let name = name.to_string_lossy();
				if name == "meta.json" || name.ends_with(".tmp") {
					continue;
				}
				if let Ok(idx) = name.parse::<u64>() {
					out.push(idx);
				}
			}
		}
		out.sort_unstable();
		Ok(out)
	}

	pub async fn upload_chunk<S, E>(
		&self,
		upload_id: &str,
		chunk_index: u64,
		expected_checksum: Option<String>,
		body: S,
	) -> Result<UploadChunkResponse, UploadError>
	where
		S: futures::Stream<Item = Result<bytes::Bytes, E>> + Unpin,
		E: std::error::Error + Send + Sync + 'static,
	{
		let meta = UploadMeta::load(&self.temp_dir, upload_id)?
			.ok_or_else(|| UploadError::NotFound("unknown upload id".to_string()))?;

		if chunk_index >= meta.total_chunks {
			return Err(UploadError::BadRequest("chunk index out of range".to_string()));
		}

		let session_dir = UploadMeta::session_dir(&self.temp_dir, upload_id);
		std::fs::create_dir_all(&session_dir)?;
		let tmp_path = session_dir.join(format!("{}.tmp", chunk_index));
		let final_path = session_dir.join(chunk_index.to_string());

		let mut reader =
			StreamReader::new(TryStreamExt::map_err(body, |e| std::io::Error::new(std::io::ErrorKind::Other, e)));
		let mut file = tokio::fs::File::create(&tmp_path).await?;
		let mut hasher = Sha256::new();
		let mut written: u64 = 0;
		let mut buf = [0u8; 64 * 1024];

		loop {
			use tokio::io::AsyncReadExt;
			let n = reader.read(&mut buf).await?;
			if n == 0 {
				break;
			}
			written += n as u64;
			if written > self.max_chunk_bytes {
				drop(file);
				let _ = tokio::fs::remove_file(&tmp_path).await;
				return Err(UploadError::TooLarge("chunk exceeds maximum size".to_string()));
			}
			hasher.update(&buf[..n]);
			file.write_all(&buf[..n]).await?;
		}
		file.flush().await?;
		drop(file);

		let digest = format!("sha256:{}", hex::encode(hasher.finalize()));
		if let Some(expected) = expected_checksum {
			if expected != digest {
				let _ = tokio::fs::remove_file(&tmp_path).await;
				return Err(UploadError::BadRequest(format!(
					"chunk checksum mismatch: expected {}, got {}",
					expected, digest
				)));
			}
		}

		tokio::fs::rename(&tmp_path, &final_path).await?;

		let uploaded = self.list_committed_chunks(upload_id)?;
		if uploaded.len() as u64 == meta.total_chunks {
			let file_info = self.assemble(upload_id, &meta).await?;
			return Ok(UploadChunkResponse::Completed { completed: true, file: file_info });
		}

		Ok(UploadChunkResponse::Progress {
			chunk_index,
			uploaded_chunks: uploaded,
			completed: false,
		})
	}

	async fn assemble(&self, upload_id: &str, meta: &UploadMeta) -> Result<FileInfo, UploadError> {
		let lock = self.lock_for(upload_id).await;
		let _guard = lock.lock().await;

		let session_dir = UploadMeta::session_dir(&self.temp_dir, upload_id);
		let uploaded = self.list_committed_chunks(upload_id)?;
		if uploaded.is_empty() {
			// another caller already assembled and cleaned up
			let target = Path::new(&meta.filename);
			let full = Path::new(&meta.path).join(target);
			let mut info = build_file_info(&full, None, false)?;
			info.checksum = Some(meta.checksum.clone());
			return Ok(info);
		}

		let expected: HashSet<u64> = (0..meta.total_chunks).collect();
		let present: HashSet<u64> = uploaded.into_iter().collect();
		if expected != present {
			let mut missing: Vec<u64> = expected.difference(&present).copied().collect();
			missing.sort_unstable();
			return Err(UploadError::MissingChunks(missing));
		}

		let target_str = format!("{}/{}", meta.path.trim_end_matches('/'), meta.filename);
		let gated = self.gate.validate(Path::new(&target_str), ValidateOptions::default())?;
		if let Some(parent) = gated.real_path.parent() {
			std::fs::create_dir_all(parent)?;
		}

		let dest_result = self.write_destination(&session_dir, &gated.real_path, meta).await;
		let digest = match dest_result {
			Ok(d) => d,
			Err(e) => {
				let _ = std::fs::remove_file(&gated.real_path);
				return Err(e);
			}
		};

		if digest != meta.checksum {
			let _ = std::fs::remove_file(&gated.real_path);
			return Err(UploadError::ChecksumMismatch { expected: meta.checksum.clone(), actual: digest });
		}

		if let Some(ownership_meta) = &meta.ownership {
			let ownership: Ownership = ownership_meta.clone().into();
			if let Err(e) = self.gate.apply_ownership(&gated.real_path, &ownership) {
				let _ = std::fs::remove_file(&gated.real_path);
				return Err(e.into());
			}
		}

		let _ = std::fs::remove_dir_all(&session_dir);

		let mut info = build_file_info(&gated.real_path, None, false)?;
		info.checksum = Some(digest);
		Ok(info)
	}

	async fn write_destination(
		&self,
		session_dir: &Path,
		dest: &Path,
		meta: &UploadMeta,
	) -> Result<String, UploadError> {
		let mut out = tokio::fs::File::create(dest).await?;
		let mut hasher = Sha256::new();
		let mut buf = vec![0u8; 256 * 1024];

		for i in 0..meta.total_chunks {
			let chunk_path = session_dir.join(i.to_string());
			let mut chunk = tokio::fs::File::open(&chunk_path)
				.await
				.map_err(|_| UploadError::MissingChunks(vec![i]))?;
			loop {
				use tokio::io::AsyncReadExt;
				let n = chunk.read(&mut buf).await?;
				if n == 0 {
					break;
				}
				hasher.update(&buf[..n]);
				out.write_all(&buf[..n]).await?;
			}
		}
		out.flush().await?;
		Ok(format!("sha256:{}", hex::encode(hasher.finalize())))
	}
}


// vim: ts=4
