//! Single-file upload via `PUT /files/content`

use std::path::Path;

use futures::TryStreamExt;
use tokio::io::AsyncWriteExt;
use tokio_util::io::StreamReader;

use crate::error::FilegateError;
use crate::fileops::{info::build_file_info, is_unsafe_filename};
use crate::ownership::Ownership;
use crate::pathgate::{PathGate, ValidateOptions};

pub async fn upload_single_file<S, E>(
	gate: &PathGate,
	dir_path: &str,
	filename: &str,
	ownership: Option<&Ownership>,
	max_upload_bytes: u64,
	body: S,
) -> Result<crate::fileops::FileInfo, FilegateError>
where
	S: futures::Stream<Item = Result<bytes::Bytes, E>> + Unpin,
	E: std::error::Error + Send + Sync + 'static,
{
	if is_unsafe_filename(filename) {
		return Err(FilegateError::bad_request("invalid filename"));
	}

	let target = format!("{}/{}", dir_path.trim_end_matches('/'), filename);
	let gated = gate.validate(
		Path::new(&target),
		ValidateOptions { create_parents: true, ownership, ..Default::default() },
	)?;

	if let Err(e) = stream_to_file(&gated.real_path, max_upload_bytes, body).await {
		let _ = std::fs::remove_file(&gated.real_path);
		return Err(e);
	}

	if let Some(o) = ownership {
		if let Err(e) = gate.apply_ownership(&gated.real_path, o) {
			let _ = std::fs::remove_file(&gated.real_path);
			return Err(e.into());
		}
	}

	Ok(build_file_info(&gated.real_path, None, false)?)
}

async fn stream_to_file<S, E>(dest: &Path, max_bytes: u64, body: S) -> Result<(), FilegateError>
where
	S: futures::Stream<Item = Result<bytes::Bytes, E>> + Unpin,
	E: std::error::Error + Send + Sync + 'static,
{
	let mut reader =
		StreamReader::new(TryStreamExt::map_err(body, |e| std::io::Error::new(std::io::ErrorKind::Other, e)));
	let mut file = tokio::fs::File::create(dest).await?;
	let mut written: u64 = 0;
	let mut buf = [0u8; 64 * 1024];

	loop {
		use tokio::io::AsyncReadExt;
		let n = reader.read(&mut buf).await?;
		if n == 0 {
			break;
		}
		written += n as u64;
		if written > max_bytes {
			return Err(FilegateError::too_large("upload exceeds maximum size"));
		}
		file.write_all(&buf[..n]).await?;
	}
	file.flush().await?;
	Ok(())
}


// vim: ts=4
