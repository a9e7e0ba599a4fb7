//! Directory-as-archive export via the `tar` crate, streamed through a
//! `tokio::io::duplex` pipe so the HTTP layer can forward bytes as they're
//! produced instead of buffering the whole archive in memory.

use std::path::{Path, PathBuf};

use tokio::io::AsyncRead;

/// Spawns a blocking task that writes a tar stream of `dir` into one end of
/// a duplex pipe; returns the other end for the caller to read from.
pub fn stream_tar(dir: PathBuf) -> impl AsyncRead + Unpin + Send + 'static {
	let (writer_side, reader_side) = tokio::io::duplex(64 * 1024);

	tokio::task::spawn_blocking(move || {
		let sync_writer = tokio_util::io::SyncIoBridge::new(writer_side);
		let mut builder = tar::Builder::new(sync_writer);
		if let Err(e) = builder.append_dir_all(".", &dir) {
			tracing::warn!(error = %e, dir = %dir.display(), "tar archive build failed");
		}
		let _ = builder.finish();
	});

	reader_side
}

/// `archive_name` produces the `<dirname>.tar` download filename.
pub fn archive_name(dir: &Path) -> String {
	let name = dir.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_else(|| "archive".to_string());
	format!("{}.tar", name)
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;
	use tokio::io::AsyncReadExt;

	#[tokio::test]
	async fn streams_full_tar_of_directory() {
		let tmp = TempDir::new().unwrap();
		std::fs::write(tmp.path().join("a.txt"), b"hello").unwrap();
		std::fs::create_dir(tmp.path().join("sub")).unwrap();
		std::fs::write(tmp.path().join("sub/b.txt"), b"world").unwrap();

		let mut reader = stream_tar(tmp.path().to_path_buf());
		let mut buf = Vec::new();
		reader.read_to_end(&mut buf).await.unwrap();

		assert!(!buf.is_empty());
		let mut archive = tar::Archive::new(&buf[..]);
		let entries: Vec<_> = archive.entries().unwrap().collect();
		assert!(entries.len() >= 2);
	}

	#[test]
	fn archive_name_appends_tar_suffix() {
		assert_eq!(archive_name(Path::new("/base/photos")), "photos.tar");
	}
}

// vim: ts=4
