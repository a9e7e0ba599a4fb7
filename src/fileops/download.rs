//! Streaming read: single file, or directory-as-tar

use std::path::Path;

use crate::error::FilegateError;
use crate::fileops::info::recursive_size;

#[derive(Debug)]
pub struct DownloadFile {
	pub path: std::path::PathBuf,
	pub size: u64,
	pub mime_type: String,
	pub filename: String,
}

/// Prepare a single-file download, rejecting anything over the cap.
/// Streaming the body itself is the HTTP layer's job (it owns the response).
pub fn prepare_file_download(path: &Path, max_download_bytes: u64) -> Result<DownloadFile, FilegateError> {
	let meta = std::fs::metadata(path)?;
	if meta.is_dir() {
		return Err(FilegateError::bad_request("path is a directory, use directory download"));
	}
	if meta.len() > max_download_bytes {
		return Err(FilegateError::too_large("file exceeds maximum download size"));
	}
	Ok(DownloadFile {
		path: path.to_path_buf(),
		size: meta.len(),
		mime_type: mime_guess::from_path(path).first_or_octet_stream().to_string(),
		filename: path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default(),
	})
}

pub struct DownloadDir {
	pub path: std::path::PathBuf,
	pub archive_name: String,
}

/// Prepare a directory download: compute its recursive size and reject if
/// over the cap. The actual tar streaming lives in `archive`.
pub fn prepare_dir_download(path: &Path, max_download_bytes: u64) -> Result<DownloadDir, FilegateError> {
	let meta = std::fs::metadata(path)?;
	if !meta.is_dir() {
		return Err(FilegateError::bad_request("path is a file, use file download"));
	}
	let size = recursive_size(path)?;
	if size > max_download_bytes {
		return Err(FilegateError::too_large("directory exceeds maximum download size"));
	}
	let name = path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
	Ok(DownloadDir { path: path.to_path_buf(), archive_name: format!("{}.tar", name) })
}

/// Build the `Content-Disposition` header value with both ASCII and RFC
/// 5987 UTF-8 filename parameters.
pub fn content_disposition(filename: &str, inline: bool) -> String {
	let disposition = if inline { "inline" } else { "attachment" };
	let ascii_fallback: String =
		filename.chars().map(|c| if c.is_ascii() && c != '"' { c } else { '_' }).collect();
	let encoded = percent_encode(filename);
	format!(
		"{}; filename=\"{}\"; filename*=UTF-8''{}",
		disposition, ascii_fallback, encoded
	)
}

fn percent_encode(raw: &str) -> String {
	let mut out = String::with_capacity(raw.len());
	for byte in raw.as_bytes() {
		match byte {
			b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
				out.push(*byte as char);
			}
			_ => out.push_str(&format!("%{:02X}", byte)),
		}
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	#[test]
	fn rejects_file_over_cap() {
		let tmp = TempDir::new().unwrap();
		let file = tmp.path().join("big.bin");
		std::fs::write(&file, vec![0u8; 1000]).unwrap();

		let err = prepare_file_download(&file, 100).unwrap_err();
		assert_eq!(err.status, 413);
	}

	#[test]
	fn accepts_file_within_cap() {
		let tmp = TempDir::new().unwrap();
		let file = tmp.path().join("small.txt");
		std::fs::write(&file, b"hi").unwrap();

		let info = prepare_file_download(&file, 100).unwrap();
		assert_eq!(info.size, 2);
		assert_eq!(info.filename, "small.txt");
	}

	#[test]
	fn dir_download_name_has_tar_suffix() {
		let tmp = TempDir::new().unwrap();
		std::fs::write(tmp.path().join("a.txt"), b"hi").unwrap();
		let info = prepare_dir_download(tmp.path(), 10_000).unwrap();
		assert!(info.archive_name.ends_with(".tar"));
	}

	#[test]
	fn content_disposition_includes_both_forms() {
		let header = content_disposition("café.txt", false);
		assert!(header.starts_with("attachment;"));
		assert!(header.contains("filename*=UTF-8''caf%C3%A9.txt"));
	}

	#[test]
	fn content_disposition_inline_flag() {
		let header = content_disposition("a.txt", true);
		assert!(header.starts_with("inline;"));
	}
}

// vim: ts=4
