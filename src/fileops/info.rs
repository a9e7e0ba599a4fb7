//! Stat and directory-listing

use std::fs::Metadata;
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::index::IndexStore;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
	pub name: String,
	pub path: String,
	#[serde(rename = "type")]
	pub kind: EntryType,
	pub size: u64,
	pub mtime: String,
	pub is_hidden: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub mime_type: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub file_id: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub checksum: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
	File,
	Directory,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DirInfo {
	#[serde(flatten)]
	pub info: FileInfo,
	pub items: Vec<FileInfo>,
	pub total: u64,
}

fn rfc3339(meta: &Metadata) -> std::io::Result<String> {
	let mtime: SystemTime = meta.modified()?;
	let dt: DateTime<Utc> = mtime.into();
	Ok(dt.to_rfc3339())
}

fn is_hidden(name: &str) -> bool {
	name.starts_with('.')
}

/// Build a `FileInfo` for a single path. `compute_sizes` only matters when
/// `path` is a directory the caller wants summed recursively — single-file
/// stats never need it. `fileId` enrichment requires the resolved base path
/// (see `find_file_id_under`), so it isn't looked up here.
pub fn build_file_info(
	path: &Path,
	index: Option<&IndexStore>,
	compute_sizes: bool,
) -> std::io::Result<FileInfo> {
	let meta = std::fs::metadata(path)?;
	let name = path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();

	let size = if meta.is_dir() {
		if compute_sizes { recursive_size(path).unwrap_or(0) } else { 0 }
	} else {
		meta.len()
	};

	let mime_type = if meta.is_file() {
		Some(mime_guess::from_path(path).first_or_octet_stream().to_string())
	} else {
		None
	};

	let _ = index;

	Ok(FileInfo {
		name: name.clone(),
		path: path.to_string_lossy().to_string(),
		kind: if meta.is_dir() { EntryType::Directory } else { EntryType::File },
		size,
		mtime: rfc3339(&meta)?,
		is_hidden: is_hidden(&name),
		mime_type,
		file_id: None,
		checksum: None,
	})
}

/// Enrich a `FileInfo` with its stable index id, given the resolved base path.
pub fn find_file_id_under(index: &IndexStore, base: &Path, path: &Path) -> Option<String> {
	let rel = path.strip_prefix(base).ok()?;
	index.identify_path(&base.to_string_lossy(), &rel.to_string_lossy()).ok().flatten().map(|e| e.id)
}

/// Sum `st_size` across the subtree as an approximate alternative to
/// shelling out to `du` (sparse/overhead discrepancies allowed).
pub fn recursive_size(path: &Path) -> std::io::Result<u64> {
	let meta = std::fs::symlink_metadata(path)?;
	if meta.is_symlink() {
		return Ok(0);
	}
	if meta.is_file() {
		return Ok(meta.len());
	}
	let mut total = 0u64;
	for entry in std::fs::read_dir(path)? {
		let entry = entry?;
		total += recursive_size(&entry.path()).unwrap_or(0);
	}
	Ok(total)
}

/// List a directory's immediate entries, stat-ing each; entries that fail
/// to stat are silently dropped (a stale race between listing and stat).
pub fn build_dir_info(
	path: &Path,
	show_hidden: bool,
	compute_sizes: bool,
	index: Option<&IndexStore>,
	base: Option<&Path>,
) -> std::io::Result<DirInfo> {
	let self_meta = std::fs::metadata(path)?;
	let name = path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();

	let mut items = Vec::new();
	let mut total_size = 0u64;

	for entry in std::fs::read_dir(path)?.flatten() {
		let entry_name = entry.file_name().to_string_lossy().to_string();
		if !show_hidden && is_hidden(&entry_name) {
			continue;
		}
		let entry_path = entry.path();
		let mut info = match build_file_info(&entry_path, None, compute_sizes) {
			Ok(i) => i,
			Err(_) => continue,
		};
		if let (Some(idx), Some(base)) = (index, base) {
			info.file_id = find_file_id_under(idx, base, &entry_path);
		}
		total_size += info.size;
		items.push(info);
	}

	let total = items.len() as u64;
	let dir_size = if compute_sizes { total_size } else { 0 };

	Ok(DirInfo {
		info: FileInfo {
			name: name.clone(),
			path: path.to_string_lossy().to_string(),
			kind: EntryType::Directory,
			size: dir_size,
			mtime: rfc3339(&self_meta)?,
			is_hidden: is_hidden(&name),
			mime_type: None,
			file_id: index.zip(base).and_then(|(idx, base)| find_file_id_under(idx, base, path)),
			checksum: None,
		},
		items,
		total,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	#[test]
	fn file_info_reports_size_and_mime() {
		let tmp = TempDir::new().unwrap();
		let file = tmp.path().join("hello.txt");
		std::fs::write(&file, b"hello world").unwrap();

		let info = build_file_info(&file, None, false).unwrap();
		assert_eq!(info.size, 11);
		assert_eq!(info.kind, EntryType::File);
		assert_eq!(info.mime_type.as_deref(), Some("text/plain"));
	}

	#[test]
	fn dotfile_is_hidden() {
		let tmp = TempDir::new().unwrap();
		let file = tmp.path().join(".secret");
		std::fs::write(&file, b"x").unwrap();
		let info = build_file_info(&file, None, false).unwrap();
		assert!(info.is_hidden);
	}

	#[test]
	fn dir_listing_skips_hidden_by_default() {
		let tmp = TempDir::new().unwrap();
		std::fs::write(tmp.path().join("visible.txt"), b"a").unwrap();
		std::fs::write(tmp.path().join(".hidden.txt"), b"b").unwrap();

		let listing = build_dir_info(tmp.path(), false, false, None, None).unwrap();
		assert_eq!(listing.total, 1);
		assert_eq!(listing.items[0].name, "visible.txt");
	}

	#[test]
	fn dir_listing_includes_hidden_when_requested() {
		let tmp = TempDir::new().unwrap();
		std::fs::write(tmp.path().join("visible.txt"), b"a").unwrap();
		std::fs::write(tmp.path().join(".hidden.txt"), b"b").unwrap();

		let listing = build_dir_info(tmp.path(), true, false, None, None).unwrap();
		assert_eq!(listing.total, 2);
	}

	#[test]
	fn dir_size_zero_unless_compute_sizes() {
		let tmp = TempDir::new().unwrap();
		std::fs::write(tmp.path().join("a.txt"), vec![0u8; 100]).unwrap();

		let without = build_dir_info(tmp.path(), false, false, None, None).unwrap();
		assert_eq!(without.info.size, 0);

		let with = build_dir_info(tmp.path(), false, true, None, None).unwrap();
		assert_eq!(with.info.size, 100);
	}

	#[test]
	fn recursive_size_sums_nested_files() {
		let tmp = TempDir::new().unwrap();
		std::fs::create_dir(tmp.path().join("sub")).unwrap();
		std::fs::write(tmp.path().join("a.txt"), vec![0u8; 10]).unwrap();
		std::fs::write(tmp.path().join("sub/b.txt"), vec![0u8; 20]).unwrap();

		assert_eq!(recursive_size(tmp.path()).unwrap(), 30);
	}
}

// vim: ts=4
