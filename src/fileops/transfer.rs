//! Move and copy, including cross-base copy with mandatory ownership

use std::path::{Path, PathBuf};

use crate::error::FilegateError;
use crate::index::IndexStore;
use crate::ownership::Ownership;
use crate::pathgate::{PathGate, ValidateOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
	Move,
	Copy,
}

pub struct TransferRequest<'a> {
	pub from: &'a str,
	pub to: &'a str,
	pub mode: TransferMode,
	pub ensure_unique_name: bool,
	pub ownership: Option<&'a Ownership>,
}

/// Given a target `P`, return `P` if free, else the first of
/// `<dir>/<base>-01..99.<ext>` that doesn't exist, falling back to a
/// unix-ms-suffixed name if all 99 are taken.
pub fn ensure_unique_name(target: &Path) -> PathBuf {
	if !target.exists() {
		return target.to_path_buf();
	}

	let dir = target.parent().unwrap_or_else(|| Path::new(""));
	let stem = target.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
	let ext = target.extension().map(|e| e.to_string_lossy().to_string());

	for i in 1..=99u32 {
		let candidate_name = match &ext {
			Some(ext) => format!("{}-{:02}.{}", stem, i, ext),
			None => format!("{}-{:02}", stem, i),
		};
		let candidate = dir.join(candidate_name);
		if !candidate.exists() {
			return candidate;
		}
	}

	let ts = crate::index::now_ms();
	let fallback_name = match &ext {
		Some(ext) => format!("{}-{}.{}", stem, ts, ext),
		None => format!("{}-{}", stem, ts),
	};
	dir.join(fallback_name)
}

pub fn transfer(
	gate: &PathGate,
	index: Option<&IndexStore>,
	req: TransferRequest,
) -> Result<crate::fileops::FileInfo, FilegateError> {
	match req.mode {
		TransferMode::Move => move_entry(gate, index, &req),
		TransferMode::Copy => copy_entry(gate, index, &req),
	}
}

fn move_entry(
	gate: &PathGate,
	index: Option<&IndexStore>,
	req: &TransferRequest,
) -> Result<crate::fileops::FileInfo, FilegateError> {
	let (gated_from, gated_to) = gate.validate_same_base(Path::new(req.from), Path::new(req.to))?;
	if !gated_from.real_path.exists() {
		return Err(FilegateError::not_found("source does not exist"));
	}

	let dest = if req.ensure_unique_name {
		ensure_unique_name(&gated_to.real_path)
	} else {
		gated_to.real_path.clone()
	};
	if let Some(parent) = dest.parent() {
		std::fs::create_dir_all(parent)?;
	}

	std::fs::rename(&gated_from.real_path, &dest)?;

	if let Some(o) = req.ownership {
		gate.apply_ownership_recursive(&dest, o)?;
	}

	if let Some(idx) = index {
		reindex_after_move(idx, &gated_from, &dest)?;
	}

	Ok(crate::fileops::info::build_file_info(&dest, None, false)?)
}

fn copy_entry(
	gate: &PathGate,
	index: Option<&IndexStore>,
	req: &TransferRequest,
) -> Result<crate::fileops::FileInfo, FilegateError> {
	let same_base = gate.validate_same_base(Path::new(req.from), Path::new(req.to));

	let (gated_from, gated_to) = match same_base {
		Ok((from, to)) => (from, to),
		Err(_) => {
			let ownership = req.ownership.ok_or_else(|| {
				FilegateError::bad_request(
					"cross-base copy requires ownership (ownerUid, ownerGid, fileMode)",
				)
			})?;
			let from = gate.validate(Path::new(req.from), ValidateOptions::default())?;
			let to = gate.validate(
				Path::new(req.to),
				ValidateOptions { create_parents: true, ownership: Some(ownership), ..Default::default() },
			)?;
			(from, to)
		}
	};

	let dest = if req.ensure_unique_name {
		ensure_unique_name(&gated_to.real_path)
	} else {
		gated_to.real_path.clone()
	};

	let copy_result = copy_tree(&gated_from.real_path, &dest);
	if let Err(e) = copy_result {
		let _ = std::fs::remove_dir_all(&dest);
		let _ = std::fs::remove_file(&dest);
		return Err(e.into());
	}

	if let Some(o) = req.ownership {
		if let Err(e) = gate.apply_ownership_recursive(&dest, o) {
			let _ = std::fs::remove_dir_all(&dest);
			let _ = std::fs::remove_file(&dest);
			return Err(e.into());
		}
	}

	if let Some(idx) = index {
		index_fresh(idx, &gated_to.base_path, &dest)?;
	}

	Ok(crate::fileops::info::build_file_info(&dest, None, false)?)
}

fn copy_tree(from: &Path, to: &Path) -> std::io::Result<()> {
	let meta = std::fs::metadata(from)?;
	if meta.is_dir() {
		std::fs::create_dir_all(to)?;
		for entry in std::fs::read_dir(from)? {
			let entry = entry?;
			copy_tree(&entry.path(), &to.join(entry.file_name()))?;
		}
	} else {
		if let Some(parent) = to.parent() {
			std::fs::create_dir_all(parent)?;
		}
		std::fs::copy(from, to)?;
	}
	Ok(())
}

fn reindex_after_move(
	index: &IndexStore,
	gated_from: &crate::pathgate::GatedPath,
	dest: &Path,
) -> Result<(), FilegateError> {
	let base_str = gated_from.base_path.to_string_lossy().to_string();
	let old_rel =
		gated_from.real_path.strip_prefix(&gated_from.base_path).unwrap_or(&gated_from.real_path);
	let new_rel = dest.strip_prefix(&gated_from.base_path).unwrap_or(dest);

	if let Some(existing) = index.identify_path(&base_str, &old_rel.to_string_lossy())? {
		let meta = std::fs::metadata(dest)?;
		index.index_file(&base_str, &new_rel.to_string_lossy(), crate::index::stat_input(&meta), existing.indexed_at)?;
		index.remove_from_index(&base_str, &old_rel.to_string_lossy())?;
	} else {
		index_fresh(index, &gated_from.base_path, dest)?;
	}
	Ok(())
}

fn index_fresh(index: &IndexStore, base: &Path, path: &Path) -> Result<(), FilegateError> {
	let meta = std::fs::metadata(path)?;
	let base_str = base.to_string_lossy().to_string();
	let rel = path.strip_prefix(base).unwrap_or(path).to_string_lossy().to_string();
	index.index_file(&base_str, &rel, crate::index::stat_input(&meta), crate::index::now_ms())?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	#[test]
	fn ensure_unique_name_appends_smallest_free_suffix() {
		let tmp = TempDir::new().unwrap();
		std::fs::write(tmp.path().join("a.txt"), b"x").unwrap();
		std::fs::write(tmp.path().join("a-01.txt"), b"x").unwrap();

		let name = ensure_unique_name(&tmp.path().join("a.txt"));
		assert_eq!(name.file_name().unwrap(), "a-02.txt");
	}

	#[test]
	fn ensure_unique_name_passes_through_free_target() {
		let tmp = TempDir::new().unwrap();
		let name = ensure_unique_name(&tmp.path().join("fresh.txt"));
		assert_eq!(name.file_name().unwrap(), "fresh.txt");
	}

	#[test]
	fn move_within_base_succeeds() {
		let tmp = TempDir::new().unwrap();
		let gate = PathGate::new(vec![tmp.path().to_path_buf()]);
		std::fs::write(tmp.path().join("a.txt"), b"hi").unwrap();

		let from = tmp.path().join("a.txt").to_string_lossy().into_owned();
		let to = tmp.path().join("b.txt").to_string_lossy().into_owned();
		let req = TransferRequest {
			from: &from,
			to: &to,
			mode: TransferMode::Move,
			ensure_unique_name: false,
			ownership: None,
		};
		transfer(&gate, None, req).unwrap();

		assert!(!tmp.path().join("a.txt").exists());
		assert!(tmp.path().join("b.txt").exists());
	}

	#[test]
	fn cross_base_copy_requires_ownership() {
		let b1 = TempDir::new().unwrap();
		let b2 = TempDir::new().unwrap();
		let gate = PathGate::new(vec![b1.path().to_path_buf(), b2.path().to_path_buf()]);
		std::fs::write(b1.path().join("x.txt"), b"hi").unwrap();

		let from = b1.path().join("x.txt").to_string_lossy().into_owned();
		let to = b2.path().join("x.txt").to_string_lossy().into_owned();
		let req = TransferRequest {
			from: &from,
			to: &to,
			mode: TransferMode::Copy,
			ensure_unique_name: false,
			ownership: None,
		};
		let err = transfer(&gate, None, req).unwrap_err();
		assert_eq!(err.status, 400);
		assert!(err.message.contains("cross-base copy requires ownership"));
	}

	#[test]
	fn copy_within_base_does_not_require_ownership() {
		let tmp = TempDir::new().unwrap();
		let gate = PathGate::new(vec![tmp.path().to_path_buf()]);
		std::fs::write(tmp.path().join("a.txt"), b"hi").unwrap();

		let from = tmp.path().join("a.txt").to_string_lossy().into_owned();
		let to = tmp.path().join("b.txt").to_string_lossy().into_owned();
		let req = TransferRequest {
			from: &from,
			to: &to,
			mode: TransferMode::Copy,
			ensure_unique_name: false,
			ownership: None,
		};
		transfer(&gate, None, req).unwrap();

		assert!(tmp.path().join("a.txt").exists());
		assert!(tmp.path().join("b.txt").exists());
	}
}

// vim: ts=4
