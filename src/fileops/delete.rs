//! Recursive removal: gate the path, remove it, then deindex the subtree.
//! A single explicit per-request delete has no batch delete-count policy
//! to enforce, unlike a multi-peer sync delete.

use std::path::Path;

use crate::error::FilegateError;
use crate::index::IndexStore;
use crate::pathgate::{PathGate, ValidateOptions};

/// Path-gate, stat, recursively remove, and best-effort de-index. Index
/// removal failures are logged but never fail the delete itself.
pub fn delete(gate: &PathGate, path: &str, index: Option<&IndexStore>) -> Result<(), FilegateError> {
	let gated = gate.validate(Path::new(path), ValidateOptions::default())?;
	let meta = std::fs::metadata(&gated.real_path)?;

	if meta.is_dir() {
		std::fs::remove_dir_all(&gated.real_path)?;
	} else {
		std::fs::remove_file(&gated.real_path)?;
	}

	if let Some(idx) = index {
		let base_str = gated.base_path.to_string_lossy().to_string();
		let rel = gated
			.real_path
			.strip_prefix(&gated.base_path)
			.unwrap_or(&gated.real_path)
			.to_string_lossy()
			.to_string();
		let result = if meta.is_dir() {
			idx.remove_from_index_recursive(&base_str, &rel)
		} else {
			idx.remove_from_index(&base_str, &rel)
		};
		if let Err(e) = result {
			tracing::warn!(error = %e, path = %rel, "index removal failed after delete");
		}
	}

	Ok(())
}


// vim: ts=4
