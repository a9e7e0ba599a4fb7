//! Directory creation

use std::path::Path;

use crate::error::FilegateError;
use crate::fileops::info::build_file_info;
use crate::ownership::Ownership;
use crate::pathgate::{PathGate, ValidateOptions};

/// Path-gate, recursively create, apply ownership, and roll back the created
/// tree on any failure after creation.
pub fn mkdir(gate: &PathGate, path: &str, ownership: Option<&Ownership>) -> Result<crate::fileops::FileInfo, FilegateError> {
	let gated = gate.validate(Path::new(path), ValidateOptions { create_parents: false, ..Default::default() })?;

	let already_existed = gated.real_path.exists();
	std::fs::create_dir_all(&gated.real_path)?;

	if let Some(o) = ownership {
		if let Err(e) = gate.apply_ownership_recursive(&gated.real_path, o) {
			if !already_existed {
				let _ = std::fs::remove_dir_all(&gated.real_path);
			}
			return Err(e.into());
		}
	}

	Ok(build_file_info(&gated.real_path, None, false)?)
}


// vim: ts=4
