//! Path-safety gate
//!
//! Mandatory pre-flight for every mutating or reading operation. Resolves
//! user-supplied paths through symlinks, pins them inside a whitelisted
//! base, and optionally prepares parent directories with ownership.
//!
//! Containment against a single root can be checked lexically, but
//! symlink-escape detection against a set of configured bases needs
//! containment re-checked after resolution, against a cached
//! `realpath(base)`.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::RwLock;

use crate::ownership::Ownership;

#[derive(Debug)]
pub struct PathGateError {
	pub status: u16,
	pub message: String,
}

impl PathGateError {
	fn new(status: u16, message: impl Into<String>) -> Self {
		PathGateError { status, message: message.into() }
	}
}

impl fmt::Display for PathGateError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.message)
	}
}

impl Error for PathGateError {}

/// Result of a successful path-gate validation
#[derive(Debug, Clone)]
pub struct GatedPath {
	pub real_path: PathBuf,
	pub base_path: PathBuf,
}

/// Options controlling a single `validate` call
#[derive(Debug, Clone, Default)]
pub struct ValidateOptions<'a> {
	/// Allow the input to equal a configured base path exactly
	pub allow_base_path: bool,
	/// Create `parent(normalized)` recursively before symlink resolution
	pub create_parents: bool,
	/// Ownership to apply to any parent directories created along the way
	pub ownership: Option<&'a Ownership>,
}

/// Lexically normalize a path: collapse `.`/`..` and redundant separators
/// without touching the filesystem.
pub fn normalize_lexically(path: &Path) -> PathBuf {
	let mut out = PathBuf::new();
	for component in path.components() {
		match component {
			Component::CurDir => {}
			Component::ParentDir => {
				// Only pop if we have something real to pop (not a RootDir).
				match out.components().next_back() {
					Some(Component::Normal(_)) => {
						out.pop();
					}
					Some(Component::RootDir) | None => {
						out.push(component.as_os_str());
					}
					_ => {
						out.push(component.as_os_str());
					}
				}
			}
			other => out.push(other.as_os_str()),
		}
	}
	out
}

fn starts_with_base(candidate: &Path, base: &Path) -> bool {
	candidate == base || candidate.starts_with(base)
}

/// Caches `realpath(base)` for each configured base path; bases never
/// change at runtime so the cache is populated once and never invalidated.
///
/// Also the single place every ownership application reads its dev uid/gid
/// override from, so a dev-mode deployment applies the same forced uid/gid
/// everywhere ownership is set, not just on some call sites.
pub struct PathGate {
	bases: Vec<PathBuf>,
	real_base_cache: RwLock<HashMap<PathBuf, PathBuf>>,
	dev_uid_override: Option<u32>,
	dev_gid_override: Option<u32>,
}

impl PathGate {
	pub fn new(bases: Vec<PathBuf>) -> Self {
		Self::with_dev_override(bases, None, None)
	}

	pub fn with_dev_override(
		bases: Vec<PathBuf>,
		dev_uid_override: Option<u32>,
		dev_gid_override: Option<u32>,
	) -> Self {
		PathGate {
			bases,
			real_base_cache: RwLock::new(HashMap::new()),
			dev_uid_override,
			dev_gid_override,
		}
	}

	pub fn base_paths(&self) -> &[PathBuf] {
		&self.bases
	}

	/// Apply ownership to a single path, honoring the configured dev override.
	pub fn apply_ownership(
		&self,
		path: &Path,
		ownership: &Ownership,
	) -> Result<(), crate::ownership::OwnershipError> {
		crate::ownership::apply_with_override(path, ownership, self.dev_uid_override, self.dev_gid_override)
	}

	/// Apply ownership recursively, honoring the configured dev override.
	pub fn apply_ownership_recursive(
		&self,
		path: &Path,
		ownership: &Ownership,
	) -> Result<(), crate::ownership::OwnershipError> {
		crate::ownership::apply_recursive(path, ownership, self.dev_uid_override, self.dev_gid_override)
	}

	fn real_base(&self, base: &Path) -> Result<PathBuf, PathGateError> {
		if let Some(cached) = self.real_base_cache.read().unwrap().get(base) {
			return Ok(cached.clone());
		}
		let resolved = std::fs::canonicalize(base).map_err(|e| {
			PathGateError::new(500, format!("cannot resolve base path {:?}: {}", base, e))
		})?;
		self.real_base_cache.write().unwrap().insert(base.to_path_buf(), resolved.clone());
		Ok(resolved)
	}

	fn find_base(&self, normalized: &Path) -> Option<&PathBuf> {
		self.bases.iter().find(|b| starts_with_base(normalized, b))
	}

	/// Validate a user-supplied path against the configured bases
	pub fn validate(
		&self,
		path: &Path,
		opts: ValidateOptions,
	) -> Result<GatedPath, PathGateError> {
		let normalized = normalize_lexically(path);

		let base = self
			.find_base(&normalized)
			.ok_or_else(|| PathGateError::new(403, "path not allowed"))?
			.clone();

		if normalized == base && !opts.allow_base_path {
			return Err(PathGateError::new(403, "cannot operate on base path"));
		}

		let real_base = self.real_base(&base)?;

		if opts.create_parents {
			if let Some(parent) = normalized.parent() {
				std::fs::create_dir_all(parent)
					.map_err(|e| PathGateError::new(500, format!("cannot create parent: {}", e)))?;

				if let Some(ownership) = opts.ownership {
					self.apply_parent_ownership(parent, &real_base, ownership)?;
				}
			}
		}

		let real_path = match std::fs::canonicalize(&normalized) {
			Ok(resolved) => resolved,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				let parent = normalized
					.parent()
					.ok_or_else(|| PathGateError::new(404, "path not found"))?;
				let real_parent = std::fs::canonicalize(parent)
					.map_err(|_| PathGateError::new(404, "path not found"))?;
				let basename = normalized
					.file_name()
					.ok_or_else(|| PathGateError::new(404, "path not found"))?;
				real_parent.join(basename)
			}
			Err(e) => return Err(PathGateError::new(400, format!("invalid path: {}", e))),
		};

		if !starts_with_base(&real_path, &real_base) {
			return Err(PathGateError::new(403, "symlink escape not allowed"));
		}

		Ok(GatedPath { real_path, base_path: base })
	}

	/// Walk from `leaf` upward, applying directory ownership at each level,
	/// stopping strictly before `real_base`.
	fn apply_parent_ownership(
		&self,
		leaf: &Path,
		real_base: &Path,
		ownership: &Ownership,
	) -> Result<(), PathGateError> {
		let mut current = leaf.to_path_buf();
		loop {
			let real_current = match std::fs::canonicalize(&current) {
				Ok(p) => p,
				Err(_) => break,
			};
			if real_current == *real_base || !starts_with_base(&real_current, real_base) {
				break;
			}
			self.apply_ownership(&real_current, &ownership.as_dir_ownership())
				.map_err(|e| PathGateError::new(500, e.to_string()))?;

			match current.parent() {
				Some(p) if p != current => current = p.to_path_buf(),
				_ => break,
			}
		}
		Ok(())
	}

	/// Validate two paths and require them to resolve to the same base
	pub fn validate_same_base(
		&self,
		from: &Path,
		to: &Path,
	) -> Result<(GatedPath, GatedPath), PathGateError> {
		let gated_from = self.validate(from, ValidateOptions::default())?;
		let gated_to = self.validate(
			to,
			ValidateOptions { create_parents: true, ..Default::default() },
		)?;
		if gated_from.base_path != gated_to.base_path {
			return Err(PathGateError::new(400, "source and destination must share a base path"));
		}
		Ok((gated_from, gated_to))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	fn gate_for(tmp: &TempDir) -> PathGate {
		PathGate::new(vec![tmp.path().to_path_buf()])
	}

	#[test]
	fn normalize_collapses_dotdot() {
		let p = normalize_lexically(Path::new("/a/b/../c/./d"));
		assert_eq!(p, PathBuf::from("/a/c/d"));
	}

	#[test]
	fn rejects_path_outside_base() {
		let tmp = TempDir::new().unwrap();
		let gate = gate_for(&tmp);
		let err = gate.validate(Path::new("/etc/passwd"), ValidateOptions::default()).unwrap_err();
		assert_eq!(err.status, 403);
		assert_eq!(err.message, "path not allowed");
	}

	#[test]
	fn rejects_base_path_itself_by_default() {
		let tmp = TempDir::new().unwrap();
		let gate = gate_for(&tmp);
		let err = gate.validate(tmp.path(), ValidateOptions::default()).unwrap_err();
		assert_eq!(err.status, 403);
		assert_eq!(err.message, "cannot operate on base path");
	}

	#[test]
	fn allows_base_path_when_opted_in() {
		let tmp = TempDir::new().unwrap();
		let gate = gate_for(&tmp);
		let opts = ValidateOptions { allow_base_path: true, ..Default::default() };
		let result = gate.validate(tmp.path(), opts).unwrap();
		assert_eq!(result.real_path, std::fs::canonicalize(tmp.path()).unwrap());
	}

	#[test]
	fn allows_nonexistent_target_with_existing_parent() {
		let tmp = TempDir::new().unwrap();
		let gate = gate_for(&tmp);
		let target = tmp.path().join("new_file.txt");
		let result = gate.validate(&target, ValidateOptions::default()).unwrap();
		assert_eq!(result.real_path.file_name().unwrap(), "new_file.txt");
	}

	#[test]
	#[cfg(unix)]
	fn detects_symlink_escape() {
		let tmp = TempDir::new().unwrap();
		let outside = TempDir::new().unwrap();
		let link = tmp.path().join("escape");
		std::os::unix::fs::symlink(outside.path(), &link).unwrap();

		let gate = gate_for(&tmp);
		let err = gate.validate(&link, ValidateOptions::default()).unwrap_err();
		assert_eq!(err.status, 403);
		assert_eq!(err.message, "symlink escape not allowed");
	}

	#[test]
	fn validate_same_base_rejects_cross_base() {
		let tmp1 = TempDir::new().unwrap();
		let tmp2 = TempDir::new().unwrap();
		let gate = PathGate::new(vec![tmp1.path().to_path_buf(), tmp2.path().to_path_buf()]);

		let from = tmp1.path().join("a.txt");
		std::fs::write(&from, b"hi").unwrap();
		let to = tmp2.path().join("b.txt");

		let err = gate.validate_same_base(&from, &to).unwrap_err();
		assert_eq!(err.status, 400);
	}

	#[test]
	fn validate_same_base_accepts_same_base() {
		let tmp = TempDir::new().unwrap();
		let gate = gate_for(&tmp);

		let from = tmp.path().join("a.txt");
		std::fs::write(&from, b"hi").unwrap();
		let to = tmp.path().join("b.txt");

		let (gfrom, gto) = gate.validate_same_base(&from, &to).unwrap();
		assert_eq!(gfrom.base_path, gto.base_path);
	}
}

// vim: ts=4
