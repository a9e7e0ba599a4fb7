//! Ownership parsing and application
//!
//! Parses the `{uid, gid, fileMode, dirMode?}` tuple off request headers
//! and applies it to created or copied entries, recursively for directories.

use std::error::Error;
use std::fmt;
use std::path::Path;

use nix::unistd::{Gid, Uid};

#[derive(Debug)]
pub enum OwnershipError {
	InvalidFormat(String),
	PermissionDenied(String),
	InvalidId(String),
	Io(std::io::Error),
}

impl fmt::Display for OwnershipError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			OwnershipError::InvalidFormat(m) => write!(f, "{}", m),
			OwnershipError::PermissionDenied(m) => write!(f, "{}", m),
			OwnershipError::InvalidId(m) => write!(f, "{}", m),
			OwnershipError::Io(e) => write!(f, "{}", e),
		}
	}
}

impl Error for OwnershipError {}

impl From<std::io::Error> for OwnershipError {
	fn from(e: std::io::Error) -> Self {
		OwnershipError::Io(e)
	}
}

/// `{uid, gid, fileMode, dirMode?}` applied to created or copied entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ownership {
	pub uid: u32,
	pub gid: u32,
	pub file_mode: u32,
	pub dir_mode: u32,
}

impl Ownership {
	/// Build ownership from raw request fields, deriving `dirMode` when absent
	pub fn new(
		uid: u32,
		gid: u32,
		file_mode: u32,
		dir_mode: Option<u32>,
	) -> Result<Self, OwnershipError> {
		let dir_mode = dir_mode.unwrap_or_else(|| derive_dir_mode(file_mode));
		Ok(Ownership { uid, gid, file_mode, dir_mode })
	}

	/// A copy of this ownership with its mode swapped to the directory mode,
	/// for use when applying ownership to a directory rather than a file.
	pub fn as_dir_ownership(&self) -> Ownership {
		Ownership { uid: self.uid, gid: self.gid, file_mode: self.dir_mode, dir_mode: self.dir_mode }
	}
}

/// Parse a uid/gid string (non-negative integer)
pub fn parse_id(raw: &str) -> Result<u32, OwnershipError> {
	raw.parse::<u32>()
		.map_err(|_| OwnershipError::InvalidFormat(format!("invalid uid/gid: {}", raw)))
}

/// Parse a 3- or 4-digit octal mode string, e.g. "644" or "0755"
pub fn parse_mode(raw: &str) -> Result<u32, OwnershipError> {
	let is_octal_digits = raw.len() >= 3
		&& raw.len() <= 4
		&& raw.chars().all(|c| ('0'..='7').contains(&c));
	if !is_octal_digits {
		return Err(OwnershipError::InvalidFormat(format!("invalid mode: {}", raw)));
	}
	u32::from_str_radix(raw, 8)
		.map_err(|_| OwnershipError::InvalidFormat(format!("invalid mode: {}", raw)))
}

/// Derive a directory mode from a file mode: for each of owner/group/other,
/// if the read bit is set, also set the execute bit.
///
/// e.g. 0o644 -> 0o755, 0o600 -> 0o700, 0o640 -> 0o750.
pub fn derive_dir_mode(file_mode: u32) -> u32 {
	let mut dir_mode = file_mode;
	for shift in [6, 3, 0] {
		let read_bit = 0o4 << shift;
		let exec_bit = 0o1 << shift;
		if file_mode & read_bit != 0 {
			dir_mode |= exec_bit;
		}
	}
	dir_mode
}

/// Apply `chown` then `chmod` to a single path, respecting a global dev
/// override that forces uid/gid to fixed values (logged when active).
pub fn apply_with_override(
	path: &Path,
	ownership: &Ownership,
	dev_uid_override: Option<u32>,
	dev_gid_override: Option<u32>,
) -> Result<(), OwnershipError> {
	let (uid, gid) = match (dev_uid_override, dev_gid_override) {
		(Some(u), Some(g)) => {
			tracing::info!(
				original_uid = ownership.uid,
				original_gid = ownership.gid,
				override_uid = u,
				override_gid = g,
				"applying dev ownership override"
			);
			(u, g)
		}
		_ => (ownership.uid, ownership.gid),
	};

	nix::unistd::chown(path, Some(Uid::from_raw(uid)), Some(Gid::from_raw(gid))).map_err(|e| {
		match e {
			nix::errno::Errno::EPERM => {
				OwnershipError::PermissionDenied("permission denied (not root?)".to_string())
			}
			nix::errno::Errno::EINVAL => {
				OwnershipError::InvalidId("invalid uid or gid".to_string())
			}
			other => OwnershipError::Io(std::io::Error::from(other)),
		}
	})?;

	std::fs::set_permissions(path, std::os::unix::fs::PermissionsExt::from_mode(ownership.file_mode))
		.map_err(OwnershipError::Io)?;

	Ok(())
}

/// Depth-first recursive ownership application: directory mode first, then
/// recurse into entries; file mode for files. Aborts on first error with no
/// rollback — the caller decides whether to unlink a partially written tree.
pub fn apply_recursive(
	path: &Path,
	ownership: &Ownership,
	dev_uid_override: Option<u32>,
	dev_gid_override: Option<u32>,
) -> Result<(), OwnershipError> {
	let metadata = std::fs::symlink_metadata(path)?;
	if metadata.is_dir() {
		apply_with_override(path, &ownership.as_dir_ownership(), dev_uid_override, dev_gid_override)?;
		for entry in std::fs::read_dir(path)? {
			let entry = entry?;
			apply_recursive(&entry.path(), ownership, dev_uid_override, dev_gid_override)?;
		}
	} else {
		apply_with_override(path, ownership, dev_uid_override, dev_gid_override)?;
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parse_mode_accepts_three_digit_octal() {
		assert_eq!(parse_mode("644").unwrap(), 0o644);
		assert_eq!(parse_mode("755").unwrap(), 0o755);
	}

	#[test]
	fn parse_mode_accepts_four_digit_octal() {
		assert_eq!(parse_mode("0644").unwrap(), 0o644);
	}

	#[test]
	fn parse_mode_rejects_non_octal() {
		assert!(parse_mode("999").is_err());
		assert!(parse_mode("abc").is_err());
		assert!(parse_mode("12").is_err());
		assert!(parse_mode("12345").is_err());
	}

	#[test]
	fn parse_id_rejects_negative() {
		assert!(parse_id("-1").is_err());
		assert!(parse_id("1000").is_ok());
	}

	#[test]
	fn derive_dir_mode_sets_exec_when_read_set() {
		assert_eq!(derive_dir_mode(0o644), 0o755);
		assert_eq!(derive_dir_mode(0o600), 0o700);
		assert_eq!(derive_dir_mode(0o640), 0o750);
	}

	#[test]
	fn derive_dir_mode_never_clears_bits() {
		for mode in 0..=0o777u32 {
			let dir_mode = derive_dir_mode(mode);
			assert_eq!(dir_mode & mode, mode, "mode {:o} lost a bit in {:o}", mode, dir_mode);
		}
	}

	#[test]
	fn derive_dir_mode_no_read_no_exec_added() {
		assert_eq!(derive_dir_mode(0o000), 0o000);
		assert_eq!(derive_dir_mode(0o200), 0o200);
	}

	#[test]
	fn ownership_new_derives_dir_mode_when_absent() {
		let o = Ownership::new(1000, 1000, 0o644, None).unwrap();
		assert_eq!(o.dir_mode, 0o755);
	}

	#[test]
	fn ownership_new_respects_explicit_dir_mode() {
		let o = Ownership::new(1000, 1000, 0o644, Some(0o700)).unwrap();
		assert_eq!(o.dir_mode, 0o700);
	}
}

// vim: ts=4
