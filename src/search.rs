//! Glob-based search over validated base roots

use std::error::Error;
use std::fmt;
use std::path::Path;

use serde::Serialize;
use utoipa::ToSchema;

use crate::fileops::info::build_file_info;
use crate::fileops::FileInfo;
use crate::pathgate::{PathGate, ValidateOptions};

#[derive(Debug)]
pub struct SearchError(pub String);

impl fmt::Display for SearchError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl Error for SearchError {}

pub struct SearchRequest<'a> {
	pub base_paths: &'a [String],
	pub pattern: &'a str,
	pub limit: usize,
	pub files: bool,
	pub directories: bool,
	pub show_hidden: bool,
	pub max_recursive_wildcards: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
	pub results: Vec<FileInfo>,
	pub total_files: usize,
	pub has_more: bool,
}

pub fn search(gate: &PathGate, req: SearchRequest) -> Result<SearchResponse, crate::error::FilegateError> {
	if !req.files && !req.directories {
		return Err(SearchError("must search files, directories, or both".to_string()).into());
	}
	if req.pattern.len() > 500 {
		return Err(SearchError("pattern exceeds maximum length".to_string()).into());
	}
	let wildcard_count = req.pattern.matches("**").count();
	if wildcard_count > req.max_recursive_wildcards {
		return Err(SearchError("pattern has too many recursive wildcards".to_string()).into());
	}

	let mut results = Vec::new();
	let mut has_more = false;

	for base in req.base_paths {
		let gated = gate.validate(Path::new(base), ValidateOptions { allow_base_path: true, ..Default::default() })?;
		if !gated.real_path.is_dir() {
			return Err(SearchError(format!("{} is not a directory", base)).into());
		}

		let full_pattern = gated.real_path.join(req.pattern);
		let full_pattern_str = full_pattern.to_string_lossy().to_string();

		let paths = match glob::glob(&full_pattern_str) {
			Ok(p) => p,
			Err(e) => return Err(SearchError(format!("invalid glob pattern: {}", e)).into()),
		};

		let mut count_for_base = 0usize;
		for entry in paths.flatten() {
			if count_for_base >= req.limit {
				has_more = true;
				break;
			}
			let name = entry.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
			if !req.show_hidden && name.starts_with('.') {
				continue;
			}
			let meta = match std::fs::metadata(&entry) {
				Ok(m) => m,
				Err(_) => continue,
			};
			if meta.is_dir() && !req.directories {
				continue;
			}
			if meta.is_file() && !req.files {
				continue;
			}
			if let Ok(info) = build_file_info(&entry, None, false) {
				results.push(info);
				count_for_base += 1;
			}
		}
	}

	let total_files = results.iter().filter(|f| f.kind == crate::fileops::info::EntryType::File).count();
	Ok(SearchResponse { results, total_files, has_more })
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	fn gate_for(base: &Path) -> PathGate {
		PathGate::new(vec![base.to_path_buf()])
	}

	#[test]
	fn rejects_when_neither_files_nor_dirs_requested() {
		let tmp = TempDir::new().unwrap();
		let gate = gate_for(tmp.path());
		let req = SearchRequest {
			base_paths: &[tmp.path().to_string_lossy().to_string()],
			pattern: "*",
			limit: 10,
			files: false,
			directories: false,
			show_hidden: false,
			max_recursive_wildcards: 10,
		};
		let err = search(&gate, req).unwrap_err();
		assert_eq!(err.status, 400);
	}

	#[test]
	fn rejects_excessive_recursive_wildcards() {
		let tmp = TempDir::new().unwrap();
		let gate = gate_for(tmp.path());
		let req = SearchRequest {
			base_paths: &[tmp.path().to_string_lossy().to_string()],
			pattern: "**/**/**",
			limit: 10,
			files: true,
			directories: false,
			show_hidden: false,
			max_recursive_wildcards: 2,
		};
		let err = search(&gate, req).unwrap_err();
		assert_eq!(err.status, 400);
	}

	#[test]
	fn finds_matching_files() {
		let tmp = TempDir::new().unwrap();
		std::fs::write(tmp.path().join("report.pdf"), b"x").unwrap();
		std::fs::write(tmp.path().join("notes.txt"), b"x").unwrap();
		let gate = gate_for(tmp.path());

		let req = SearchRequest {
			base_paths: &[tmp.path().to_string_lossy().to_string()],
			pattern: "*.pdf",
			limit: 10,
			files: true,
			directories: false,
			show_hidden: false,
			max_recursive_wildcards: 10,
		};
		let resp = search(&gate, req).unwrap();
		assert_eq!(resp.total_files, 1);
		assert_eq!(resp.results[0].name, "report.pdf");
	}

	#[test]
	fn hides_dotfiles_by_default() {
		let tmp = TempDir::new().unwrap();
		std::fs::write(tmp.path().join(".env"), b"x").unwrap();
		let gate = gate_for(tmp.path());

		let req = SearchRequest {
			base_paths: &[tmp.path().to_string_lossy().to_string()],
			pattern: "*",
			limit: 10,
			files: true,
			directories: false,
			show_hidden: false,
			max_recursive_wildcards: 10,
		};
		let resp = search(&gate, req).unwrap();
		assert_eq!(resp.total_files, 0);
	}

	#[test]
	fn respects_per_base_limit() {
		let tmp = TempDir::new().unwrap();
		for i in 0..5 {
			std::fs::write(tmp.path().join(format!("f{}.txt", i)), b"x").unwrap();
		}
		let gate = gate_for(tmp.path());

		let req = SearchRequest {
			base_paths: &[tmp.path().to_string_lossy().to_string()],
			pattern: "*.txt",
			limit: 2,
			files: true,
			directories: false,
			show_hidden: false,
			max_recursive_wildcards: 10,
		};
		let resp = search(&gate, req).unwrap();
		assert_eq!(resp.total_files, 2);
		assert!(resp.has_more);
	}

	#[test]
	fn has_more_false_when_under_limit() {
		let tmp = TempDir::new().unwrap();
		std::fs::write(tmp.path().join("f0.txt"), b"x").unwrap();
		let gate = gate_for(tmp.path());

		let req = SearchRequest {
			base_paths: &[tmp.path().to_string_lossy().to_string()],
			pattern: "*.txt",
			limit: 10,
			files: true,
			directories: false,
			show_hidden: false,
			max_recursive_wildcards: 10,
		};
		let resp = search(&gate, req).unwrap();
		assert!(!resp.has_more);
	}
}

// vim: ts=4
