//! Unified configuration system for Filegate
//!
//! Configuration is assembled once from environment variables at startup;
//! there is no config-file layer. Parse failures or a missing required
//! variable abort startup.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Process-wide immutable configuration, derived once from the environment
#[derive(Debug, Clone)]
pub struct Config {
	/// Shared secret checked against the `Authorization: Bearer` header
	pub file_proxy_token: String,

	/// Configured base paths; symlink-resolved once at startup by the caller
	pub allowed_base_paths: Vec<PathBuf>,

	pub port: u16,

	pub max_upload_bytes: u64,
	pub max_download_bytes: u64,
	pub max_chunk_bytes: u64,

	pub search_max_results: usize,
	pub search_max_recursive_wildcards: usize,

	pub upload_expiry_secs: u64,
	pub upload_temp_dir: PathBuf,
	pub disk_cleanup_interval: Duration,

	pub enable_index: bool,
	pub index_database_url: String,
	pub index_rescan_interval: Duration,
	pub index_scan_concurrency: usize,

	pub dev_uid_override: Option<u32>,
	pub dev_gid_override: Option<u32>,
}

/// Errors encountered while assembling configuration from the environment
#[derive(Debug)]
pub struct ConfigError(pub String);

impl std::fmt::Display for ConfigError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "invalid configuration: {}", self.0)
	}
}

impl std::error::Error for ConfigError {}

fn env_var(name: &str) -> Result<String, ConfigError> {
	env::var(name).map_err(|_| ConfigError(format!("{} is required", name)))
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
	match env::var(name) {
		Ok(v) => v.parse().map_err(|_| ConfigError(format!("{} is not a valid value", name))),
		Err(_) => Ok(default),
	}
}

fn env_u32_opt(name: &str) -> Result<Option<u32>, ConfigError> {
	match env::var(name) {
		Ok(v) => v
			.parse()
			.map(Some)
			.map_err(|_| ConfigError(format!("{} is not a valid value", name))),
		Err(_) => Ok(None),
	}
}

impl Config {
	/// Load configuration from the process environment
	///
	/// Required: `FILE_PROXY_TOKEN`, `ALLOWED_BASE_PATHS`.
	pub fn from_env() -> Result<Self, ConfigError> {
		let file_proxy_token = env_var("FILE_PROXY_TOKEN")?;

		let allowed_base_paths_raw = env_var("ALLOWED_BASE_PATHS")?;
		let allowed_base_paths: Vec<PathBuf> = allowed_base_paths_raw
			.split(',')
			.map(str::trim)
			.filter(|s| !s.is_empty())
			.map(PathBuf::from)
			.collect();
		if allowed_base_paths.is_empty() {
			return Err(ConfigError("ALLOWED_BASE_PATHS must list at least one path".to_string()));
		}
		for base in &allowed_base_paths {
			if !base.is_absolute() {
				return Err(ConfigError(format!(
					"ALLOWED_BASE_PATHS entries must be absolute, got {:?}",
					base
				)));
			}
		}

		let port = env_or("PORT", 4000u16)?;
		let max_upload_mb: u64 = env_or("MAX_UPLOAD_MB", 500)?;
		let max_download_mb: u64 = env_or("MAX_DOWNLOAD_MB", 5000)?;
		let max_chunk_mb: u64 = env_or("MAX_CHUNK_SIZE_MB", 50)?;
		let search_max_results = env_or("SEARCH_MAX_RESULTS", 100usize)?;
		let search_max_recursive_wildcards = env_or("SEARCH_MAX_RECURSIVE_WILDCARDS", 10usize)?;
		let upload_expiry_hours: u64 = env_or("UPLOAD_EXPIRY_HOURS", 24)?;
		let upload_temp_dir: PathBuf = env::var("UPLOAD_TEMP_DIR")
			.map(PathBuf::from)
			.unwrap_or_else(|_| PathBuf::from("/tmp/filegate-uploads"));
		let disk_cleanup_hours: u64 = env_or("DISK_CLEANUP_INTERVAL_HOURS", 6)?;
		let enable_index = env::var("ENABLE_INDEX").map(|v| v != "false").unwrap_or(true);
		let index_database_url =
			env::var("INDEX_DATABASE_URL").unwrap_or_else(|_| ":memory:".to_string());
		let index_rescan_minutes: u64 = env_or("INDEX_RESCAN_INTERVAL_MINUTES", 30)?;
		let index_scan_concurrency = env_or("INDEX_SCAN_CONCURRENCY", 4usize)?;
		let dev_uid_override = env_u32_opt("DEV_UID_OVERRIDE")?;
		let dev_gid_override = env_u32_opt("DEV_GID_OVERRIDE")?;

		Ok(Config {
			file_proxy_token,
			allowed_base_paths,
			port,
			max_upload_bytes: max_upload_mb * 1024 * 1024,
			max_download_bytes: max_download_mb * 1024 * 1024,
			max_chunk_bytes: max_chunk_mb * 1024 * 1024,
			search_max_results,
			search_max_recursive_wildcards,
			upload_expiry_secs: upload_expiry_hours * 3600,
			upload_temp_dir,
			disk_cleanup_interval: Duration::from_secs(disk_cleanup_hours * 3600),
			enable_index,
			index_database_url,
			index_rescan_interval: Duration::from_secs(index_rescan_minutes * 60),
			index_scan_concurrency: index_scan_concurrency.max(1),
			dev_uid_override,
			dev_gid_override,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::Mutex;

	// Environment variables are process-global; serialize tests that touch them.
	static ENV_LOCK: Mutex<()> = Mutex::new(());

	fn clear_all() {
		for key in [
			"FILE_PROXY_TOKEN",
			"ALLOWED_BASE_PATHS",
			"PORT",
			"MAX_UPLOAD_MB",
			"MAX_DOWNLOAD_MB",
			"MAX_CHUNK_SIZE_MB",
			"SEARCH_MAX_RESULTS",
			"SEARCH_MAX_RECURSIVE_WILDCARDS",
			"UPLOAD_EXPIRY_HOURS",
			"UPLOAD_TEMP_DIR",
			"DISK_CLEANUP_INTERVAL_HOURS",
			"ENABLE_INDEX",
			"INDEX_DATABASE_URL",
			"INDEX_RESCAN_INTERVAL_MINUTES",
			"INDEX_SCAN_CONCURRENCY",
			"DEV_UID_OVERRIDE",
			"DEV_GID_OVERRIDE",
		] {
			env::remove_var(key);
		}
	}

	#[test]
	fn missing_token_fails() {
		let _guard = ENV_LOCK.lock().unwrap();
		clear_all();
		env::set_var("ALLOWED_BASE_PATHS", "/tmp");
		assert!(Config::from_env().is_err());
		clear_all();
	}

	#[test]
	fn missing_base_paths_fails() {
		let _guard = ENV_LOCK.lock().unwrap();
		clear_all();
		env::set_var("FILE_PROXY_TOKEN", "secret");
		assert!(Config::from_env().is_err());
		clear_all();
	}

	#[test]
	fn relative_base_path_rejected() {
		let _guard = ENV_LOCK.lock().unwrap();
		clear_all();
		env::set_var("FILE_PROXY_TOKEN", "secret");
		env::set_var("ALLOWED_BASE_PATHS", "relative/path");
		assert!(Config::from_env().is_err());
		clear_all();
	}

	#[test]
	fn defaults_applied() {
		let _guard = ENV_LOCK.lock().unwrap();
		clear_all();
		env::set_var("FILE_PROXY_TOKEN", "secret");
		env::set_var("ALLOWED_BASE_PATHS", "/tmp,/var/data");
		let cfg = Config::from_env().unwrap();
		assert_eq!(cfg.port, 4000);
		assert_eq!(cfg.max_upload_bytes, 500 * 1024 * 1024);
		assert_eq!(cfg.allowed_base_paths.len(), 2);
		assert!(cfg.enable_index);
		clear_all();
	}
}

// vim: ts=4
