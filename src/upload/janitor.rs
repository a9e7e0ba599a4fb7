//! Periodic and post-startup sweep of expired upload sessions

use std::path::Path;
use std::time::Duration;

use crate::upload::meta::UploadMeta;

/// Remove sessions whose `meta.json` is missing/unreadable, or whose age
/// exceeds `expiry_secs`. Best-effort: individual failures are logged and
/// skipped rather than aborting the sweep.
pub fn sweep(temp_dir: &Path, expiry_secs: u64) -> usize {
	let mut removed = 0;
	let entries = match std::fs::read_dir(temp_dir) {
		Ok(e) => e,
		Err(_) => return 0,
	};

	let now = crate::index::now_ms();
	let expiry_ms = expiry_secs as i64 * 1000;

	for entry in entries.flatten() {
		let path = entry.path();
		if !path.is_dir() {
			continue;
		}
		let upload_id = match path.file_name().and_then(|n| n.to_str()) {
			Some(n) => n.to_string(),
			None => continue,
		};

		let expired = match UploadMeta::load(temp_dir, &upload_id) {
			Ok(Some(meta)) => now - meta.created_at > expiry_ms,
			Ok(None) => true,
			Err(_) => true,
		};

		if expired {
			if std::fs::remove_dir_all(&path).is_ok() {
				removed += 1;
				tracing::info!(upload_id = %upload_id, "janitor removed expired upload session");
			}
		}
	}

	removed
}

/// Spawn the recurring sweep task plus a one-shot run 10 seconds after startup.
pub fn spawn(temp_dir: std::path::PathBuf, expiry_secs: u64, interval: Duration) {
	tokio::spawn({
		let temp_dir = temp_dir.clone();
		async move {
			tokio::time::sleep(Duration::from_secs(10)).await;
			let removed = sweep(&temp_dir, expiry_secs);
			tracing::debug!(removed, "post-startup upload janitor sweep complete");
		}
	});

	tokio::spawn(async move {
		let mut ticker = tokio::time::interval(interval);
		ticker.tick().await;
		loop {
			ticker.tick().await;
			let removed = sweep(&temp_dir, expiry_secs);
			tracing::debug!(removed, "upload janitor sweep complete");
		}
	});
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	fn meta_with_age(upload_id: &str, age_ms_ago: i64) -> UploadMeta {
		UploadMeta {
			upload_id: upload_id.to_string(),
			path: "/base".to_string(),
			filename: "f.bin".to_string(),
			size: 10,
			checksum: "sha256:abc".to_string(),
			chunk_size: 10,
			total_chunks: 1,
			ownership: None,
			created_at: crate::index::now_ms() - age_ms_ago,
		}
	}

	#[test]
	fn sweep_removes_expired_sessions() {
		let tmp = TempDir::new().unwrap();
		meta_with_age("expired0000000a", 10 * 3600 * 1000).save_to(tmp.path()).unwrap();
		meta_with_age("freshfreshfresh", 10).save_to(tmp.path()).unwrap();

		let removed = sweep(tmp.path(), 3600);

		assert_eq!(removed, 1);
		assert!(!UploadMeta::session_dir(tmp.path(), "expired0000000a").exists());
		assert!(UploadMeta::session_dir(tmp.path(), "freshfreshfresh").exists());
	}

	#[test]
	fn sweep_removes_sessions_missing_meta() {
		let tmp = TempDir::new().unwrap();
		std::fs::create_dir_all(tmp.path().join("nodescriptor")).unwrap();
		std::fs::write(tmp.path().join("nodescriptor").join("0"), b"chunk").unwrap();

		let removed = sweep(tmp.path(), 3600);
		assert_eq!(removed, 1);
	}
}

// vim: ts=4
