//! Process-wide shared state handed to every handler

use std::sync::Arc;

use crate::config::Config;
use crate::index::IndexStore;
use crate::pathgate::PathGate;
use crate::upload::UploadEngine;

#[derive(Clone)]
pub struct AppState {
	pub config: Arc<Config>,
	pub gate: Arc<PathGate>,
	pub index: Option<Arc<IndexStore>>,
	pub uploads: Arc<UploadEngine>,
}

impl AppState {
	pub fn new(config: Config) -> Self {
		let config = Arc::new(config);
		let gate = Arc::new(PathGate::with_dev_override(
			config.allowed_base_paths.clone(),
			config.dev_uid_override,
			config.dev_gid_override,
		));

		let index = if config.enable_index {
			match IndexStore::open(&config.index_database_url) {
				Ok(store) => Some(Arc::new(store)),
				Err(e) => {
					tracing::error!(error = %e, "failed to open index store, running without an index");
					None
				}
			}
		} else {
			None
		};

		let uploads = Arc::new(UploadEngine::new(
			config.upload_temp_dir.clone(),
			config.max_upload_bytes,
			config.max_chunk_bytes,
			gate.clone(),
		));

		AppState { config, gate, index, uploads }
	}
}

// vim: ts=4
