//! Incremental filesystem scanner
//!
//! BFS over a base path with a bounded worker pool, populating the Index
//! Store and garbage-collecting entries that vanished since the last scan.
//! Single-sided: it indexes one tree's state, not an n-way diff.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::index::{self, IndexAction, IndexStore};

#[derive(Debug, Clone, Default)]
pub struct ScanCounts {
	pub scanned: u64,
	pub skipped: u64,
	pub added: u64,
	pub moved: u64,
	pub removed: u64,
	pub duration_ms: u64,
}

impl std::ops::AddAssign for ScanCounts {
	fn add_assign(&mut self, other: Self) {
		self.scanned += other.scanned;
		self.skipped += other.skipped;
		self.added += other.added;
		self.moved += other.moved;
		self.removed += other.removed;
		self.duration_ms += other.duration_ms;
	}
}

struct SharedQueue {
	pending: Mutex<VecDeque<PathBuf>>,
}

impl SharedQueue {
	fn new(initial: PathBuf) -> Self {
		let mut pending = VecDeque::new();
		pending.push_back(initial);
		SharedQueue { pending: Mutex::new(pending) }
	}

	fn pop(&self) -> Option<PathBuf> {
		self.pending.lock().unwrap().pop_front()
	}

	fn push(&self, dir: PathBuf) {
		self.pending.lock().unwrap().push_back(dir);
	}

	fn len(&self) -> usize {
		self.pending.lock().unwrap().len()
	}
}

/// Scan a single base path, populating `store`. Worker count = `max(1, concurrency)`.
pub async fn scan_base_path(
	store: Arc<IndexStore>,
	base: PathBuf,
	concurrency: usize,
) -> ScanCounts {
	let scan_start = index::now_ms();
	let started = Instant::now();

	let base_str = base.to_string_lossy().to_string();
	let queue = Arc::new(SharedQueue::new(base.clone()));
	let counts = Arc::new(Mutex::new(ScanCounts::default()));
	let worker_count = concurrency.max(1);

	let mut handles = Vec::with_capacity(worker_count);
	for _ in 0..worker_count {
		let queue = queue.clone();
		let store = store.clone();
		let counts = counts.clone();
		let base = base.clone();
		let base_str = base_str.clone();
		handles.push(tokio::task::spawn_blocking(move || {
			worker_loop(&queue, &store, &base, &base_str, scan_start, &counts);
		}));
	}
	for h in handles {
		let _ = h.await;
	}

	let removed = store.remove_stale_entries(&base_str, scan_start).unwrap_or(0) as u64;

	let mut final_counts = counts.lock().unwrap().clone();
	final_counts.removed = removed;
	final_counts.duration_ms = started.elapsed().as_millis() as u64;
	final_counts
}

fn worker_loop(
	queue: &SharedQueue,
	store: &IndexStore,
	base: &Path,
	base_str: &str,
	scan_start: i64,
	counts: &Mutex<ScanCounts>,
) {
	loop {
		// A directory only ever sits in the queue while some worker owns it or
		// it's waiting to be popped, so an empty-looking queue combined with no
		// in-flight work means the scan is actually done; a brief backoff lets
		// siblings that are about to push more work get a chance to do so.
		let dir = match queue.pop() {
			Some(d) => d,
			None => {
				if queue.len() == 0 {
					return;
				}
				continue;
			}
		};

		let rel_dir = index::rel_path_of(base, &dir).unwrap_or_else(|| Path::new(""));
		let rel_dir_str = rel_dir.to_string_lossy().to_string();

		let dir_meta = match std::fs::metadata(&dir) {
			Ok(m) => m,
			Err(_) => {
				if dir == base {
					return;
				}
				continue;
			}
		};
		let dir_mtime_ms = index::stat_input(&dir_meta).mtime_ms;

		let cached_mtime = store.get_scan_state(base_str, &rel_dir_str).ok().flatten();
		if cached_mtime == Some(dir_mtime_ms) {
			let _ = store.touch_indexed_at_under_dir(base_str, &rel_dir_str, scan_start);
			let _ = store.set_scan_state(base_str, &rel_dir_str, dir_mtime_ms, scan_start);
			let mut c = counts.lock().unwrap();
			c.skipped += 1;
			continue;
		}

		let entries = match std::fs::read_dir(&dir) {
			Ok(e) => e,
			Err(_) => continue,
		};

		for entry in entries.flatten() {
			let path = entry.path();
			let meta = match std::fs::symlink_metadata(&path) {
				Ok(m) => m,
				Err(_) => continue,
			};
			if meta.is_symlink() {
				continue;
			}
			let meta = match std::fs::metadata(&path) {
				Ok(m) => m,
				Err(_) => continue,
			};

			let rel = index::rel_path_of(base, &path).unwrap_or(&path).to_string_lossy().to_string();
			let stat = index::stat_input(&meta);
			if let Ok((_, action)) = store.index_file(base_str, &rel, stat, scan_start) {
				let mut c = counts.lock().unwrap();
				c.scanned += 1;
				match action {
					IndexAction::Added => c.added += 1,
					IndexAction::Moved => c.moved += 1,
					IndexAction::Existing => {}
				}
			}

			if meta.is_dir() {
				queue.push(path);
			}
		}

		let _ = store.set_scan_state(base_str, &rel_dir_str, dir_mtime_ms, scan_start);
	}
}

/// Scan every configured base path sequentially, aggregating counts.
pub async fn scan_all(store: Arc<IndexStore>, bases: &[PathBuf], concurrency: usize) -> ScanCounts {
	let mut total = ScanCounts::default();
	for base in bases {
		total += scan_base_path(store.clone(), base.clone(), concurrency).await;
	}
	total
}


// vim: ts=4
