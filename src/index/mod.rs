//! Index Store: persistent (basePath, relPath) -> stable id map
//!
//! A relational store keyed on (basePath, relPath) with a secondary
//! (dev, ino) index for rename survival. Backed by `rusqlite` so recursive
//! delete can express a LIKE-prefix match directly (see DESIGN.md).

use std::path::Path;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexAction {
	Existing,
	Moved,
	Added,
}

impl IndexAction {
	pub fn as_str(&self) -> &'static str {
		match self {
			IndexAction::Existing => "existing",
			IndexAction::Moved => "moved",
			IndexAction::Added => "added",
		}
	}
}

#[derive(Debug, Clone)]
pub struct IndexEntry {
	pub id: String,
	pub base_path: String,
	pub rel_path: String,
	pub dev: u64,
	pub ino: u64,
	pub size: u64,
	pub mtime_ms: i64,
	pub is_dir: bool,
	pub indexed_at: i64,
}

#[derive(Debug, Clone, Copy)]
pub struct StatInput {
	pub dev: u64,
	pub ino: u64,
	pub size: u64,
	pub mtime_ms: i64,
	pub is_dir: bool,
}

#[derive(Debug, Clone, Default)]
pub struct IndexStats {
	pub total_entries: u64,
	pub total_dirs: u64,
	pub total_files: u64,
}

/// Escape `\`, `%`, `_` for use inside a `LIKE ... ESCAPE '\'` pattern.
///
/// Without this, a directory name containing `%` or `_` matches unrelated
/// siblings during recursive delete/rename lookups.
pub fn like_escape(raw: &str) -> String {
	let mut out = String::with_capacity(raw.len());
	for c in raw.chars() {
		if c == '\\' || c == '%' || c == '_' {
			out.push('\\');
		}
		out.push(c);
	}
	out
}

pub fn now_ms() -> i64 {
	SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_millis() as i64
}

/// Single process-wide handle; all callers serialize through the mutex.
pub struct IndexStore {
	conn: Mutex<Connection>,
}

impl IndexStore {
	pub fn open(database_url: &str) -> Result<Self, rusqlite::Error> {
		let conn = if database_url == ":memory:" {
			Connection::open_in_memory()?
		} else {
			Connection::open(database_url)?
		};

		conn.execute_batch(
			"PRAGMA journal_mode=WAL;
			 PRAGMA synchronous=NORMAL;
			 CREATE TABLE IF NOT EXISTS file_index (
				id TEXT PRIMARY KEY,
				base_path TEXT NOT NULL,
				rel_path TEXT NOT NULL,
				dev INTEGER NOT NULL,
				ino INTEGER NOT NULL,
				size INTEGER NOT NULL,
				mtime_ms INTEGER NOT NULL,
				is_dir INTEGER NOT NULL,
				indexed_at INTEGER NOT NULL,
				UNIQUE(base_path, rel_path)
			 );
			 CREATE INDEX IF NOT EXISTS idx_file_index_dev_ino ON file_index(dev, ino);
			 CREATE INDEX IF NOT EXISTS idx_file_index_base ON file_index(base_path);
			 CREATE TABLE IF NOT EXISTS scan_state (
				base_path TEXT NOT NULL,
				dir_path TEXT NOT NULL,
				mtime_ms INTEGER NOT NULL,
				scanned_at INTEGER NOT NULL,
				PRIMARY KEY (base_path, dir_path)
			 );",
		)?;

		Ok(IndexStore { conn: Mutex::new(conn) })
	}

	/// `indexFile`: insert, update-in-place, or reassign-on-move.
	pub fn index_file(
		&self,
		base_path: &str,
		rel_path: &str,
		stat: StatInput,
		indexed_at: i64,
	) -> Result<(String, IndexAction), rusqlite::Error> {
		let conn = self.conn.lock().unwrap();

		let existing_id: Option<String> = conn
			.query_row(
				"SELECT id FROM file_index WHERE base_path = ?1 AND rel_path = ?2",
				params![base_path, rel_path],
				|row| row.get(0),
			)
			.optional()?;

		if let Some(id) = existing_id {
			conn.execute(
				"UPDATE file_index SET dev=?1, ino=?2, size=?3, mtime_ms=?4, is_dir=?5, indexed_at=?6
				 WHERE id=?7",
				params![
					stat.dev as i64,
					stat.ino as i64,
					stat.size as i64,
					stat.mtime_ms,
					stat.is_dir,
					indexed_at,
					id
				],
			)?;
			return Ok((id, IndexAction::Existing));
		}

		let moved_id: Option<String> = conn
			.query_row(
				"SELECT id FROM file_index WHERE dev = ?1 AND ino = ?2",
				params![stat.dev as i64, stat.ino as i64],
				|row| row.get(0),
			)
			.optional()?;

		if let Some(id) = moved_id {
			conn.execute(
				"UPDATE file_index
				 SET base_path=?1, rel_path=?2, size=?3, mtime_ms=?4, is_dir=?5, indexed_at=?6
				 WHERE id=?7",
				params![base_path, rel_path, stat.size as i64, stat.mtime_ms, stat.is_dir, indexed_at, id],
			)?;
			return Ok((id, IndexAction::Moved));
		}

		let id = Uuid::now_v7().to_string();
		conn.execute(
			"INSERT INTO file_index (id, base_path, rel_path, dev, ino, size, mtime_ms, is_dir, indexed_at)
			 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
			params![
				id,
				base_path,
				rel_path,
				stat.dev as i64,
				stat.ino as i64,
				stat.size as i64,
				stat.mtime_ms,
				stat.is_dir,
				indexed_at
			],
		)?;
		Ok((id, IndexAction::Added))
	}

	pub fn resolve_id(&self, id: &str) -> Result<Option<IndexEntry>, rusqlite::Error> {
		let conn = self.conn.lock().unwrap();
		conn.query_row(
			"SELECT id, base_path, rel_path, dev, ino, size, mtime_ms, is_dir, indexed_at
			 FROM file_index WHERE id = ?1",
			params![id],
			row_to_entry,
		)
		.optional()
	}

	pub fn identify_path(
		&self,
		base_path: &str,
		rel_path: &str,
	) -> Result<Option<IndexEntry>, rusqlite::Error> {
		let conn = self.conn.lock().unwrap();
		conn.query_row(
			"SELECT id, base_path, rel_path, dev, ino, size, mtime_ms, is_dir, indexed_at
			 FROM file_index WHERE base_path = ?1 AND rel_path = ?2",
			params![base_path, rel_path],
			row_to_entry,
		)
		.optional()
	}

	pub fn remove_from_index(&self, base_path: &str, rel_path: &str) -> Result<usize, rusqlite::Error> {
		let conn = self.conn.lock().unwrap();
		conn.execute(
			"DELETE FROM file_index WHERE base_path = ?1 AND rel_path = ?2",
			params![base_path, rel_path],
		)
	}

	/// Remove `rel_path` itself plus everything under it, using an
	/// escaped LIKE prefix so `%`/`_` in the name cannot match siblings.
	pub fn remove_from_index_recursive(
		&self,
		base_path: &str,
		rel_path: &str,
	) -> Result<usize, rusqlite::Error> {
		let conn = self.conn.lock().unwrap();
		let escaped = like_escape(rel_path);
		let prefix_pattern = format!("{}/%", escaped);
		conn.execute(
			"DELETE FROM file_index
			 WHERE base_path = ?1 AND (rel_path = ?2 OR rel_path LIKE ?3 ESCAPE '\\')",
			params![base_path, rel_path, prefix_pattern],
		)
	}

	pub fn bulk_resolve(&self, ids: &[String]) -> Result<Vec<Option<IndexEntry>>, rusqlite::Error> {
		let conn = self.conn.lock().unwrap();
		let mut out = Vec::with_capacity(ids.len());
		let mut stmt = conn.prepare(
			"SELECT id, base_path, rel_path, dev, ino, size, mtime_ms, is_dir, indexed_at
			 FROM file_index WHERE id = ?1",
		)?;
		for id in ids {
			out.push(stmt.query_row(params![id], row_to_entry).optional()?);
		}
		Ok(out)
	}

	/// Bulk-bump `indexed_at` for everything under `dir` without re-stating
	/// each entry; used when a scan finds the directory's own mtime unchanged.
	pub fn touch_indexed_at_under_dir(
		&self,
		base_path: &str,
		dir: &str,
		ts: i64,
	) -> Result<usize, rusqlite::Error> {
		let conn = self.conn.lock().unwrap();
		let escaped = like_escape(dir);
		let prefix_pattern = format!("{}/%", escaped);
		if dir.is_empty() {
			conn.execute(
				"UPDATE file_index SET indexed_at = ?1 WHERE base_path = ?2",
				params![ts, base_path],
			)
		} else {
			conn.execute(
				"UPDATE file_index SET indexed_at = ?1
				 WHERE base_path = ?2 AND (rel_path = ?3 OR rel_path LIKE ?4 ESCAPE '\\')",
				params![ts, base_path, dir, prefix_pattern],
			)
		}
	}

	/// Delete every row for `base_path` whose `indexed_at` predates `before`
	/// (the current scan's start timestamp) — it wasn't seen this scan.
	pub fn remove_stale_entries(&self, base_path: &str, before: i64) -> Result<usize, rusqlite::Error> {
		let conn = self.conn.lock().unwrap();
		conn.execute(
			"DELETE FROM file_index WHERE base_path = ?1 AND indexed_at < ?2",
			params![base_path, before],
		)
	}

	pub fn get_index_stats(&self) -> Result<IndexStats, rusqlite::Error> {
		let conn = self.conn.lock().unwrap();
		let (total_entries, total_dirs): (u64, u64) = conn.query_row(
			"SELECT COUNT(*), COALESCE(SUM(is_dir), 0) FROM file_index",
			[],
			|row| Ok((row.get::<_, i64>(0)? as u64, row.get::<_, i64>(1)? as u64)),
		)?;
		Ok(IndexStats { total_entries, total_dirs, total_files: total_entries - total_dirs })
	}

	pub fn get_scan_state(
		&self,
		base_path: &str,
		dir_path: &str,
	) -> Result<Option<i64>, rusqlite::Error> {
		let conn = self.conn.lock().unwrap();
		conn.query_row(
			"SELECT mtime_ms FROM scan_state WHERE base_path = ?1 AND dir_path = ?2",
			params![base_path, dir_path],
			|row| row.get(0),
		)
		.optional()
	}

	pub fn set_scan_state(
		&self,
		base_path: &str,
		dir_path: &str,
		mtime_ms: i64,
		scanned_at: i64,
	) -> Result<(), rusqlite::Error> {
		let conn = self.conn.lock().unwrap();
		conn.execute(
			"INSERT INTO scan_state (base_path, dir_path, mtime_ms, scanned_at) VALUES (?1, ?2, ?3, ?4)
			 ON CONFLICT(base_path, dir_path) DO UPDATE SET mtime_ms=excluded.mtime_ms, scanned_at=excluded.scanned_at",
			params![base_path, dir_path, mtime_ms, scanned_at],
		)?;
		Ok(())
	}
}

fn row_to_entry(row: &rusqlite::Row) -> Result<IndexEntry, rusqlite::Error> {
	Ok(IndexEntry {
		id: row.get(0)?,
		base_path: row.get(1)?,
		rel_path: row.get(2)?,
		dev: row.get::<_, i64>(3)? as u64,
		ino: row.get::<_, i64>(4)? as u64,
		size: row.get::<_, i64>(5)? as u64,
		mtime_ms: row.get(6)?,
		is_dir: row.get(7)?,
		indexed_at: row.get(8)?,
	})
}

/// Convert a filesystem path + stat result into the store's call shape.
pub fn stat_input(meta: &std::fs::Metadata) -> StatInput {
	use std::os::unix::fs::MetadataExt;
	StatInput {
		dev: meta.dev(),
		ino: meta.ino(),
		size: meta.len(),
		mtime_ms: meta.mtime() * 1000 + meta.mtime_nsec() / 1_000_000,
		is_dir: meta.is_dir(),
	}
}

pub fn rel_path_of<'a>(base: &Path, full: &'a Path) -> Option<&'a Path> {
	full.strip_prefix(base).ok()
}


// vim: ts=4
