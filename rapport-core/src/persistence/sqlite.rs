//! SQLite store.
//!
//! Each user's [`RelationshipRecord`] is serialised to JSON and stored as
//! one row:
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS relationships (
//!     user_key   TEXT PRIMARY KEY,
//!     data       BLOB NOT NULL,
//!     updated_at TEXT NOT NULL,
//!     checksum   TEXT
//! );
//! ```
//!
//! WAL mode keeps reads cheap while a save is in flight. The optional CRC-32
//! only detects corruption; a mismatch is logged and the row is still
//! returned.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags, params};
use tracing::{debug, info, warn};

use crate::config::PersistenceConfig;
use crate::error::Result;
use crate::memory::RelationshipRecord;
use crate::persistence::RelationshipStore;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS relationships (
    user_key   TEXT PRIMARY KEY,
    data       BLOB NOT NULL,
    updated_at TEXT NOT NULL,
    checksum   TEXT
);";

// ---------------------------------------------------------------------------
// CRC-32
// ---------------------------------------------------------------------------

/// CRC-32 (ISO 3309) of `data` as lowercase hex.
fn crc32_hex(data: &[u8]) -> String {
    format!("{:08x}", crc32(data))
}

fn crc32(data: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB8_8320;
    let mut crc: u32 = 0xFFFF_FFFF;
    for &byte in data {
        crc ^= u32::from(byte);
        for _ in 0..8 {
            crc = if crc & 1 == 1 { (crc >> 1) ^ POLY } else { crc >> 1 };
        }
    }
    !crc
}

// ---------------------------------------------------------------------------
// SqliteStore
// ---------------------------------------------------------------------------

/// A [`RelationshipStore`] backed by a single SQLite database.
///
/// ```no_run
/// # use rapport_core::persistence::{RelationshipStore, SqliteStore};
/// # use rapport_core::config::PersistenceConfig;
/// # use rapport_core::memory::RelationshipRecord;
/// let store = SqliteStore::open("relationships.db", &PersistenceConfig::default())?;
/// store.save(&RelationshipRecord::new("user-1", chrono::Utc::now()))?;
/// let loaded = store.load("user-1")?;
/// # Ok::<(), rapport_core::RapportError>(())
/// ```
pub struct SqliteStore {
    conn: Mutex<Connection>,
    config: PersistenceConfig,
    db_path: PathBuf,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("db_path", &self.db_path)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open (or create) a database at `path` and ensure the schema exists.
    ///
    /// # Errors
    /// Returns `RapportError::Database` on SQLite failures.
    pub fn open<P: AsRef<Path>>(path: P, config: &PersistenceConfig) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&db_path, flags)?;

        if config.wal_mode {
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        }
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        conn.execute_batch("PRAGMA busy_timeout = 5000;")?;
        conn.execute_batch(SCHEMA)?;

        info!(path = %db_path.display(), wal = config.wal_mode, "Relationship store opened");

        Ok(Self {
            conn: Mutex::new(conn),
            config: config.clone(),
            db_path,
        })
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    /// Returns `RapportError::Database` on SQLite failures.
    pub fn open_in_memory(config: &PersistenceConfig) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            config: config.clone(),
            db_path: PathBuf::from(":memory:"),
        })
    }

    /// Number of stored records.
    ///
    /// # Errors
    /// Returns `RapportError::Database` on SQLite failures.
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .lock()
            .query_row("SELECT COUNT(*) FROM relationships", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Copy the database to `dest_path` with SQLite's online-backup API.
    ///
    /// # Errors
    /// Returns `RapportError::Database` on SQLite failures.
    pub fn backup<P: AsRef<Path>>(&self, dest_path: P) -> Result<()> {
        let start = Instant::now();
        let mut dest = Connection::open(dest_path.as_ref())?;
        let conn = self.conn.lock();
        let backup = rusqlite::backup::Backup::new(&conn, &mut dest)?;
        backup.run_to_completion(256, std::time::Duration::from_millis(50), None)?;

        info!(
            dest = %dest_path.as_ref().display(),
            elapsed_ms = start.elapsed().as_millis(),
            "Relationship store backup completed"
        );
        Ok(())
    }

    /// Run `PRAGMA integrity_check`; `true` means the database is sound.
    ///
    /// # Errors
    /// Returns `RapportError::Database` if the check itself fails.
    pub fn integrity_check(&self) -> Result<bool> {
        let result: String = self
            .conn
            .lock()
            .query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        Ok(result == "ok")
    }

    /// Path of the database file, or `:memory:`.
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

impl RelationshipStore for SqliteStore {
    fn save(&self, record: &RelationshipRecord) -> Result<()> {
        let start = Instant::now();
        let json = serde_json::to_vec(record)?;
        let checksum = self.config.checksum_enabled.then(|| crc32_hex(&json));
        let now = Utc::now().to_rfc3339();

        self.conn.lock().execute(
            "INSERT INTO relationships (user_key, data, updated_at, checksum)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(user_key) DO UPDATE SET
                data = excluded.data,
                updated_at = excluded.updated_at,
                checksum = excluded.checksum",
            params![record.user_key, json, now, checksum],
        )?;

        debug!(
            user = %record.user_key,
            episodes = record.episodes.len(),
            bytes = json.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Saved relationship record"
        );
        Ok(())
    }

    fn load(&self, user_key: &str) -> Result<Option<RelationshipRecord>> {
        let start = Instant::now();
        let row: Option<(Vec<u8>, Option<String>)> = {
            let conn = self.conn.lock();
            let mut stmt =
                conn.prepare_cached("SELECT data, checksum FROM relationships WHERE user_key = ?1")?;
            let row = stmt
                .query_row(params![user_key], |row| Ok((row.get(0)?, row.get(1)?)))
                .optional()?;
            row
        };

        let Some((data, stored_checksum)) = row else {
            return Ok(None);
        };

        if self.config.checksum_enabled {
            if let Some(expected) = stored_checksum {
                let actual = crc32_hex(&data);
                if expected != actual {
                    warn!(
                        user = %user_key,
                        expected = %expected,
                        actual = %actual,
                        "Checksum mismatch, stored record may be corrupt"
                    );
                }
            }
        }

        let record = RelationshipRecord::from_slice(&data)?;
        debug!(
            user = %user_key,
            episodes = record.episodes.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Loaded relationship record"
        );
        Ok(Some(record))
    }

    fn delete(&self, user_key: &str) -> Result<bool> {
        let deleted = self
            .conn
            .lock()
            .execute("DELETE FROM relationships WHERE user_key = ?1", params![user_key])?;
        Ok(deleted > 0)
    }

    fn list_keys(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached("SELECT user_key FROM relationships")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut keys = Vec::new();
        for key in rows {
            keys.push(key?);
        }
        Ok(keys)
    }
}

/// Adds `.optional()` to `rusqlite::Result`, turning `QueryReturnedNoRows`
/// into `Ok(None)`.
trait OptionalExt<T> {
    fn optional(self) -> std::result::Result<Option<T>, rusqlite::Error>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> std::result::Result<Option<T>, rusqlite::Error> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
