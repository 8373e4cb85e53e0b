//! Persistent storage using SQLite (rusqlite)
//!
//! This module provides:
//! - OS-standard data directory location (via `directories` crate)
//! - SQLite database with schema versioning
//! - A durable key/value table (definition cache)
//! - A session-scoped key/value table with idle expiry (word queues)
//! - The `KeyValueStore` seam the cache and queues are written against

pub mod cache;

pub use cache::DefinitionCache;

use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Current schema version. Bump this when making schema changes.
const SCHEMA_VERSION: u32 = 1;

/// Database file name inside the data directory
const DB_FILE: &str = "wordscramble.db";

/// Session rows untouched for longer than this are purged on open
pub const SESSION_IDLE_TTL: Duration = Duration::from_secs(12 * 60 * 60);

/// Errors that can occur during storage operations.
#[derive(Debug)]
pub enum StorageError {
    /// Database error from SQLite
    Database(rusqlite::Error),
    /// Could not determine data directory
    NoDataDirectory,
    /// Schema version mismatch (future version)
    FutureSchemaVersion { found: u32, supported: u32 },
    /// Failed to create data directory
    CreateDirFailed(std::io::Error),
    /// A stored value could not be encoded or decoded
    Encoding(serde_json::Error),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Database(e) => write!(f, "database error: {}", e),
            StorageError::NoDataDirectory => write!(f, "could not determine data directory"),
            StorageError::FutureSchemaVersion { found, supported } => {
                write!(
                    f,
                    "database schema version {} is newer than supported version {}",
                    found, supported
                )
            }
            StorageError::CreateDirFailed(e) => write!(f, "failed to create data directory: {}", e),
            StorageError::Encoding(e) => write!(f, "could not encode stored value: {}", e),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        StorageError::Database(e)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Encoding(e)
    }
}

/// A string key/value store.
///
/// Implemented by the SQLite-backed scopes and by `MemoryStore`.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn put(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Which table a `ScopedStore` reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Survives across sessions
    Durable,
    /// Belongs to the current named session
    Session,
}

/// The main storage handle.
pub struct Storage {
    conn: Mutex<Connection>,
    session: String,
}

impl Storage {
    /// Open or create the storage database.
    ///
    /// Uses `data_dir` when given, otherwise the OS-standard directory:
    /// - Linux: `$XDG_DATA_HOME/wordscramble/` or `~/.local/share/wordscramble/`
    /// - macOS: `~/Library/Application Support/wordscramble/`
    pub fn open(data_dir: Option<&Path>, session: &str) -> Result<Self, StorageError> {
        let data_dir = match data_dir {
            Some(dir) => dir.to_path_buf(),
            None => Self::data_dir()?,
        };

        // Ensure directory exists
        std::fs::create_dir_all(&data_dir).map_err(StorageError::CreateDirFailed)?;

        let conn = Connection::open(data_dir.join(DB_FILE))?;
        let storage = Storage {
            conn: Mutex::new(conn),
            session: session.to_string(),
        };
        storage.initialize_schema()?;
        let purged = storage.purge_idle_sessions(SESSION_IDLE_TTL)?;
        if purged > 0 {
            log::info!("purged {} idle session entries", purged);
        }
        Ok(storage)
    }

    /// Open an in-memory database (for testing).
    #[cfg(test)]
    pub fn open_in_memory(session: &str) -> Result<Self, StorageError> {
        let storage = Storage {
            conn: Mutex::new(Connection::open_in_memory()?),
            session: session.to_string(),
        };
        storage.initialize_schema()?;
        Ok(storage)
    }

    /// Get the OS-standard data directory.
    pub fn data_dir() -> Result<PathBuf, StorageError> {
        ProjectDirs::from("", "", "wordscramble")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or(StorageError::NoDataDirectory)
    }

    /// Name of the session this handle writes to.
    pub fn session(&self) -> &str {
        &self.session
    }

    /// Read a value from the given scope.
    pub fn get(&self, scope: Scope, key: &str) -> Result<Option<String>, StorageError> {
        let conn = self.conn();
        let value = match scope {
            Scope::Durable => conn
                .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                    row.get::<_, String>(0)
                })
                .optional()?,
            Scope::Session => conn
                .query_row(
                    "SELECT value FROM session_kv WHERE session = ?1 AND key = ?2",
                    params![self.session, key],
                    |row| row.get::<_, String>(0),
                )
                .optional()?,
        };
        Ok(value)
    }

    /// Insert or replace a value in the given scope.
    pub fn put(&self, scope: Scope, key: &str, value: &str) -> Result<(), StorageError> {
        let conn = self.conn();
        let now = now_millis();
        match scope {
            Scope::Durable => {
                conn.execute(
                    "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)",
                    params![key, value, now],
                )?;
            }
            Scope::Session => {
                conn.execute(
                    "INSERT OR REPLACE INTO session_kv (session, key, value, updated_at) VALUES (?1, ?2, ?3, ?4)",
                    params![self.session, key, value, now],
                )?;
            }
        }
        Ok(())
    }

    /// Remove everything stored for the current session.
    pub fn clear_session(&self) -> Result<usize, StorageError> {
        let removed = self
            .conn()
            .execute("DELETE FROM session_kv WHERE session = ?1", params![self.session])?;
        Ok(removed)
    }

    /// Remove session rows not written for longer than `ttl`.
    pub fn purge_idle_sessions(&self, ttl: Duration) -> Result<usize, StorageError> {
        let cutoff = now_millis() - ttl.as_millis() as i64;
        let removed = self
            .conn()
            .execute("DELETE FROM session_kv WHERE updated_at < ?1", params![cutoff])?;
        Ok(removed)
    }

    /// Number of durable entries (cached definitions).
    pub fn durable_count(&self) -> Result<i64, StorageError> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM kv", [], |row| row.get(0))?;
        Ok(count)
    }

    /// A `KeyValueStore` view onto one scope of this database.
    pub fn scoped(self: &Arc<Self>, scope: Scope) -> ScopedStore {
        ScopedStore {
            storage: Arc::clone(self),
            scope,
        }
    }

    // Private helper methods

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn initialize_schema(&self) -> Result<(), StorageError> {
        let current_version = self.get_schema_version()?;

        if current_version == 0 {
            self.create_schema_v1()?;
        } else if current_version > SCHEMA_VERSION {
            // Database is from a newer version
            return Err(StorageError::FutureSchemaVersion {
                found: current_version,
                supported: SCHEMA_VERSION,
            });
        }

        Ok(())
    }

    fn get_schema_version(&self) -> Result<u32, StorageError> {
        let conn = self.conn();
        let table_exists: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='meta'",
            [],
            |row| row.get(0),
        )?;

        if !table_exists {
            return Ok(0);
        }

        let version: u32 = conn
            .query_row("SELECT schema_version FROM meta LIMIT 1", [], |row| row.get(0))
            .unwrap_or(0);

        Ok(version)
    }

    fn create_schema_v1(&self) -> Result<(), StorageError> {
        let conn = self.conn();
        conn.execute_batch(
            r#"
            -- Meta table: schema version
            CREATE TABLE meta (
                schema_version INTEGER NOT NULL,
                created_at INTEGER NOT NULL
            );

            -- Durable values (definition cache), never expired
            CREATE TABLE kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );

            -- Session-scoped values (word queues), purged when idle
            CREATE TABLE session_kv (
                session TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL,
                PRIMARY KEY (session, key)
            );

            CREATE INDEX idx_session_kv_updated ON session_kv (updated_at);
            "#,
        )?;

        conn.execute(
            "INSERT INTO meta (schema_version, created_at) VALUES (?1, ?2)",
            params![SCHEMA_VERSION, now_millis()],
        )?;

        Ok(())
    }
}

/// One scope of a shared `Storage`.
#[derive(Clone)]
pub struct ScopedStore {
    storage: Arc<Storage>,
    scope: Scope,
}

impl KeyValueStore for ScopedStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage.get(self.scope, key)
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage.put(self.scope, key, value)
    }
}

/// A process-local store, used in tests and when the database is unavailable.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.values().len()
    }

    fn values(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values().get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
