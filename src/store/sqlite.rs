//! SQLite backend: one `kv` table, one row per key.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use super::{PreferenceStore, StoreError, StoreKey, StoreWrite};
use crate::config::limits::SQLITE_BUSY_TIMEOUT_MS;
use crate::config::paths::{SCHEMA_COMPONENT, SCHEMA_VERSION};

const UPSERT_SQL: &str = "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3) \
     ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at";
const DELETE_SQL: &str = "DELETE FROM kv WHERE key = ?1";

pub struct SqliteStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        configure_sqlite(&conn)?;
        init_schema(&conn)?;
        tracing::debug!(target = "overdesk", path = %path.display(), "sqlite store ready");
        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.busy_timeout(Duration::from_millis(SQLITE_BUSY_TIMEOUT_MS))?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn schema_version(&self) -> Result<Option<i64>, StoreError> {
        let conn = self.conn.lock();
        let version = conn
            .query_row(
                "SELECT version FROM schema_version WHERE component = ?1",
                params![SCHEMA_COMPONENT],
                |row| row.get(0),
            )
            .optional()?;
        Ok(version)
    }
}

pub fn configure_sqlite(conn: &Connection) -> Result<(), StoreError> {
    conn.busy_timeout(Duration::from_millis(SQLITE_BUSY_TIMEOUT_MS))?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    Ok(())
}

fn init_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            component TEXT PRIMARY KEY,
            version INTEGER NOT NULL,
            applied_at INTEGER NOT NULL
        );
        CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at INTEGER NOT NULL
        );
        "#,
    )?;
    record_schema_version(conn, SCHEMA_VERSION)
}

fn record_schema_version(conn: &Connection, version: i64) -> Result<(), StoreError> {
    let now = Utc::now().timestamp();
    conn.execute(
        "INSERT OR REPLACE INTO schema_version (component, version, applied_at) VALUES (?1, ?2, ?3)",
        params![SCHEMA_COMPONENT, version, now],
    )?;
    Ok(())
}

impl PreferenceStore for SqliteStore {
    fn get(&self, key: &StoreKey) -> Result<Option<String>, StoreError> {
        let conn = self.conn.lock();
        let value = conn
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                params![key.as_str()],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn put(&self, key: &StoreKey, value: &str) -> Result<(), StoreError> {
        let now = Utc::now().timestamp();
        let conn = self.conn.lock();
        conn.execute(UPSERT_SQL, params![key.as_str(), value, now])?;
        Ok(())
    }

    fn remove(&self, key: &StoreKey) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(DELETE_SQL, params![key.as_str()])?;
        Ok(())
    }

    fn apply(&self, batch: &[StoreWrite]) -> Result<(), StoreError> {
        let now = Utc::now().timestamp();
        let mut conn = self.conn.lock();
        // Dropping the transaction on an early return rolls it back.
        let tx = conn.transaction()?;
        for write in batch {
            match write {
                StoreWrite::Put(key, value) => tx.execute(UPSERT_SQL, params![key.as_str(), value, now])?,
                StoreWrite::Remove(key) => tx.execute(DELETE_SQL, params![key.as_str()])?,
            };
        }
        tx.commit()?;
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<StoreKey>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT key FROM kv WHERE substr(key, 1, ?1) = ?2 ORDER BY key")?;
        let rows = stmt.query_map(params![prefix.len() as i64, prefix], |row| {
            row.get::<_, String>(0)
        })?;
        let mut keys = Vec::new();
        for raw in rows {
            keys.push(StoreKey::parse(&raw?)?);
        }
        Ok(keys)
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}
