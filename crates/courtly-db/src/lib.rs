pub mod queries;
pub mod schema;

use anyhow::Result;
use rusqlite::{Connection, Params, Row};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;

/// Fallback location when `COURTLY_DB_PATH` is not set.
pub const DEFAULT_DB_PATH: &str = "tmp/courtly.db";

/// Outcome of a mutating statement: what the driver exposes on the
/// statement context after execution.
#[derive(Debug, Clone, Copy)]
pub struct RunResult {
    pub rows_changed: usize,
    pub last_insert_rowid: i64,
}

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Opens the database file, creating it and its parent directory when
    /// missing, and applies the schema. Safe to call again on the same path:
    /// the DDL is create-if-not-exists throughout.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }

        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;

        schema::apply(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Opens the store at `COURTLY_DB_PATH`, falling back to [`DEFAULT_DB_PATH`].
    pub fn open_default() -> Result<Self> {
        let path = std::env::var("COURTLY_DB_PATH").unwrap_or_else(|_| DEFAULT_DB_PATH.into());
        Self::open(&PathBuf::from(path))
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
        f(&conn)
    }

    /// Executes a mutating statement, returning the changed-row count and
    /// the last inserted rowid.
    pub fn run<P: Params>(&self, sql: &str, params: P) -> Result<RunResult> {
        self.with_conn(|conn| {
            let rows_changed = conn.execute(sql, params)?;
            Ok(RunResult {
                rows_changed,
                last_insert_rowid: conn.last_insert_rowid(),
            })
        })
    }

    /// Executes a read statement, returning the first matching row mapped
    /// through `map`, or `None` when nothing matches.
    pub fn get<T, P, F>(&self, sql: &str, params: P, map: F) -> Result<Option<T>>
    where
        P: Params,
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    {
        self.with_conn(|conn| match conn.query_row(sql, params, map) {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        })
    }

    /// Executes a read statement, returning every matching row.
    pub fn all<T, P, F>(&self, sql: &str, params: P, map: F) -> Result<Vec<T>>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt
                .query_map(params, map)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}
