//! Verification queries against the frontend's backing database.
//!
//! The harness never owns the schema: every query is raw SQL text supplied by
//! the scenario, and results are compared literally.

pub mod backup;

pub use backup::TableBackup;

use crate::core::SessionToken;
use crate::errors::{ensure_eq, Result};
use rusqlite::types::Value;
use rusqlite::{params, Connection, OpenFlags};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Column name → value of one result row.
pub type Record = BTreeMap<String, Value>;

/// Quotes a string literal for inclusion in SQL text.
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Text form of a column value, as used for hashing and messages.
pub fn render(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => s.clone(),
        Value::Blob(b) => hex::encode(b),
    }
}

pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        info!(path = %path.display(), "database opened");
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
            path: None,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn execute(&self, sql: &str) -> Result<usize> {
        debug!(sql, "execute");
        Ok(self.conn.execute(sql, [])?)
    }

    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        Ok(self.conn.execute_batch(sql)?)
    }

    /// Every row of `sql`, in result order.
    pub fn get_all(&self, sql: &str) -> Result<Vec<Record>> {
        debug!(sql, "select");
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let rows = stmt.query_map([], |row| {
            columns
                .iter()
                .enumerate()
                .map(|(i, name)| Ok((name.clone(), row.get::<_, Value>(i)?)))
                .collect::<rusqlite::Result<Record>>()
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Number of rows `sql` returns.
    pub fn get_count(&self, sql: &str) -> Result<i64> {
        let wrapped = format!("SELECT COUNT(*) FROM ({})", sql.trim().trim_end_matches(';'));
        Ok(self.conn.query_row(&wrapped, [], |row| row.get(0))?)
    }

    /// First column of the first row, `None` when nothing matches.
    pub fn get_value(&self, sql: &str) -> Result<Option<Value>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    pub fn get_row(&self, sql: &str) -> Result<Option<Record>> {
        Ok(self.get_all(sql)?.into_iter().next())
    }

    /// First column of every row.
    pub fn get_column(&self, sql: &str) -> Result<Vec<Value>> {
        let mut stmt = self.conn.prepare(sql)?;
        let values = stmt.query_map([], |row| row.get::<_, Value>(0))?;
        Ok(values.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// SHA-256 over every row and column of `sql`, in result order.
    pub fn get_hash(&self, sql: &str) -> Result<String> {
        let mut stmt = self.conn.prepare(sql)?;
        let width = stmt.column_count();
        let mut rows = stmt.query([])?;

        let mut hasher = Sha256::new();
        while let Some(row) = rows.next()? {
            for i in 0..width {
                let value: Value = row.get(i)?;
                // NULL and the text "NULL" must not collide
                hasher.update([u8::from(value == Value::Null)]);
                hasher.update(render(&value).as_bytes());
                hasher.update([0x1f]);
            }
            hasher.update([0x1e]);
        }
        Ok(hex::encode(hasher.finalize()))
    }

    /// Captures the hash of `sql` so it can be compared after an action.
    pub fn guard_unchanged(&self, sql: impl Into<String>) -> Result<NoChangeGuard<'_>> {
        let sql = sql.into();
        let before = self.get_hash(&sql)?;
        Ok(NoChangeGuard {
            db: self,
            sql,
            before,
        })
    }

    pub fn assert_count(&self, sql: &str, expected: i64) -> Result<()> {
        ensure_eq(format!("Row count of {}", sql), expected, self.get_count(sql)?)
    }

    /// Inserts an active frontend session so a browser can skip the login
    /// form with [`crate::browser::WebSession::login_with_token`].
    pub fn register_session(&self, token: &SessionToken) -> Result<()> {
        self.conn.execute(
            "INSERT INTO sessions (sessionid, userid, lastaccess, status) VALUES (?1, ?2, ?3, 0)",
            params![token.session_id, token.user_id, chrono::Utc::now().timestamp()],
        )?;
        info!(user_id = token.user_id, "session registered");
        Ok(())
    }
}

/// A hash taken before an action that must not touch the rows it covers.
pub struct NoChangeGuard<'a> {
    db: &'a Database,
    sql: String,
    before: String,
}

impl NoChangeGuard<'_> {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn before(&self) -> &str {
        &self.before
    }

    pub fn assert_unchanged(self) -> Result<()> {
        let after = self.db.get_hash(&self.sql)?;
        ensure_eq(format!("Hash of {}", self.sql), self.before, after)
    }
}
