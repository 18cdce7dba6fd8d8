//! SQLite-backed certificate store.

use super::{CertificateStore, StoreError, StoreFuture};
use crate::certificate::CertificateRecord;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Raw column values of one `certificates` row.
type RawRow = (i64, String, String, String, i64, i64);

/// Certificate store over a single SQLite connection.
///
/// Statements run on the blocking thread pool, one at a time.
#[derive(Clone)]
pub struct SqliteCertificateStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCertificateStore {
    /// Opens (or creates) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrency
        let mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
        tracing::debug!(journal_mode = %mode, "Opened certificate database");

        Self::init(conn)
    }

    /// Creates a volatile store, mainly for tests.
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS certificates (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                url TEXT NOT NULL,
                subject TEXT NOT NULL,
                issuer TEXT NOT NULL,
                valid_from INTEGER NOT NULL,
                valid_to INTEGER NOT NULL
            )
            "#,
            [],
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|e| StoreError::Task(format!("Lock error: {}", e)))?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn to_record(row: RawRow) -> Result<CertificateRecord, StoreError> {
    let (id, url, subject, issuer, valid_from, valid_to) = row;
    Ok(CertificateRecord {
        id: Some(id),
        url,
        subject,
        issuer,
        valid_from: from_timestamp(valid_from)?,
        valid_to: from_timestamp(valid_to)?,
    })
}

fn from_timestamp(secs: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::<Utc>::from_timestamp(secs, 0).ok_or(StoreError::InvalidTimestamp(secs))
}

impl CertificateStore for SqliteCertificateStore {
    fn save(&self, record: CertificateRecord) -> StoreFuture<'_, CertificateRecord> {
        Box::pin(async move {
            if let Some(id) = record.id {
                return Err(StoreError::AlreadyPersisted(id));
            }

            let saved = self
                .with_conn(move |conn| {
                    conn.execute(
                        "INSERT INTO certificates (url, subject, issuer, valid_from, valid_to) \
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                        params![
                            record.url,
                            record.subject,
                            record.issuer,
                            record.valid_from.timestamp(),
                            record.valid_to.timestamp(),
                        ],
                    )?;
                    let id = conn.last_insert_rowid();
                    Ok(record.with_id(id))
                })
                .await?;

            tracing::debug!(id = ?saved.id, url = %saved.url, "Stored certificate");
            Ok(saved)
        })
    }

    fn find_all(&self) -> StoreFuture<'_, Vec<CertificateRecord>> {
        Box::pin(self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, url, subject, issuer, valid_from, valid_to \
                 FROM certificates ORDER BY id",
            )?;

            let rows = stmt
                .query_map([], read_row)?
                .collect::<Result<Vec<_>, _>>()?;

            rows.into_iter().map(to_record).collect()
        }))
    }

    fn find_by_id(&self, id: i64) -> StoreFuture<'_, Option<CertificateRecord>> {
        Box::pin(self.with_conn(move |conn| {
            let row = conn
                .query_row(
                    "SELECT id, url, subject, issuer, valid_from, valid_to \
                     FROM certificates WHERE id = ?1",
                    [id],
                    read_row,
                )
                .optional()?;

            row.map(to_record).transpose()
        }))
    }

    fn exists_by_id(&self, id: i64) -> StoreFuture<'_, bool> {
        Box::pin(self.with_conn(move |conn| {
            let mut stmt = conn.prepare("SELECT 1 FROM certificates WHERE id = ?1")?;
            Ok(stmt.exists([id])?)
        }))
    }

    fn delete_by_id(&self, id: i64) -> StoreFuture<'_, ()> {
        Box::pin(self.with_conn(move |conn| {
            conn.execute("DELETE FROM certificates WHERE id = ?1", [id])?;
            Ok(())
        }))
    }
}
