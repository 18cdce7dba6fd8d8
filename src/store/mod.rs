//! Persistence for certificate records.
//!
//! The retrieval pipeline only ever appends through [`CertificateStore::save`];
//! listing and deletion are pass-through operations used by the API.

pub mod sqlite;

use crate::certificate::CertificateRecord;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

pub use sqlite::SqliteCertificateStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage task failed: {0}")]
    Task(String),

    #[error("Record already has ID {0}")]
    AlreadyPersisted(i64),

    #[error("Stored timestamp {0} is out of range")]
    InvalidTimestamp(i64),
}

pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Trait for certificate record storage.
///
/// Identities are assigned by the store; `save` rejects records that
/// already carry one.
pub trait CertificateStore: Send + Sync {
    /// Stores a transient record and returns it with its assigned ID.
    fn save(&self, record: CertificateRecord) -> StoreFuture<'_, CertificateRecord>;

    fn find_all(&self) -> StoreFuture<'_, Vec<CertificateRecord>>;

    fn find_by_id(&self, id: i64) -> StoreFuture<'_, Option<CertificateRecord>>;

    fn exists_by_id(&self, id: i64) -> StoreFuture<'_, bool>;

    fn delete_by_id(&self, id: i64) -> StoreFuture<'_, ()>;
}
