use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A leaf certificate observed at a URL.
///
/// `id` is `None` for transient records produced by an inspect-only lookup
/// and is assigned by the store when the record is saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateRecord {
    pub id: Option<i64>,
    pub url: String,
    pub subject: String,
    pub issuer: String,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
}

impl CertificateRecord {
    /// Returns a copy carrying the identity assigned by a store.
    pub fn with_id(self, id: i64) -> Self {
        Self {
            id: Some(id),
            ..self
        }
    }
}
