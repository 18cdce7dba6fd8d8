//! Certificate retrieval orchestration.
//!
//! Every retrieval is a single linear pipeline: validate the URL, fetch the
//! leaf certificate, parse it and optionally store the resulting record.
//! Any failure aborts the pipeline; nothing is retried.

use super::fetcher::{CertificateFetcher, FetchError};
use super::parser::parse_certificate;
use super::record::CertificateRecord;
use crate::error::AppError;
use crate::store::CertificateStore;
use std::sync::Arc;
use url::Url;

/// Orchestrates certificate retrieval and the record operations exposed by the API.
#[derive(Clone)]
pub struct CertificateService {
    fetcher: Arc<dyn CertificateFetcher>,
    store: Arc<dyn CertificateStore>,
}

impl CertificateService {
    pub fn new(fetcher: Arc<dyn CertificateFetcher>, store: Arc<dyn CertificateStore>) -> Self {
        Self { fetcher, store }
    }

    /// Retrieves the certificate presented at `url` without storing it.
    pub async fn inspect(&self, url: Option<&str>) -> Result<CertificateRecord, AppError> {
        self.retrieve(url).await
    }

    /// Retrieves the certificate presented at `url` and stores it.
    ///
    /// Returns the record produced by the store, including its ID.
    pub async fn retrieve_and_store(
        &self,
        url: Option<&str>,
    ) -> Result<CertificateRecord, AppError> {
        let record = self.retrieve(url).await?;
        Ok(self.store.save(record).await?)
    }

    pub async fn list_all(&self) -> Result<Vec<CertificateRecord>, AppError> {
        let records = self.store.find_all().await?;
        if records.is_empty() {
            return Err(AppError::EmptyCollection);
        }
        Ok(records)
    }

    pub async fn delete_by_id(&self, id: i64) -> Result<(), AppError> {
        if !self.store.exists_by_id(id).await? {
            return Err(AppError::NotFound(id));
        }

        self.store.delete_by_id(id).await.map_err(|e| {
            tracing::warn!(id, error = %e, "Certificate delete failed");
            AppError::DeleteFailed(e)
        })
    }

    async fn retrieve(&self, raw: Option<&str>) -> Result<CertificateRecord, AppError> {
        let (raw, url) = validate_url(raw)?;

        tracing::debug!(url = %url, "Fetching leaf certificate");

        let der = self.fetcher.fetch(&url).await.map_err(fetch_failure)?;
        let parsed = parse_certificate(der.as_ref())
            .map_err(|e| AppError::MalformedCertificate(e.to_string()))?;

        Ok(CertificateRecord {
            id: None,
            url: raw.to_string(),
            subject: parsed.subject,
            issuer: parsed.issuer,
            valid_from: parsed.valid_from,
            valid_to: parsed.valid_to,
        })
    }
}

/// Checks presence, absolute URL syntax and the `https` scheme, in that order.
pub fn validate_url(raw: Option<&str>) -> Result<(&str, Url), AppError> {
    let raw = match raw {
        Some(raw) if !raw.is_empty() => raw,
        _ => {
            return Err(AppError::InvalidInput(
                "URL cannot be null or empty.".to_string(),
            ))
        }
    };

    let url = Url::parse(raw)
        .map_err(|e| AppError::InvalidInput(format!("Invalid URL format - {}", e)))?;

    // Schemes are normalized to lowercase by the parser
    if url.scheme() != "https" {
        return Err(AppError::UnsupportedScheme);
    }

    Ok((raw, url))
}

fn fetch_failure(err: FetchError) -> AppError {
    match err {
        FetchError::NoServerCertificate => AppError::NoServerCertificate,
        FetchError::UnexpectedStatus(code) => AppError::ConnectionFailed(format!(
            "Failed to establish HTTPS connection. Response code: {}",
            code
        )),
        other => AppError::ConnectionFailed(format!(
            "Error while establishing the HTTPS connection: {}",
            other
        )),
    }
}
