use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::certificate::{CertificateRecord, CertificateService};
use crate::error::AppError;

/// Body of the info and add endpoints.
#[derive(Debug, Deserialize)]
pub struct UrlRequest {
    #[serde(default)]
    pub url: Option<String>,
}

pub async fn certificate_info(
    State(service): State<CertificateService>,
    Json(request): Json<UrlRequest>,
) -> Result<Json<CertificateRecord>, AppError> {
    tracing::debug!(url = ?request.url, "Inspecting certificate");

    let record = service
        .inspect(request.url.as_deref())
        .await
        .map_err(log_failure)?;

    Ok(Json(record))
}

pub async fn add_certificate(
    State(service): State<CertificateService>,
    Json(request): Json<UrlRequest>,
) -> Result<Json<CertificateRecord>, AppError> {
    tracing::debug!(url = ?request.url, "Adding certificate");

    let record = service
        .retrieve_and_store(request.url.as_deref())
        .await
        .map_err(log_failure)?;

    tracing::info!(id = ?record.id, url = %record.url, "Certificate stored");
    Ok(Json(record))
}

pub async fn all_certificates(
    State(service): State<CertificateService>,
) -> Result<Json<Vec<CertificateRecord>>, AppError> {
    let records = service.list_all().await.map_err(log_failure)?;
    Ok(Json(records))
}

pub async fn delete_certificate(
    State(service): State<CertificateService>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    service.delete_by_id(id).await.map_err(log_failure)?;

    tracing::info!(id, "Certificate deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn log_failure(err: AppError) -> AppError {
    tracing::warn!(code = %err.code(), message = %err, "Request failed");
    err
}
