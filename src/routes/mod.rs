pub mod certificates;
pub mod health;
pub mod static_files;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::certificate::CertificateService;

/// Builds the API router over the given service, with the dashboard as fallback.
pub fn router(service: CertificateService) -> Router {
    Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/certificates/info", post(certificates::certificate_info))
        .route("/api/certificates/add", post(certificates::add_certificate))
        .route("/api/certificates/all", get(certificates::all_certificates))
        .route(
            "/api/certificates/delete/:id",
            delete(certificates::delete_certificate),
        )
        .fallback(static_files::serve_static)
        .with_state(service)
}
