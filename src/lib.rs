pub mod certificate;
pub mod config;
pub mod error;
pub mod infra;
pub mod routes;
pub mod store;

pub use certificate::{CertificateRecord, CertificateService, TlsCertificateFetcher};
pub use config::Config;
pub use error::AppError;
pub use store::{CertificateStore, SqliteCertificateStore};
