//! Leaf certificate retrieval: fetching, parsing and orchestration.

pub mod fetcher;
pub mod parser;
pub mod record;
pub mod service;

pub use fetcher::{CertificateFetcher, FetchError, FetcherSettings, TlsCertificateFetcher};
pub use parser::{parse_certificate, ParseError, ParsedCertificate};
pub use record::CertificateRecord;
pub use service::{validate_url, CertificateService};
