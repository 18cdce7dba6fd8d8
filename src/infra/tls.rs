//! TLS/SSL infrastructure.
//!
//! Provides trait-based abstractions for TLS configuration and connection handling.

use rustls::{ClientConfig, RootCertStore};
use rustls_pki_types::{CertificateDer, ServerName};
use std::{io, sync::Arc};
use tokio::net::TcpStream;
use tokio_rustls::{client::TlsStream, TlsConnector};

/// Trait for TLS configuration providers.
///
/// This abstraction allows for different trust anchors and makes testing
/// against a local CA possible.
pub trait TlsProvider: Send + Sync {
    /// Returns the TLS client configuration.
    fn client_config(&self) -> Arc<ClientConfig>;

    /// Creates a TLS connector from this provider's configuration.
    fn connector(&self) -> TlsConnector {
        TlsConnector::from(self.client_config())
    }
}

/// TLS provider using rustls with a fixed set of trust anchors.
#[derive(Clone)]
pub struct RustlsTlsProvider {
    config: Arc<ClientConfig>,
}

impl RustlsTlsProvider {
    /// Creates a provider trusting Mozilla's root certificates.
    pub fn new() -> Result<Self, rustls::Error> {
        let roots = RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        Ok(Self {
            config: create_tls_config(roots)?,
        })
    }

    /// Creates a provider trusting only the given DER-encoded CA certificates.
    pub fn with_roots<'a, I>(roots: I) -> Result<Self, rustls::Error>
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let mut store = RootCertStore::empty();
        for der in roots {
            store.add(CertificateDer::from(der.to_vec()))?;
        }
        Ok(Self {
            config: create_tls_config(store)?,
        })
    }
}

impl TlsProvider for RustlsTlsProvider {
    fn client_config(&self) -> Arc<ClientConfig> {
        self.config.clone()
    }
}

/// Creates a TLS client configuration over the given root store.
///
/// This configuration:
/// - Uses the ring crypto provider explicitly
/// - Does not use client authentication
/// - Supports TLS 1.2 and TLS 1.3
pub fn create_tls_config(roots: RootCertStore) -> Result<Arc<ClientConfig>, rustls::Error> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());

    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .with_root_certificates(roots)
        .with_no_client_auth();

    Ok(Arc::new(config))
}

/// Establishes a TLS connection over an existing TCP stream.
///
/// `server_name` is used for SNI and may be a DNS name or an IP literal.
pub async fn connect_tls<P: TlsProvider + ?Sized>(
    provider: &P,
    tcp_stream: TcpStream,
    server_name: &str,
) -> Result<TlsStream<TcpStream>, io::Error> {
    let connector = provider.connector();

    let server_name = ServerName::try_from(server_name.to_string()).map_err(|e| {
        io::Error::new(io::ErrorKind::InvalidInput, format!("Invalid server name: {}", e))
    })?;

    connector.connect(server_name, tcp_stream).await
}
