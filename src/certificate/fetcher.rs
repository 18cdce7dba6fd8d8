//! Leaf certificate retrieval over a fresh TLS connection.
//!
//! Each fetch resolves the host, opens one TCP connection, completes the TLS
//! handshake and captures the first certificate of the peer chain. When the
//! status check is enabled the same session is used for a single `GET` whose
//! response must be `200 OK`. Redirects to other `https` locations are
//! followed on a new connection, up to [`MAX_REDIRECTS`] hops, and the
//! certificate of the final hop is returned.

use crate::infra::{
    connect_tls, DnsError, DnsResolver, HickoryDnsResolver, RustlsTlsProvider, TlsProvider,
};
use http_body_util::Empty;
use hyper::{
    body::Bytes,
    header::{CONNECTION, HOST, LOCATION, USER_AGENT},
    Method, Request, StatusCode,
};
use hyper_util::rt::TokioIo;
use rustls_pki_types::CertificateDer;
use std::{future::Future, io, net::SocketAddr, pin::Pin, time::Duration};
use thiserror::Error;
use tokio::{net::TcpStream, task::JoinHandle, time::timeout};
use tokio_rustls::client::TlsStream;
use url::{Position, Url};

/// Default timeout applied to each network step.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Maximum number of redirects to follow.
pub const MAX_REDIRECTS: usize = 5;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("URL has no host")]
    MissingHost,

    #[error(transparent)]
    Dns(#[from] DnsError),

    #[error("TCP connection to {addr} failed: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("TLS handshake failed: {0}")]
    Handshake(#[source] io::Error),

    #[error("HTTP exchange failed: {0}")]
    Http(#[from] hyper::Error),

    #[error("Failed to build request: {0}")]
    Request(String),

    #[error("{0} timed out after {1:?}")]
    Timeout(&'static str, Duration),

    #[error("Unexpected response status {0}")]
    UnexpectedStatus(u16),

    #[error("Too many redirects (limit {0})")]
    TooManyRedirects(usize),

    #[error("No server certificates found.")]
    NoServerCertificate,
}

/// Knobs for a single fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetcherSettings {
    /// Limit for each of DNS, connect, handshake and response.
    pub timeout: Duration,
    /// Require `200 OK` for a `GET` of the URL after the handshake.
    pub require_ok_status: bool,
}

impl Default for FetcherSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            require_ok_status: true,
        }
    }
}

/// Trait for components that obtain the leaf certificate of an HTTPS URL.
///
/// The URL is expected to be validated as `https` by the caller.
pub trait CertificateFetcher: Send + Sync {
    fn fetch<'a>(
        &'a self,
        url: &'a Url,
    ) -> Pin<Box<dyn Future<Output = Result<CertificateDer<'static>, FetchError>> + Send + 'a>>;
}

/// Production fetcher built on tokio, rustls and hyper.
pub struct TlsCertificateFetcher<P = RustlsTlsProvider, R = HickoryDnsResolver> {
    tls: P,
    resolver: R,
    settings: FetcherSettings,
}

impl TlsCertificateFetcher {
    /// Creates a fetcher trusting Mozilla's roots and using the shared resolver.
    pub fn new(settings: FetcherSettings) -> Result<Self, rustls::Error> {
        Ok(Self::with_parts(
            RustlsTlsProvider::new()?,
            HickoryDnsResolver::new(),
            settings,
        ))
    }
}

impl<P: TlsProvider, R: DnsResolver> TlsCertificateFetcher<P, R> {
    pub fn with_parts(tls: P, resolver: R, settings: FetcherSettings) -> Self {
        Self {
            tls,
            resolver,
            settings,
        }
    }

    async fn fetch_leaf(&self, url: &Url) -> Result<CertificateDer<'static>, FetchError> {
        let mut current = url.clone();
        let mut redirects = 0;

        loop {
            let (tls_stream, leaf) = self.handshake(&current).await?;

            if !self.settings.require_ok_status {
                return Ok(leaf);
            }

            let (status, location) = self.request_status(tls_stream, &current).await?;
            if status == StatusCode::OK {
                return Ok(leaf);
            }

            match redirect_target(&current, status, location.as_deref()) {
                Some(_) if redirects >= MAX_REDIRECTS => {
                    return Err(FetchError::TooManyRedirects(MAX_REDIRECTS));
                }
                Some(next) => {
                    redirects += 1;
                    tracing::debug!(
                        from = %current,
                        to = %next,
                        status = status.as_u16(),
                        "Following redirect"
                    );
                    current = next;
                }
                None => return Err(FetchError::UnexpectedStatus(status.as_u16())),
            }
        }
    }

    /// Resolves, connects and completes the TLS handshake, returning the
    /// session together with the first certificate of the peer chain.
    async fn handshake(
        &self,
        url: &Url,
    ) -> Result<(TlsStream<TcpStream>, CertificateDer<'static>), FetchError> {
        let limit = self.settings.timeout;

        let host = url
            .host_str()
            .ok_or(FetchError::MissingHost)?
            .trim_start_matches('[')
            .trim_end_matches(']');
        let port = url.port_or_known_default().unwrap_or(443);

        let ips = timeout(limit, self.resolver.resolve(host))
            .await
            .map_err(|_| FetchError::Timeout("DNS lookup", limit))??;
        let ip = ips
            .first()
            .copied()
            .ok_or_else(|| DnsError::NoAddresses(host.to_string()))?;
        let addr = SocketAddr::new(ip, port);

        tracing::debug!(url = %url, %addr, "Connecting for certificate retrieval");

        let tcp_stream = timeout(limit, TcpStream::connect(addr))
            .await
            .map_err(|_| FetchError::Timeout("TCP connection", limit))?
            .map_err(|source| FetchError::Connect { addr, source })?;

        let tls_stream = timeout(limit, connect_tls(&self.tls, tcp_stream, host))
            .await
            .map_err(|_| FetchError::Timeout("TLS handshake", limit))?
            .map_err(FetchError::Handshake)?;

        let (_, session) = tls_stream.get_ref();
        let leaf = session
            .peer_certificates()
            .and_then(|chain| chain.first())
            .cloned()
            .ok_or(FetchError::NoServerCertificate)?;

        tracing::debug!(
            url = %url,
            protocol = ?session.protocol_version(),
            leaf_len = leaf.len(),
            "TLS handshake complete"
        );

        Ok((tls_stream, leaf))
    }

    /// Sends one `GET` for the URL over an established session and returns
    /// the status with any `Location` header.
    async fn request_status(
        &self,
        tls_stream: TlsStream<TcpStream>,
        url: &Url,
    ) -> Result<(StatusCode, Option<String>), FetchError> {
        let limit = self.settings.timeout;

        let io = TokioIo::new(tls_stream);
        let (mut sender, conn) = timeout(limit, hyper::client::conn::http1::handshake(io))
            .await
            .map_err(|_| FetchError::Timeout("HTTP handshake", limit))??;

        // Dropped on every return path, which tears down the connection.
        let _driver = AbortOnDrop(tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!("Connection error: {}", e);
            }
        }));

        let host_header = url.host_str().ok_or(FetchError::MissingHost)?;
        let host_value = match url.port() {
            Some(port) => format!("{}:{}", host_header, port),
            None => host_header.to_string(),
        };

        let req = Request::builder()
            .method(Method::GET)
            .uri(&url[Position::BeforePath..Position::AfterQuery])
            .header(HOST, host_value)
            .header(USER_AGENT, concat!("cert-tracker/", env!("CARGO_PKG_VERSION")))
            .header(CONNECTION, "close")
            .body(Empty::<Bytes>::new())
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let response = timeout(limit, sender.send_request(req))
            .await
            .map_err(|_| FetchError::Timeout("HTTP response", limit))??;

        let status = response.status();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        tracing::debug!(
            url = %url,
            status = status.as_u16(),
            ?location,
            "Received status response"
        );

        Ok((status, location))
    }
}

/// Next URL to visit for a redirect response, if it should be followed.
///
/// Relative locations resolve against the current URL. Targets that leave
/// `https` are not followed.
fn redirect_target(current: &Url, status: StatusCode, location: Option<&str>) -> Option<Url> {
    if !matches!(status.as_u16(), 300..=303 | 307 | 308) {
        return None;
    }

    let next = current.join(location?).ok()?;
    (next.scheme() == "https").then_some(next)
}

impl<P: TlsProvider, R: DnsResolver> CertificateFetcher for TlsCertificateFetcher<P, R> {
    fn fetch<'a>(
        &'a self,
        url: &'a Url,
    ) -> Pin<Box<dyn Future<Output = Result<CertificateDer<'static>, FetchError>> + Send + 'a>>
    {
        Box::pin(self.fetch_leaf(url))
    }
}

struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}
