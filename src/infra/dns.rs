//! DNS resolution infrastructure.
//!
//! Provides a trait-based abstraction for DNS resolution, allowing for
//! dependency injection and easier testing.

use hickory_resolver::{config::*, TokioAsyncResolver};
use std::{future::Future, net::IpAddr, sync::Arc};
use thiserror::Error;
use tokio::sync::OnceCell;

#[derive(Error, Debug)]
pub enum DnsError {
    #[error("DNS lookup failed: {0}")]
    Lookup(#[from] hickory_resolver::error::ResolveError),

    #[error("DNS lookup for {0} returned no addresses")]
    NoAddresses(String),
}

/// Trait for DNS resolution.
///
/// Implementations resolve a hostname to at least one address or fail.
pub trait DnsResolver: Send + Sync {
    fn resolve(&self, host: &str) -> impl Future<Output = Result<Vec<IpAddr>, DnsError>> + Send;
}

/// Global DNS resolver instance shared by all lookups.
static DNS_RESOLVER: OnceCell<Arc<TokioAsyncResolver>> = OnceCell::const_new();

async fn get_resolver() -> Arc<TokioAsyncResolver> {
    DNS_RESOLVER
        .get_or_init(|| async {
            Arc::new(TokioAsyncResolver::tokio(
                ResolverConfig::default(),
                ResolverOpts::default(),
            ))
        })
        .await
        .clone()
}

/// DNS resolver implementation using hickory-resolver.
#[derive(Default, Clone, Copy)]
pub struct HickoryDnsResolver;

impl HickoryDnsResolver {
    pub fn new() -> Self {
        Self
    }
}

impl DnsResolver for HickoryDnsResolver {
    fn resolve(&self, host: &str) -> impl Future<Output = Result<Vec<IpAddr>, DnsError>> + Send {
        let host = host.to_string();
        async move {
            // IP literals never hit the resolver
            if let Ok(ip) = host.parse::<IpAddr>() {
                return Ok(vec![ip]);
            }

            let resolver = get_resolver().await;
            let response = resolver.lookup_ip(host.as_str()).await?;
            let ips: Vec<IpAddr> = response.iter().collect();
            if ips.is_empty() {
                Err(DnsError::NoAddresses(host))
            } else {
                Ok(ips)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_ip_address() {
        let resolver = HickoryDnsResolver::new();
        let ips = resolver.resolve("127.0.0.1").await.unwrap();
        assert_eq!(ips.len(), 1);
        assert_eq!(ips[0].to_string(), "127.0.0.1");
    }

    #[tokio::test]
    async fn test_resolve_ipv6_address() {
        let resolver = HickoryDnsResolver::new();
        let ips = resolver.resolve("::1").await.unwrap();
        assert_eq!(ips, vec!["::1".parse::<IpAddr>().unwrap()]);
    }
}
