//! Infrastructure layer providing abstractions for external dependencies.
//!
//! This module contains traits and implementations for:
//! - DNS resolution
//! - TLS client configuration and handshakes
//!
//! The certificate fetcher is generic over both so tests can point it at a
//! local server and a private CA.

pub mod dns;
pub mod tls;

pub use dns::{DnsError, DnsResolver, HickoryDnsResolver};
pub use tls::{connect_tls, create_tls_config, RustlsTlsProvider, TlsProvider};
