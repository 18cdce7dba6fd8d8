//! X.509 certificate parsing.
//!
//! Extracts the identity and validity fields kept in a [`CertificateRecord`].
//! Names are rendered in RFC 2253 form: most specific RDN first, `,` between
//! RDNs and `+` inside multi-valued ones.
//!
//! [`CertificateRecord`]: super::CertificateRecord

use chrono::{DateTime, Utc};
use std::fmt::Write;
use thiserror::Error;
use x509_parser::prelude::*;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("{0}")]
    Der(String),

    #[error("validity timestamp {0} is out of range")]
    TimestampOutOfRange(i64),
}

/// Fields decoded from a single DER-encoded certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCertificate {
    pub subject: String,
    pub issuer: String,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
}

/// Parses subject, issuer and validity window from DER-encoded X.509 data.
///
/// Decoding is all-or-nothing: any failure yields an error and no fields.
pub fn parse_certificate(der: &[u8]) -> Result<ParsedCertificate, ParseError> {
    let (_, cert) =
        X509Certificate::from_der(der).map_err(|e| ParseError::Der(e.to_string()))?;

    let validity = cert.validity();

    Ok(ParsedCertificate {
        subject: rfc2253_name(cert.subject()),
        issuer: rfc2253_name(cert.issuer()),
        valid_from: to_utc(validity.not_before.timestamp())?,
        valid_to: to_utc(validity.not_after.timestamp())?,
    })
}

/// Formats a name as an RFC 2253 distinguished name.
fn rfc2253_name(name: &X509Name<'_>) -> String {
    let rdns: Vec<String> = name
        .iter_rdn()
        .map(|rdn| {
            rdn.iter()
                .map(|attr| format!("{}={}", attribute_keyword(attr), attribute_value(attr)))
                .collect::<Vec<_>>()
                .join("+")
        })
        .collect();

    rdns.into_iter().rev().collect::<Vec<_>>().join(",")
}

fn attribute_keyword(attr: &AttributeTypeAndValue<'_>) -> String {
    let oid = attr.attr_type().to_id_string();
    let keyword = match oid.as_str() {
        "2.5.4.3" => "CN",
        "2.5.4.6" => "C",
        "2.5.4.7" => "L",
        "2.5.4.8" => "ST",
        "2.5.4.9" => "STREET",
        "2.5.4.10" => "O",
        "2.5.4.11" => "OU",
        "0.9.2342.19200300.100.1.1" => "UID",
        "0.9.2342.19200300.100.1.25" => "DC",
        _ => return oid,
    };
    keyword.to_string()
}

/// String values are escaped; anything else is written as `#` and hex.
fn attribute_value(attr: &AttributeTypeAndValue<'_>) -> String {
    match attr.as_str() {
        Ok(value) => escape_value(value),
        Err(_) => attr
            .as_slice()
            .iter()
            .fold(String::from("#"), |mut out, byte| {
                let _ = write!(out, "{:02x}", byte);
                out
            }),
    }
}

fn escape_value(value: &str) -> String {
    let last = value.chars().count().saturating_sub(1);
    let mut out = String::with_capacity(value.len());

    for (i, c) in value.chars().enumerate() {
        let needs_escape = matches!(c, ',' | '+' | '"' | '\\' | '<' | '>' | ';')
            || (i == 0 && (c == '#' || c == ' '))
            || (i == last && c == ' ');
        if needs_escape {
            out.push('\\');
        }
        out.push(c);
    }

    out
}

fn to_utc(timestamp: i64) -> Result<DateTime<Utc>, ParseError> {
    DateTime::<Utc>::from_timestamp(timestamp, 0).ok_or(ParseError::TimestampOutOfRange(timestamp))
}
