//! HTTP API tests driving the router with a stub fetcher and an in-memory store.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use cert_tracker::certificate::{CertificateFetcher, FetchError};
use cert_tracker::{
    routes, CertificateRecord, CertificateService, CertificateStore, SqliteCertificateStore,
};
use chrono::{TimeZone, Utc};
use http_body_util::BodyExt;
use rustls::pki_types::CertificateDer;
use serde_json::{json, Value};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tower::ServiceExt;
use url::Url;

const LEAF_DER: &[u8] = include_bytes!("fixtures/localhost.der");

/// Serves the fixture leaf for every host except `down.example`.
struct FixtureFetcher;

impl CertificateFetcher for FixtureFetcher {
    fn fetch<'a>(
        &'a self,
        url: &'a Url,
    ) -> Pin<Box<dyn Future<Output = Result<CertificateDer<'static>, FetchError>> + Send + 'a>>
    {
        Box::pin(async move {
            match url.host_str() {
                Some("down.example") => Err(FetchError::UnexpectedStatus(503)),
                _ => Ok(CertificateDer::from(LEAF_DER.to_vec())),
            }
        })
    }
}

fn app() -> (Router, Arc<SqliteCertificateStore>) {
    let store = Arc::new(SqliteCertificateStore::in_memory().unwrap());
    let service = CertificateService::new(Arc::new(FixtureFetcher), store.clone());
    (routes::router(service), store)
}

fn sample(url: &str) -> CertificateRecord {
    CertificateRecord {
        id: None,
        url: url.to_string(),
        subject: "CN=google.com".to_string(),
        issuer: "CN=issuer.com".to_string(),
        valid_from: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        valid_to: Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap(),
    }
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn health_reports_ok() {
    let (app, _) = app();
    let (status, body) = send(app, Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn info_returns_transient_record() {
    let (app, store) = app();
    let (status, body) = send(
        app,
        Method::POST,
        "/api/certificates/info",
        Some(json!({ "url": "https://www.google.com" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["id"].is_null());
    assert_eq!(body["url"], "https://www.google.com");
    assert!(body["subject"].as_str().unwrap().contains("CN=localhost"));
    assert!(body["issuer"].is_string());
    assert!(body["validFrom"].is_string());
    assert!(body["validTo"].is_string());
    assert!(store.find_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn add_returns_stored_record() {
    let (app, store) = app();
    let (status, body) = send(
        app,
        Method::POST,
        "/api/certificates/add",
        Some(json!({ "url": "https://www.google.com" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["id"].is_i64());
    assert_eq!(body["url"], "https://www.google.com");
    assert_eq!(store.find_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn add_rejects_plain_http() {
    let (app, store) = app();
    let (status, body) = send(
        app,
        Method::POST,
        "/api/certificates/add",
        Some(json!({ "url": "http://www.google.com" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Error processing certificate");
    assert_eq!(body["message"], "Only HTTPS URLs are supported.");
    assert!(store.find_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn info_rejects_missing_url() {
    let (app, _) = app();
    let (status, body) = send(app, Method::POST, "/api/certificates/info", Some(json!({}))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "INVALID_INPUT");
    assert_eq!(body["message"], "URL cannot be null or empty.");
}

#[tokio::test]
async fn info_rejects_invalid_url() {
    let (app, _) = app();
    let (status, body) = send(
        app,
        Method::POST,
        "/api/certificates/info",
        Some(json!({ "url": "invalid url" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Invalid URL format - "));
}

#[tokio::test]
async fn add_reports_unreachable_host() {
    let (app, store) = app();
    let (status, body) = send(
        app,
        Method::POST,
        "/api/certificates/add",
        Some(json!({ "url": "https://down.example" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "CONNECTION_FAILED");
    assert_eq!(
        body["message"],
        "Failed to establish HTTPS connection. Response code: 503"
    );
    assert!(store.find_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn all_lists_every_record() {
    let (app, store) = app();
    store.save(sample("https://www.google.com")).await.unwrap();
    store.save(sample("https://www.github.com")).await.unwrap();

    let (status, body) = send(app, Method::GET, "/api/certificates/all", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn all_on_empty_store_is_not_found() {
    let (app, _) = app();
    let (status, body) = send(app, Method::GET, "/api/certificates/all", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "No Content Found");
    assert_eq!(body["message"], "No certificates found in the database");
}

#[tokio::test]
async fn delete_existing_returns_no_content() {
    let (app, store) = app();
    let saved = store.save(sample("https://www.google.com")).await.unwrap();
    let id = saved.id.unwrap();

    let (status, body) = send(
        app,
        Method::DELETE,
        &format!("/api/certificates/delete/{}", id),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());
    assert!(!store.exists_by_id(id).await.unwrap());
}

#[tokio::test]
async fn delete_unknown_is_not_found() {
    let (app, _) = app();
    let (status, body) = send(app, Method::DELETE, "/api/certificates/delete/999", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Certificate not Found");
    assert_eq!(body["message"], "Certificate with ID 999 not found");
}

async fn get_page(app: Router, uri: &str) -> (StatusCode, String, String) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, content_type, String::from_utf8_lossy(&bytes).into_owned())
}

#[tokio::test]
async fn root_serves_dashboard() {
    let (app, _) = app();
    let (status, content_type, body) = get_page(app, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.starts_with("text/html"), "got {content_type}");
    assert!(body.contains("<table id=\"certificates\">"));
    assert!(body.contains("id=\"add-form\""));
}

#[tokio::test]
async fn dashboard_assets_have_content_types() {
    let (app, _) = app();
    let (status, content_type, body) = get_page(app.clone(), "/app.js").await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.contains("javascript"), "got {content_type}");
    assert!(body.contains("/api/certificates/all"));

    let (status, content_type, _) = get_page(app, "/style.css").await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.starts_with("text/css"), "got {content_type}");
}

#[tokio::test]
async fn unknown_page_falls_back_to_dashboard() {
    let (app, _) = app();
    let (status, content_type, _) = get_page(app, "/certificates/42").await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.starts_with("text/html"));
}

#[tokio::test]
async fn unknown_api_path_is_not_found() {
    let (app, _) = app();
    let (status, _, _) = get_page(app, "/api/unknown").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
