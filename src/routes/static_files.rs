use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
};
use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "frontend/"]
struct DashboardAssets;

/// Serves the embedded dashboard for every path the API does not claim.
pub async fn serve_static(req: Request<Body>) -> Response {
    let path = req.uri().path().trim_start_matches('/');

    // Unknown API paths stay 404 instead of falling back to the page.
    if path == "api" || path.starts_with("api/") {
        return (StatusCode::NOT_FOUND, "Not Found").into_response();
    }

    if let Some(content) = DashboardAssets::get(path) {
        return asset_response(path, content.data.into_owned());
    }

    match DashboardAssets::get("index.html") {
        Some(content) => asset_response("index.html", content.data.into_owned()),
        None => (StatusCode::NOT_FOUND, "Not Found").into_response(),
    }
}

fn asset_response(path: &str, data: Vec<u8>) -> Response {
    let mime = mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string();

    (
        [
            (header::CONTENT_TYPE, mime),
            (header::CACHE_CONTROL, "no-cache".to_string()),
        ],
        data,
    )
        .into_response()
}
