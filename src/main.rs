use std::{net::SocketAddr, sync::Arc};

use cert_tracker::{
    routes, CertificateService, Config, SqliteCertificateStore, TlsCertificateFetcher,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cert_tracker=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::info!(
        port = config.port,
        database = %config.database_path,
        timeout_ms = config.fetch_timeout_ms,
        require_ok_status = config.require_ok_status,
        "Starting certificate tracker"
    );

    let store = SqliteCertificateStore::open(&config.database_path)?;
    let fetcher = TlsCertificateFetcher::new(config.fetcher_settings())?;
    let service = CertificateService::new(Arc::new(fetcher), Arc::new(store));

    // Build CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::router(service)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
