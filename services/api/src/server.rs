use crate::cli::ServeArgs;
use crate::infra::{AppState, DiskImageStore};
use crate::routes::with_marketplace_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use estate_hub::config::AppConfig;
use estate_hub::error::AppError;
use estate_hub::marketplace::{Argon2PasswordHasher, MarketplaceService};
use estate_hub::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(directory) = args.upload_dir.take() {
        config.uploads.directory = directory;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let images = Arc::new(DiskImageStore::open(&config.uploads.directory)?);
    let service = Arc::new(MarketplaceService::new(
        Arc::new(Argon2PasswordHasher),
        images.clone(),
    ));

    let app = with_marketplace_routes(service, images.clone())
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        uploads = %images.root().display(),
        "estate hub ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
