use crate::infra::AppState;
use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use axum::Json;
use estate_hub::error::AppError;
use estate_hub::marketplace::{marketplace_router, ImageStore, MarketplaceService, PasswordHasher};
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

pub(crate) fn with_marketplace_routes<H, I>(
    service: Arc<MarketplaceService<H, I>>,
    images: Arc<I>,
) -> axum::Router
where
    H: PasswordHasher + 'static,
    I: ImageStore + 'static,
{
    marketplace_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/uploads/:filename",
            axum::routing::get(uploaded_image_endpoint::<I>),
        )
        .layer(Extension(images))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Serve a stored listing image with a content type guessed from its extension.
pub(crate) async fn uploaded_image_endpoint<I>(
    Extension(images): Extension<Arc<I>>,
    Path(filename): Path<String>,
) -> Result<Response, AppError>
where
    I: ImageStore + 'static,
{
    let bytes = images.load(&filename).map_err(|err| {
        warn!(%err, %filename, "listing image unavailable");
        AppError::from(err)
    })?;

    let Some(bytes) = bytes else {
        return Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "image not found" })),
        )
            .into_response());
    };

    let content_type = mime_guess::from_path(&filename)
        .first_or_octet_stream()
        .essence_str()
        .to_string();
    Ok((StatusCode::OK, [(header::CONTENT_TYPE, content_type)], bytes).into_response())
}
