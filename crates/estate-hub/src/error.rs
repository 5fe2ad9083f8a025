use crate::config::ConfigError;
use crate::marketplace::{MarketplaceError, UploadError};
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Marketplace(MarketplaceError),
    Upload(UploadError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Marketplace(err) => write!(f, "marketplace error: {}", err),
            AppError::Upload(err) => write!(f, "upload error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Marketplace(err) => Some(err),
            AppError::Upload(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Marketplace(err) => err.status_code(),
            AppError::Upload(UploadError::UnsupportedFileType { .. }) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            AppError::Upload(UploadError::InvalidContent) => StatusCode::BAD_REQUEST,
            AppError::Upload(UploadError::Storage(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Config(_) | AppError::Telemetry(_) | AppError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<MarketplaceError> for AppError {
    fn from(value: MarketplaceError) -> Self {
        Self::Marketplace(value)
    }
}

impl From<UploadError> for AppError {
    fn from(value: UploadError) -> Self {
        Self::Upload(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marketplace::{AccessDenied, DenialReason, GuardedAction};

    #[test]
    fn marketplace_errors_keep_their_status() {
        let denied = AppError::from(MarketplaceError::from(AccessDenied {
            action: GuardedAction::PostProperty,
            reason: DenialReason::WrongRole,
        }));
        assert_eq!(denied.into_response().status(), StatusCode::FORBIDDEN);

        let missing = AppError::from(MarketplaceError::InvalidCredentials);
        assert_eq!(missing.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn storage_failures_are_server_errors() {
        let err = AppError::from(UploadError::Storage("disk full".to_string()));
        assert_eq!(
            err.to_string(),
            "upload error: image storage unavailable: disk full"
        );
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
