use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::dkp::router::service_error_status;
use crate::workflows::dkp::{DkpServiceError, StoreError};
use crate::workflows::roster::RosterImportError;
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
    Server(axum::Error),
    Roster(RosterImportError),
    Dkp(DkpServiceError),
    Settings(serde_json::Error),
    Usage(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Roster(err) => write!(f, "roster import error: {}", err),
            AppError::Dkp(err) => write!(f, "dkp error: {}", err),
            AppError::Settings(err) => write!(f, "invalid settings document: {}", err),
            AppError::Usage(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Roster(err) => Some(err),
            AppError::Dkp(err) => Some(err),
            AppError::Settings(err) => Some(err),
            AppError::Usage(_) => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Roster(_) | AppError::Settings(_) | AppError::Usage(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Dkp(err) => service_error_status(err),
            AppError::Config(_) | AppError::Telemetry(_) | AppError::Io(_) | AppError::Server(_) => {
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

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<RosterImportError> for AppError {
    fn from(value: RosterImportError) -> Self {
        Self::Roster(value)
    }
}

impl From<DkpServiceError> for AppError {
    fn from(value: DkpServiceError) -> Self {
        Self::Dkp(value)
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        Self::Dkp(DkpServiceError::Store(value))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Settings(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::dkp::{PenaltyError, PowerRangeError};

    #[test]
    fn penalty_failures_map_to_unprocessable() {
        let error = AppError::from(DkpServiceError::Penalty(PenaltyError::ResultsRequired));
        assert_eq!(
            error.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn unknown_indexes_map_to_not_found() {
        let range = AppError::from(DkpServiceError::PowerRange(PowerRangeError::UnknownIndex(4)));
        assert_eq!(range.into_response().status(), StatusCode::NOT_FOUND);

        let rule = AppError::from(DkpServiceError::Penalty(PenaltyError::UnknownRule {
            player_id: "42".to_string(),
            index: 0,
        }));
        assert_eq!(rule.into_response().status(), StatusCode::NOT_FOUND);

        let invalid = AppError::from(DkpServiceError::PowerRange(
            PowerRangeError::NonFinitePercentage,
        ));
        assert_eq!(
            invalid.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn roster_failures_map_to_bad_request() {
        let error = AppError::from(RosterImportError::MissingIdColumn);
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn store_failures_map_to_internal_error() {
        let error = AppError::from(StoreError::Unavailable("down".to_string()));
        assert_eq!(
            error.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
