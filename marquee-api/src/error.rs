use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use marquee_booking::BookingError;
use marquee_catalog::CatalogError;

#[derive(Debug)]
pub enum AppError {
    Authentication(String),
    Authorization(String),
    Validation(String),
    NotFound(String),
    Conflict(String),
    Upstream(String),
    Internal(String),
    Anyhow(anyhow::Error),
}

impl AppError {
    pub fn from_booking(err: BookingError) -> Self {
        match err {
            BookingError::EmptySeatSelection | BookingError::DuplicateSeat(_) => {
                AppError::Validation(err.to_string())
            }
            BookingError::SeatsTaken(_) => AppError::Conflict(err.to_string()),
            BookingError::ShowNotFound(_) | BookingError::BookingNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            BookingError::Store(e) => AppError::Internal(e.to_string()),
        }
    }

    pub fn from_catalog(err: CatalogError) -> Self {
        match err {
            CatalogError::Request(e) => AppError::Upstream(e.to_string()),
            CatalogError::Store(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Authentication(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Authorization(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Upstream(msg) => {
                tracing::warn!("Upstream service failure: {}", msg);
                (StatusCode::BAD_GATEWAY, "Upstream service unavailable".to_string())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Anyhow(err.into())
    }
}
