use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use linkhop_redirector::RedirectorError;
use linkhop_shortener::ShortenerError;
use tracing::warn;

use crate::model::ErrorResponse;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    /// The request body could not be read as a create request.
    BadRequest(String),
    NotFound,
    Redirector(RedirectorError),
    Shortener(ShortenerError),
}

impl From<RedirectorError> for AppError {
    fn from(value: RedirectorError) -> Self {
        Self::Redirector(value)
    }
}

impl From<ShortenerError> for AppError {
    fn from(value: ShortenerError) -> Self {
        Self::Shortener(value)
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, Option<String>) {
        match self {
            AppError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(message.clone()))
            }
            AppError::NotFound => (StatusCode::NOT_FOUND, "not_found", None),
            AppError::Redirector(RedirectorError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "not_found", None)
            }
            AppError::Redirector(RedirectorError::Storage(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "unavailable", None)
            }
            AppError::Shortener(e) => match e {
                ShortenerError::InvalidUrl(m) => (StatusCode::BAD_REQUEST, "invalid_url", Some(m.clone())),
                ShortenerError::InvalidSlug(m) => (StatusCode::BAD_REQUEST, "invalid_slug", Some(m.clone())),
                ShortenerError::InvalidTtl(m) => (StatusCode::BAD_REQUEST, "invalid_ttl", Some(m.clone())),
                ShortenerError::SlugConflict(_) => (StatusCode::CONFLICT, "slug_exists", None),
                ShortenerError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", None),
                ShortenerError::SlugsExhausted(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "slugs_exhausted", Some(e.to_string()))
                }
                ShortenerError::InvalidGeneratedSlug(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal", None)
                }
                ShortenerError::Storage(_) => (StatusCode::SERVICE_UNAVAILABLE, "unavailable", None),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        if status.is_server_error() {
            warn!(status = status.as_u16(), error = code, detail = ?self, "Request failed");
        }

        let body = ErrorResponse {
            error: code.to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}
