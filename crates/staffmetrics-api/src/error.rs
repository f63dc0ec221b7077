//! API error type and its HTTP mapping.
//!
//! | Variant | Status |
//! |---------|--------|
//! | `Validation`, `BadRequest` | 400 |
//! | `Unauthorized`, `TokenExpired` | 401 |
//! | `NotFound` | 404 |
//! | `Conflict` | 409 |
//! | `UnknownReference` | 422 |
//! | `RateLimited` | 429 |
//! | `Internal` | 500 |

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

use staffmetrics_core::{FieldError, ValidationErrors};
use staffmetrics_report::ReportError;
use staffmetrics_store::StoreError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("authentication required")]
    Unauthorized,

    #[error("token expired")]
    TokenExpired,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    Conflict(String),

    #[error("unknown reference: {0}")]
    UnknownReference(String),

    #[error("rate limit exceeded")]
    RateLimited { retry_after_secs: u64 },

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<&'a [FieldError]>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "validation failed".to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "authentication required".to_string(),
            ),
            ApiError::TokenExpired => (StatusCode::UNAUTHORIZED, "token expired".to_string()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::UnknownReference(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            ApiError::RateLimited { .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate limit exceeded".to_string(),
            ),
            ApiError::Internal(detail) => {
                error!(error = %detail, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };
        let fields = match &self {
            ApiError::Validation(errors) => Some(errors.fields.as_slice()),
            _ => None,
        };

        let body = Json(ErrorBody {
            error: &message,
            fields,
        });
        let mut response = (status, body).into_response();
        if let ApiError::RateLimited { retry_after_secs } = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }
        response
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation { .. } => ApiError::Conflict(err.to_string()),
            StoreError::ForeignKeyViolation { .. } => ApiError::UnknownReference(err.to_string()),
            StoreError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            StoreError::Invalid { errors, .. } => ApiError::Validation(errors),
            StoreError::Db(_) | StoreError::Migrate(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::Store(inner) => inner.into(),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
