//! Response types and error handling for API endpoints
//!
//! Every body leaving the API is an [`ApiResponse`] envelope. Errors are
//! turned into one through the business code registry.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};
use validator::ValidationErrors;
use yishan_common::{ApiResponse, AppError, BusinessCode};
use yishan_core::DomainError;
use yishan_service::ServiceError;

/// API error type for consistent error responses
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    App(#[from] AppError),

    #[error("{0}")]
    Service(#[from] ServiceError),

    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Invalid path parameter: {0}")]
    InvalidPath(String),

    #[error("Invalid query parameter: {0}")]
    InvalidQuery(String),

    #[error("Missing authorization header")]
    MissingAuth,

    #[error("Invalid authorization header format")]
    InvalidAuthFormat,

    #[error("Administrator role required")]
    Forbidden,

    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),
}

impl ApiError {
    /// Business code this error is reported with
    #[must_use]
    pub fn business_code(&self) -> BusinessCode {
        match self {
            Self::App(e) => e.business_code(),
            Self::Service(e) => e.business_code(),
            Self::Domain(e) => AppError::domain_code(e),
            Self::Validation(_) => BusinessCode::ValidationError,
            Self::InvalidBody(_) | Self::InvalidPath(_) | Self::InvalidQuery(_) => {
                BusinessCode::InvalidParameter
            }
            Self::MissingAuth | Self::InvalidAuthFormat => BusinessCode::Unauthorized,
            Self::Forbidden => BusinessCode::Forbidden,
            Self::Internal(_) => BusinessCode::SystemError,
        }
    }

    /// Get HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.business_code().http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get error code for API responses
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        self.business_code().name()
    }

    /// Create an internal error from any error
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }

    /// Create an invalid body error
    pub fn invalid_body(msg: impl Into<String>) -> Self {
        Self::InvalidBody(msg.into())
    }

    /// Create an invalid path error
    pub fn invalid_path(msg: impl Into<String>) -> Self {
        Self::InvalidPath(msg.into())
    }

    /// Create an invalid query error
    pub fn invalid_query(msg: impl Into<String>) -> Self {
        Self::InvalidQuery(msg.into())
    }

    fn into_app_error(self) -> AppError {
        match self {
            Self::App(e) => e,
            Self::Service(e) => e.into(),
            Self::Domain(e) => AppError::Domain(e),
            Self::Validation(errors) => AppError::Validation(summarize(&errors)),
            Self::InvalidBody(msg) | Self::InvalidPath(msg) | Self::InvalidQuery(msg) => {
                AppError::InvalidInput(msg)
            }
            Self::MissingAuth | Self::InvalidAuthFormat => AppError::MissingAuth,
            Self::Forbidden => AppError::InsufficientPermissions,
            Self::Internal(e) => AppError::Internal(e),
        }
    }
}

/// One line per failing field, sorted by field name
fn summarize(errors: &ValidationErrors) -> String {
    let mut lines: Vec<String> = errors
        .field_errors()
        .into_iter()
        .map(|(field, failures)| {
            let reason = failures
                .first()
                .map(|f| {
                    f.message
                        .as_ref()
                        .map_or_else(|| f.code.to_string(), ToString::to_string)
                })
                .unwrap_or_default();
            format!("{field}: {reason}")
        })
        .collect();
    lines.sort();
    lines.join("; ")
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let app = self.into_app_error();

        if app.is_server_error() {
            error!(error = ?app, code = app.error_code(), "Server error occurred");
        } else {
            warn!(error = %app, code = app.error_code(), "Request rejected");
        }

        ApiJson(ApiResponse::from(&app)).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

/// Envelope sent with the HTTP status its business code maps to
pub struct ApiJson<T>(pub ApiResponse<T>);

impl<T> ApiJson<T> {
    /// Success envelope with the default message
    pub fn ok(data: T) -> Self {
        Self(ApiResponse::success(data))
    }

    /// Replace the envelope message
    #[must_use]
    pub fn with_message(self, message: impl Into<String>) -> Self {
        Self(self.0.with_message(message))
    }
}

impl<T> ApiJson<Vec<T>> {
    /// One page of a list
    pub fn page(items: Vec<T>, page: u32, page_size: u32, total: u64) -> Self {
        Self(ApiResponse::paginated(items, page, page_size, total))
    }
}

impl<T: Serialize> IntoResponse for ApiJson<T> {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.0)).into_response()
    }
}
