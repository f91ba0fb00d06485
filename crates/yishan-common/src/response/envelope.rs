//! Uniform response envelope
//!
//! Every response body, success or failure, is an [`ApiResponse`]:
//!
//! ```json
//! {"code":0,"message":"Success","success":true,"data":{...},
//!  "timestamp":"2024-01-01T00:00:00Z","request_id":"..."}
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::request_id::current_request_id;
use crate::codes::{resolve, BusinessCode};
use crate::error::AppError;

/// Pagination block of a list response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl PaginationMeta {
    /// `total_pages = ceil(total / page_size)`; a zero page size yields zero pages
    #[must_use]
    pub fn new(page: u32, page_size: u32, total: u64) -> Self {
        let total_pages = if page_size == 0 {
            0
        } else {
            total.div_ceil(u64::from(page_size))
        };
        Self {
            page,
            page_size,
            total,
            total_pages,
        }
    }
}

/// Response envelope
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    pub success: bool,
    pub data: Option<T>,
    pub timestamp: DateTime<Utc>,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_message: Option<String>,
    #[serde(skip)]
    http_status: u16,
}

impl<T> ApiResponse<T> {
    fn build(code: BusinessCode, message: String, data: Option<T>) -> Self {
        Self {
            code: code.code(),
            message,
            success: code.is_success(),
            data,
            timestamp: Utc::now(),
            request_id: current_request_id(),
            pagination: None,
            sub_code: None,
            sub_message: None,
            http_status: code.http_status(),
        }
    }

    /// Success envelope with the registry message
    pub fn success(data: T) -> Self {
        let code = BusinessCode::Success;
        Self::build(code, code.message().to_string(), Some(data))
    }

    /// Replace the message
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// HTTP status this envelope should be sent with
    #[must_use]
    pub fn http_status(&self) -> u16 {
        self.http_status
    }
}

impl<T> ApiResponse<Vec<T>> {
    /// Success envelope carrying one page of a list
    pub fn paginated(items: Vec<T>, page: u32, page_size: u32, total: u64) -> Self {
        let mut response = Self::success(items);
        response.pagination = Some(PaginationMeta::new(page, page_size, total));
        response
    }
}

impl ApiResponse<()> {
    /// Failure envelope for an arbitrary code.
    ///
    /// Codes that are not registered failure codes (unregistered values and
    /// `0`) are replaced by the generic system error, so clients only ever
    /// see codes from the registry. The HTTP status comes from [`resolve`].
    #[must_use]
    pub fn error(code: i32, message: Option<&str>, detail: Option<String>) -> Self {
        let code = match BusinessCode::from_code(code) {
            Some(known) if !known.is_success() => known,
            _ => BusinessCode::SystemError,
        };
        let info = resolve(code.code());

        let mut response = Self::build(
            code,
            message.map_or_else(|| info.message.to_string(), str::to_string),
            None,
        );
        response.http_status = info.http_status;
        response.sub_code = Some(code.name().to_string());
        response.sub_message = detail;
        response
    }

    /// Failure envelope for a registered code with its registry message
    #[must_use]
    pub fn from_code(code: BusinessCode) -> Self {
        Self::error(code.code(), None, None)
    }
}

impl From<&AppError> for ApiResponse<()> {
    fn from(err: &AppError) -> Self {
        let code = err.business_code();
        let message = err.client_message();
        if message == code.message() {
            Self::error(code.code(), None, None)
        } else {
            Self::error(code.code(), Some(&message), None)
        }
    }
}
