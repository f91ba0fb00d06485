//! Pagination extractor
//!
//! Extracts page-number pagination parameters from query strings.

use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::Deserialize;

use crate::response::ApiError;

/// Default page size
const DEFAULT_PAGE_SIZE: u32 = 10;
/// Maximum page size
const MAX_PAGE_SIZE: u32 = 100;

/// Raw pagination query parameters
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    /// 1-based page number
    #[serde(default)]
    pub page: Option<u32>,
    /// Items per page
    #[serde(default, alias = "page_size")]
    pub page_size: Option<u32>,
}

/// Validated pagination parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    /// 1-based page number, at least 1
    pub page: u32,
    /// Items per page (clamped to 1-100)
    pub page_size: u32,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl From<PageParams> for PageQuery {
    fn from(params: PageParams) -> Self {
        Self {
            page: params.page.unwrap_or(1).max(1),
            page_size: params
                .page_size
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for PageQuery
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<PageParams>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::invalid_query(e.body_text()))?;

        Ok(PageQuery::from(params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_page() {
        let page = PageQuery::from(PageParams::default());
        assert_eq!(page, PageQuery::default());
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_clamping() {
        let page = PageQuery::from(PageParams {
            page: Some(0),
            page_size: Some(500),
        });
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, MAX_PAGE_SIZE);

        let page = PageQuery::from(PageParams {
            page: Some(3),
            page_size: Some(0),
        });
        assert_eq!(page.page, 3);
        assert_eq!(page.page_size, 1);
    }

    #[test]
    fn test_camel_case_params() {
        let params: PageParams = serde_json::from_str(r#"{"page":2,"pageSize":5}"#).unwrap();
        let page = PageQuery::from(params);
        assert_eq!(page.page, 2);
        assert_eq!(page.page_size, 5);
    }
}
