//! Per-request correlation id
//!
//! The HTTP layer scopes each request's id around the handler future so that
//! envelopes built anywhere below it carry the same id.

use std::future::Future;

use uuid::Uuid;

tokio::task_local! {
    static REQUEST_ID: String;
}

/// Run `fut` with `id` as the current request id
pub async fn with_request_id<F>(id: String, fut: F) -> F::Output
where
    F: Future,
{
    REQUEST_ID.scope(id, fut).await
}

/// The id of the request being served, or a fresh one outside any request scope
pub fn current_request_id() -> String {
    REQUEST_ID
        .try_with(Clone::clone)
        .unwrap_or_else(|_| Uuid::new_v4().to_string())
}
