//! Response envelope and request correlation

mod envelope;
mod request_id;

pub use envelope::{ApiResponse, PaginationMeta};
pub use request_id::{current_request_id, with_request_id};
