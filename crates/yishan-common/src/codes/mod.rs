//! Business code registry

mod business_code;

pub use business_code::{resolve, BusinessCode, CodeInfo, CodeModule, UNKNOWN_ERROR_MESSAGE};
