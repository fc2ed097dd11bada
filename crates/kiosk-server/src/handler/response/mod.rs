//! Response body types.

mod error_response;
mod files;
mod monitors;
mod signatures;

pub use error_response::ErrorResponse;
pub use files::{Domain, Empty, PublishedUrl};
pub use monitors::Readiness;
pub use signatures::{MultipartParts, MultipartStarted, SignedUrl};
