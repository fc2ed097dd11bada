//! Request extractors that reject with the gateway's JSON [`Error`].
//!
//! - [`Json`] deserializes request bodies.
//! - [`Multipart`] reads archive uploads.
//! - [`Path`] reads blob route parameters.
//!
//! [`Error`]: crate::handler::Error

pub mod reject;

pub use crate::extract::reject::{Json, Multipart, Path};
