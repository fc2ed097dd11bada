#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for NATS client operations.
pub const TRACING_TARGET_CLIENT: &str = "kiosk_nats::client";

/// Tracing target for key-value store operations.
pub const TRACING_TARGET_KV: &str = "kiosk_nats::kv";

/// Tracing target for connection establishment and health checks.
pub const TRACING_TARGET_CONNECTION: &str = "kiosk_nats::connection";

mod client;
mod error;
pub mod kv;

pub use client::{NatsClient, NatsConfig};
pub use error::{Error, Result};
