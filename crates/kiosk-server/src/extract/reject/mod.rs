//! Wrappers around axum's extractors with gateway error responses.

pub mod enhanced_json;
pub mod enhanced_multipart;
pub mod enhanced_path;

pub use self::enhanced_json::Json;
pub use self::enhanced_multipart::Multipart;
pub use self::enhanced_path::Path;

/// Shortens a rejection message before it is sent to the client.
pub(crate) fn sanitize_error_message(message: &str) -> String {
    let lines = message.lines().take(3).collect::<Vec<_>>();
    lines.join(" ").chars().take(200).collect()
}
