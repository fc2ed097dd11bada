use sha2::{Digest, Sha256};

/// Returns the lowercase hex SHA-256 digest used to content-address uploads.
pub fn content_hash(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}
