//! Output file names and content hashes.

use annex9_template::RenderMetadata;
use sha2::{Digest, Sha256};

/// `annex9_order_<reference>_<YYYYMMDD>.pdf`, with every character of the
/// reference outside `[A-Za-z0-9_-]` replaced by `_`.
pub fn file_name(metadata: &RenderMetadata) -> String {
    let reference: String = metadata
        .reference
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("annex9_order_{}_{}.pdf", reference, metadata.date_stamp())
}

/// Lowercase hex SHA-256 of `bytes`.
pub fn content_hash(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
