//! SHA-256 content hashing
//!
//! Hashes are lowercase hex with no prefix, which is the format written into
//! audit frontmatter of every agent result.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hex digest of string content.
pub fn sha256_hex(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
