//! Content fingerprints.
//!
//! A fingerprint is the first 128 bits of a SHA-256 digest over an item's
//! identity fields: title, summary and link. Missing optional fields hash as
//! empty strings. Fields are joined with a unit separator so that moving text
//! between fields changes the digest.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::feed::ContentItem;

/// Separator between identity fields (ASCII unit separator).
const FIELD_SEPARATOR: u8 = 0x1f;

/// Stable identity of a content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 16]);

impl Fingerprint {
    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Compute the fingerprint of `item`.
pub fn fingerprint(item: &ContentItem) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(item.title.as_bytes());
    hasher.update([FIELD_SEPARATOR]);
    hasher.update(item.summary.as_deref().unwrap_or_default().as_bytes());
    hasher.update([FIELD_SEPARATOR]);
    hasher.update(item.link.as_deref().unwrap_or_default().as_bytes());

    let digest = hasher.finalize();
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    Fingerprint(bytes)
}
