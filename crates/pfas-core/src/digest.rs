//! # Content Digest — Tamper Evidence and Audit Replay
//!
//! Defines `ContentDigest` and the two digest paths in the stack:
//!
//! - [`sha256_digest()`] over raw bytes — uploaded evidence files are
//!   fingerprinted at intake so a later byte change is detectable.
//! - [`canonical_digest()`] over any serializable value — decision
//!   snapshots are digested through RFC 8785 (JCS) canonical serialization
//!   so the same snapshot always produces the same digest, regardless of
//!   field ordering at serialization time.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::CoreError;

/// A SHA-256 digest of identified content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest {
    /// The raw 32-byte digest value.
    pub bytes: [u8; 32],
}

impl ContentDigest {
    /// Wrap raw digest bytes. Prefer [`sha256_digest()`] or
    /// [`canonical_digest()`] for computing digests.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Render the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sha256:{}", self.to_hex())
    }
}

/// Compute the SHA-256 digest of raw bytes.
///
/// This is the file fingerprint path: evidence documents are digested as
/// uploaded, byte for byte, with no canonicalization.
pub fn sha256_digest(data: &[u8]) -> ContentDigest {
    let hash = Sha256::digest(data);
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hash);
    ContentDigest::new(bytes)
}

/// Compute the SHA-256 digest of a value's RFC 8785 canonical JSON bytes.
///
/// This is the audit path: a decision snapshot digested today and the same
/// snapshot re-serialized during audit replay years later must produce the
/// same digest. JCS guarantees sorted keys and deterministic number
/// formatting.
///
/// # Errors
///
/// Returns [`CoreError::Canonicalization`] if the value cannot be
/// serialized as canonical JSON.
pub fn canonical_digest(value: &impl Serialize) -> Result<ContentDigest, CoreError> {
    let bytes = serde_jcs::to_vec(value)
        .map_err(|e| CoreError::Canonicalization(e.to_string()))?;
    Ok(sha256_digest(&bytes))
}
