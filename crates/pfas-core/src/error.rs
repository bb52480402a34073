//! # Core Error Types
//!
//! Validation errors for the foundational types. Domain-specific failures
//! (verification scoring, review transitions, jurisdiction evaluation,
//! downstream effects) live in their own crates next to the code that
//! raises them; this module only covers construction-time validation.

use thiserror::Error;

/// Errors raised by the foundational type constructors.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A CAS number failed structural or check-digit validation.
    #[error("invalid CAS number {value:?}: {reason}")]
    InvalidCasNumber {
        /// The rejected input.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An identifier failed validation.
    #[error("invalid {kind} identifier: {reason}")]
    InvalidIdentifier {
        /// Which identifier family (e.g. "jurisdiction", "actor").
        kind: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A timestamp string failed parsing or the UTC-only rule.
    #[error("invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp {
        /// The rejected input.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Canonical JSON serialization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(String),
}
