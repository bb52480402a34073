//! # pfas-verify — Cross-Source Substance Verification
//!
//! Resolves CAS numbers into verified `Substance` records by querying two
//! independent chemical-identity providers and one regulatory-status
//! provider concurrently, scoring their agreement, and gating the result
//! on a minimum consistency score. Verified records double as a 30-day
//! cache.
//!
//! Provider contracts live in [`providers`]; the service and its scoring
//! algorithm in [`service`].

pub mod providers;
pub mod service;

pub use providers::{
    IdentityLookup, IdentityProvider, ProviderError, RegulatoryLookup, RegulatoryProvider,
};
pub use service::{
    VerificationError, VerificationService, MAX_SYNONYMS, PROVIDER_TIMEOUT_SECS, SCORE_GATE,
};
