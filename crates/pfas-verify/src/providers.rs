//! # External Chemical-Data Provider Contracts
//!
//! The verification service consults two chemical-identity providers and
//! one regulatory-status provider. Each is an external collaborator; these
//! traits are their contracts, scoped to the one lookup the service needs.
//!
//! A provider answering `Ok(None)` means "I do not know this substance" —
//! a valid, lower-scoring outcome. `Err` means the provider itself failed
//! (network, timeout, malformed response) and is tolerated the same way.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use pfas_core::{CasNumber, Timestamp};

/// A provider-side failure. Tolerated by the verification service: the
/// provider's answer simply becomes absent.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The provider did not answer within its time bound.
    #[error("{provider} did not answer within {timeout_secs}s")]
    Timeout {
        /// The provider's source name.
        provider: String,
        /// The time bound that was exceeded.
        timeout_secs: u64,
    },

    /// The provider answered with an error or could not be reached.
    #[error("{provider} lookup failed: {reason}")]
    Unavailable {
        /// The provider's source name.
        provider: String,
        /// What went wrong.
        reason: String,
    },
}

// ─── Chemical Identity ───────────────────────────────────────────────

/// One identity provider's answer for a CAS number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityLookup {
    /// The substance name as this provider knows it.
    pub name: String,
    /// Known synonyms, in the provider's own casing.
    pub synonyms: Vec<String>,
    /// Molecular formula, when the provider publishes one.
    pub molecular_formula: Option<String>,
    /// Molecular weight in g/mol, when published.
    pub molecular_weight: Option<f64>,
    /// The provider's own identifier for the substance.
    pub external_id: Option<String>,
}

/// A chemical-identity data source (e.g. PubChem, CompTox).
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Stable source name, recorded in `verification_metadata` and used as
    /// the key into `external_ids`.
    fn source_name(&self) -> &str;

    /// Resolve a CAS number. `Ok(None)` means the substance is unknown to
    /// this source.
    async fn lookup(&self, cas: &CasNumber) -> Result<Option<IdentityLookup>, ProviderError>;
}

// ─── Regulatory Status ───────────────────────────────────────────────

/// The regulatory-status provider's answer for a CAS number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegulatoryLookup {
    /// Whether the substance falls under a PFAS restriction.
    pub pfas_restricted: bool,
    /// Whether the substance is listed as an SVHC.
    pub is_svhc: bool,
    /// Whether the substance is on a restriction list.
    pub is_restricted: bool,
    /// When the restriction takes effect, if scheduled.
    pub restriction_effective_date: Option<Timestamp>,
    /// Published restriction threshold in ppm, if any.
    pub restriction_threshold_ppm: Option<f64>,
    /// The regulator's substance identifier.
    pub echa_substance_id: Option<String>,
}

/// The regulatory-status data source.
///
/// Its absence never fails verification; the regulatory fields on the
/// resulting record default to `false`/`unknown` instead.
#[async_trait]
pub trait RegulatoryProvider: Send + Sync {
    /// Stable source name, recorded in `verification_metadata`.
    fn source_name(&self) -> &str;

    /// Resolve the regulatory status of a CAS number.
    async fn lookup(&self, cas: &CasNumber) -> Result<Option<RegulatoryLookup>, ProviderError>;
}
