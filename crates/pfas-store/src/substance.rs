//! # Verified Substance Records
//!
//! A `Substance` is the reconciled, cross-checked identity record for one
//! CAS number. It is only written by the verification service after the
//! consistency gate passes, and it doubles as a 30-day cache: a record
//! younger than the trust window is served without re-querying providers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use pfas_core::{CasNumber, ListingStatus, SubstanceId, TenantId, Timestamp};

/// How agreement between the independent sources was established.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationMetadata {
    /// Names of the sources that answered.
    pub sources_checked: Vec<String>,
    /// The deterministic 0-100 consistency score.
    pub verification_score: u8,
    /// Human-readable record of each consistency check performed.
    pub consistency_checks: Vec<String>,
}

/// A verified chemical substance, keyed by CAS number per tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Substance {
    /// Unique identifier.
    pub id: SubstanceId,
    /// Tenant partition key.
    pub tenant_id: TenantId,
    /// The unique chemical key.
    pub cas_number: CasNumber,
    /// Consensus name.
    pub name: String,
    /// Merged synonyms: lower-cased, de-duplicated, capped at 50.
    pub synonyms: Vec<String>,
    /// Whether the substance belongs to the PFAS class.
    pub pfas_flag: bool,
    /// Substance of Very High Concern listing status.
    pub svhc_status: ListingStatus,
    /// Restriction listing status.
    pub restricted_status: ListingStatus,
    /// Restriction threshold in ppm, when one is published.
    pub restriction_threshold_ppm: Option<f64>,
    /// Consensus molecular formula.
    pub molecular_formula: Option<String>,
    /// Consensus molecular weight (g/mol).
    pub molecular_weight: Option<f64>,
    /// One external identifier per source (source name → id).
    pub external_ids: BTreeMap<String, String>,
    /// How the record was verified.
    pub verification_metadata: VerificationMetadata,
    /// When the record was last verified. Drives the trust window.
    pub last_updated: Timestamp,
}

impl Substance {
    /// Days a verified record is servable without re-verification.
    pub const TRUST_WINDOW_DAYS: i64 = 30;

    /// Whether the record is still inside its trust window at `now`.
    ///
    /// A record exactly at the window boundary is stale: 29 days old is
    /// trusted, 30 is not.
    pub fn is_trusted(&self, now: Timestamp) -> bool {
        !self.last_updated.is_older_than_days(now, Self::TRUST_WINDOW_DAYS)
    }
}
