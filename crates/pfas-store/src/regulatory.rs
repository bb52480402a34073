//! # Regulatory Records — Jurisdictions, Rulesets, Rules
//!
//! Rules carry their condition, threshold, exemption, and action payloads
//! as JSON columns, mirroring the hosted store's shape; the rule engine
//! deserializes them into typed payloads at its boundary. Rules are
//! immutable once referenced by a finalized assessment — a change ships as
//! a new rule version in a superseding ruleset, never as a mutation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use pfas_core::{JurisdictionId, RuleId, RulesetId, Severity, TenantId, Timestamp};

/// A regulatory jurisdiction tracked by the tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jurisdiction {
    /// The operator-assigned slug.
    pub id: JurisdictionId,
    /// Tenant partition key.
    pub tenant_id: TenantId,
    /// Human-readable name.
    pub name: String,
    /// Whether this jurisdiction participates in assessments.
    pub active: bool,
    /// Creation order; the orchestrator evaluates active jurisdictions in
    /// this order.
    pub created_at: Timestamp,
}

/// Lifecycle status of a ruleset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RulesetStatus {
    /// Under construction, not yet evaluated.
    Draft,
    /// Evaluated against objects in its jurisdiction.
    Active,
    /// Replaced by a newer version; kept for audit replay.
    Superseded,
}

/// A versioned set of rules for one jurisdiction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ruleset {
    /// Unique identifier.
    pub id: RulesetId,
    /// Tenant partition key.
    pub tenant_id: TenantId,
    /// The jurisdiction this ruleset belongs to.
    pub jurisdiction_id: JurisdictionId,
    /// Human-readable name (e.g. "EU REACH PFAS restriction 2026").
    pub name: String,
    /// Monotonically increasing version within the jurisdiction.
    pub version: u32,
    /// Lifecycle status.
    pub status: RulesetStatus,
    /// The rules evaluated for this ruleset.
    pub rules: Vec<Rule>,
    /// When the ruleset was created.
    pub created_at: Timestamp,
}

/// One regulatory rule with its JSON payload columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    /// Unique identifier.
    pub id: RuleId,
    /// Human-readable name used in reasoning output.
    pub name: String,
    /// Scope and use-category predicate.
    pub condition_json: Value,
    /// Threshold values (e.g. `max_concentration_ppm`, `aggregate_pfas_ppm`).
    pub thresholds_json: Value,
    /// Rule severity.
    pub severity: Severity,
    /// Exemption declarations (e.g. `exempted_uses`).
    pub exemptions_json: Value,
    /// Remediation actions to raise when triggered (`action_types`).
    pub actions_json: Value,
}
