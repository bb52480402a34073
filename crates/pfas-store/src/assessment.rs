//! # Assessment and Remediation Records
//!
//! The `ComplianceAssessment` is the verdict record: one current row per
//! (tenant, object), updated in place, with an append-only list of
//! decision snapshots so every past verdict can be replayed even after
//! rules change. The fan-out artifacts (actions, notifications, alerts,
//! substitution scenarios) each carry a natural key; the orchestrator
//! checks for an existing record under that key before creating one.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use pfas_core::{
    AssessmentId, CasNumber, ComplianceStatus, ContentDigest, JurisdictionId, ObjectRef,
    PackageId, RuleId, TenantId, Timestamp,
};

// ─── Decision Snapshots ──────────────────────────────────────────────

/// One frozen evaluation: the rules considered and evidence used for one
/// jurisdiction, exactly as they were at evaluation time.
///
/// Append-only. The digest is computed over the canonical JSON bytes of
/// the snapshot so audit replay can prove the stored copy is unmodified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionSnapshotEntry {
    /// The jurisdiction the snapshot belongs to.
    pub jurisdiction_id: JurisdictionId,
    /// When the evaluation ran.
    pub taken_at: Timestamp,
    /// Canonical digest of `snapshot`.
    pub digest: ContentDigest,
    /// The frozen rules-and-evidence payload.
    pub snapshot: Value,
}

// ─── Manual Override ─────────────────────────────────────────────────

/// A manual compliance override applied by a second approver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideRecord {
    /// Why the override was applied.
    pub justification: String,
    /// The actor who requested the override.
    pub requested_by: String,
    /// The second approver; must differ from `requested_by`.
    pub approved_by: String,
    /// When the override lapses, if time-bounded.
    pub expires: Option<Timestamp>,
    /// When the override was applied.
    pub applied_at: Timestamp,
}

// ─── Compliance Assessment ───────────────────────────────────────────

/// The current compliance verdict for one assessed object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceAssessment {
    /// Unique identifier.
    pub id: AssessmentId,
    /// Tenant partition key.
    pub tenant_id: TenantId,
    /// The object being assessed; with `tenant_id`, the upsert key.
    pub object: ObjectRef,
    /// The aggregated verdict.
    pub status: ComplianceStatus,
    /// Concatenated rule explanations from the last evaluation.
    pub reasoning: String,
    /// Evidence packages linked to the assessment.
    pub evidence_package_ids: Vec<PackageId>,
    /// Append-only history of frozen evaluations.
    pub decision_snapshots: Vec<DecisionSnapshotEntry>,
    /// Manual override, when one is in force.
    pub override_record: Option<OverrideRecord>,
    /// When the row was first created.
    pub created_at: Timestamp,
    /// When the row was last evaluated.
    pub updated_at: Timestamp,
}

impl ComplianceAssessment {
    /// Create a fresh assessment row in `UnderReview` for an object that
    /// has never been assessed.
    pub fn new(tenant_id: TenantId, object: ObjectRef) -> Self {
        let now = Timestamp::now();
        Self {
            id: AssessmentId::new(),
            tenant_id,
            object,
            status: ComplianceStatus::UnderReview,
            reasoning: String::new(),
            evidence_package_ids: Vec::new(),
            decision_snapshots: Vec::new(),
            override_record: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Link evidence packages, ignoring duplicates.
    pub fn link_packages(&mut self, ids: &[PackageId]) {
        for id in ids {
            if !self.evidence_package_ids.contains(id) {
                self.evidence_package_ids.push(*id);
            }
        }
    }
}

// ─── Fan-Out Artifacts ───────────────────────────────────────────────

/// Status of a remediation action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Open,
    Completed,
}

/// A remediation action raised by a triggered rule.
///
/// Natural key: (assessment, rule, action_type).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemediationAction {
    /// Unique identifier.
    pub id: Uuid,
    /// Tenant partition key.
    pub tenant_id: TenantId,
    /// The assessment that raised the action.
    pub assessment_id: AssessmentId,
    /// The rule that triggered it.
    pub rule_id: RuleId,
    /// The action type declared in the rule's `actions_json`.
    pub action_type: String,
    /// Why the action was raised.
    pub description: String,
    /// Lifecycle status.
    pub status: ActionStatus,
    /// When the action was raised.
    pub created_at: Timestamp,
}

/// Status of a substance-of-concern notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Pending,
    Submitted,
}

/// A notification-of-concern duty for an SVHC occurrence.
///
/// Natural key: (object_id, substance_cas).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScipNotification {
    /// Unique identifier.
    pub id: Uuid,
    /// Tenant partition key.
    pub tenant_id: TenantId,
    /// The object containing the SVHC.
    pub object: ObjectRef,
    /// The substance of very high concern.
    pub substance_cas: CasNumber,
    /// Submission status.
    pub status: NotificationStatus,
    /// When the duty was recorded.
    pub created_at: Timestamp,
}

/// Status of a risk alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Open,
    Resolved,
}

/// A risk alert raised for a non-compliant object.
///
/// Natural key: one *open* alert per (object, alert_type); resolved alerts
/// do not block new ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAlert {
    /// Unique identifier.
    pub id: Uuid,
    /// Tenant partition key.
    pub tenant_id: TenantId,
    /// The object the alert is about.
    pub object: ObjectRef,
    /// The alert category (e.g. `pfas_non_compliant`).
    pub alert_type: String,
    /// Human-readable alert message.
    pub message: String,
    /// Lifecycle status.
    pub status: AlertStatus,
    /// When the alert was raised.
    pub created_at: Timestamp,
}

/// An auto-generated substitution suggestion for a non-compliant object.
///
/// Natural key: the assessment id — at most one scenario per assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubstitutionScenario {
    /// Unique identifier.
    pub id: Uuid,
    /// Tenant partition key.
    pub tenant_id: TenantId,
    /// The assessment the scenario belongs to.
    pub assessment_id: AssessmentId,
    /// The substance proposed for substitution — the highest-concentration
    /// one among the object's current compositions.
    pub target_cas: CasNumber,
    /// That substance's observed concentration in ppm.
    pub target_concentration_ppm: f64,
    /// The suggestion text.
    pub suggestion: String,
    /// When the scenario was generated.
    pub created_at: Timestamp,
}
