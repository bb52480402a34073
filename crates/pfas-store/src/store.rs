//! # Entity Store Collaborator Boundary
//!
//! The hosted entity store is an external collaborator; this trait is its
//! contract, scoped to the operations the compliance pipeline needs.
//! Every method is tenant-scoped — there are no cross-tenant reads.
//!
//! Natural-key finders (`find_action`, `find_scip_notification`,
//! `find_open_alert`, `find_scenario`) exist so the orchestrator can
//! check-then-create for idempotent fan-out rather than blind-append.

use async_trait::async_trait;
use thiserror::Error;

use pfas_core::{
    AssessmentId, CasNumber, DocumentId, JurisdictionId, ObjectRef, PackageId, RuleId, TenantId,
};
use pfas_state::{CompositionStatus, EvidenceDocument, EvidencePackage, MaterialComposition};

use crate::assessment::{
    ComplianceAssessment, RemediationAction, RiskAlert, ScipNotification, SubstitutionScenario,
};
use crate::regulatory::{Jurisdiction, Ruleset};
use crate::substance::Substance;

/// Errors surfaced by the persistence collaborator.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The requested record does not exist.
    #[error("{entity} not found: {key}")]
    NotFound {
        /// The entity family.
        entity: &'static str,
        /// The missing key, rendered.
        key: String,
    },

    /// A write conflicted with an existing record.
    #[error("conflict writing {entity}: {reason}")]
    Conflict {
        /// The entity family.
        entity: &'static str,
        /// The conflict description.
        reason: String,
    },

    /// The backing store failed.
    #[error("store backend error: {0}")]
    Backend(String),
}

/// The persistence collaborator contract.
#[async_trait]
pub trait EntityStore: Send + Sync {
    // ── Substances ───────────────────────────────────────────────────

    /// Insert or replace the substance keyed by (tenant, CAS number).
    async fn upsert_substance(&self, substance: Substance) -> Result<Substance, StoreError>;

    /// Look up a substance by CAS number.
    async fn find_substance_by_cas(
        &self,
        tenant: TenantId,
        cas: &CasNumber,
    ) -> Result<Option<Substance>, StoreError>;

    // ── Evidence packages ────────────────────────────────────────────

    /// Insert a new evidence package.
    async fn insert_package(&self, package: EvidencePackage) -> Result<(), StoreError>;

    /// Replace an existing evidence package.
    async fn update_package(&self, package: EvidencePackage) -> Result<(), StoreError>;

    /// Fetch a package by id.
    async fn get_package(
        &self,
        tenant: TenantId,
        id: PackageId,
    ) -> Result<EvidencePackage, StoreError>;

    /// All packages ever submitted for an object, any review state.
    async fn list_packages_for_object(
        &self,
        tenant: TenantId,
        object: &ObjectRef,
    ) -> Result<Vec<EvidencePackage>, StoreError>;

    /// All currently approved packages for the tenant. Drives the
    /// validity-expiry sweep.
    async fn list_approved_packages(
        &self,
        tenant: TenantId,
    ) -> Result<Vec<EvidencePackage>, StoreError>;

    // ── Evidence documents ───────────────────────────────────────────

    /// Insert a new evidence document.
    async fn insert_document(&self, document: EvidenceDocument) -> Result<(), StoreError>;

    /// Fetch a document by id.
    async fn get_document(
        &self,
        tenant: TenantId,
        id: DocumentId,
    ) -> Result<EvidenceDocument, StoreError>;

    // ── Material compositions ────────────────────────────────────────

    /// Insert a new composition row.
    async fn insert_composition(&self, row: MaterialComposition) -> Result<(), StoreError>;

    /// Replace an existing composition row.
    async fn update_composition(&self, row: MaterialComposition) -> Result<(), StoreError>;

    /// Composition rows for a material, optionally filtered by status.
    async fn list_compositions(
        &self,
        tenant: TenantId,
        material_id: &str,
        status: Option<CompositionStatus>,
    ) -> Result<Vec<MaterialComposition>, StoreError>;

    /// Composition rows created from one evidence package.
    async fn list_compositions_by_package(
        &self,
        tenant: TenantId,
        package: PackageId,
    ) -> Result<Vec<MaterialComposition>, StoreError>;

    // ── Regulatory data ──────────────────────────────────────────────

    /// Insert a jurisdiction.
    async fn insert_jurisdiction(&self, jurisdiction: Jurisdiction) -> Result<(), StoreError>;

    /// Active jurisdictions in creation order.
    async fn list_active_jurisdictions(
        &self,
        tenant: TenantId,
    ) -> Result<Vec<Jurisdiction>, StoreError>;

    /// Insert a ruleset.
    async fn insert_ruleset(&self, ruleset: Ruleset) -> Result<(), StoreError>;

    /// Active rulesets for one jurisdiction.
    async fn list_active_rulesets(
        &self,
        tenant: TenantId,
        jurisdiction: &JurisdictionId,
    ) -> Result<Vec<Ruleset>, StoreError>;

    // ── Assessments ──────────────────────────────────────────────────

    /// The current assessment for an object, if one exists.
    async fn find_assessment(
        &self,
        tenant: TenantId,
        object: &ObjectRef,
    ) -> Result<Option<ComplianceAssessment>, StoreError>;

    /// Insert or replace the assessment keyed by (tenant, object).
    async fn upsert_assessment(
        &self,
        assessment: ComplianceAssessment,
    ) -> Result<ComplianceAssessment, StoreError>;

    // ── Fan-out artifacts (natural-key idempotency) ──────────────────

    /// The action under (assessment, rule, action_type), if any.
    async fn find_action(
        &self,
        tenant: TenantId,
        assessment: AssessmentId,
        rule: RuleId,
        action_type: &str,
    ) -> Result<Option<RemediationAction>, StoreError>;

    /// Insert a remediation action.
    async fn insert_action(&self, action: RemediationAction) -> Result<(), StoreError>;

    /// All actions for an assessment.
    async fn list_actions(
        &self,
        tenant: TenantId,
        assessment: AssessmentId,
    ) -> Result<Vec<RemediationAction>, StoreError>;

    /// The notification under (object, substance), if any.
    async fn find_scip_notification(
        &self,
        tenant: TenantId,
        object: &ObjectRef,
        cas: &CasNumber,
    ) -> Result<Option<ScipNotification>, StoreError>;

    /// Insert a notification-of-concern record.
    async fn insert_scip_notification(
        &self,
        notification: ScipNotification,
    ) -> Result<(), StoreError>;

    /// The open alert under (object, alert_type), if any.
    async fn find_open_alert(
        &self,
        tenant: TenantId,
        object: &ObjectRef,
        alert_type: &str,
    ) -> Result<Option<RiskAlert>, StoreError>;

    /// Insert a risk alert.
    async fn insert_alert(&self, alert: RiskAlert) -> Result<(), StoreError>;

    /// The substitution scenario for an assessment, if any.
    async fn find_scenario(
        &self,
        tenant: TenantId,
        assessment: AssessmentId,
    ) -> Result<Option<SubstitutionScenario>, StoreError>;

    /// Insert a substitution scenario.
    async fn insert_scenario(&self, scenario: SubstitutionScenario) -> Result<(), StoreError>;
}
