//! # In-Memory Entity Store
//!
//! A tokio-RwLock hash-map implementation of [`EntityStore`] used by the
//! test suites and the CLI tooling. It mirrors the hosted store's
//! semantics: tenant-scoped reads, upserts by natural key, stable
//! insertion ordering for list operations.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use pfas_core::{
    AssessmentId, CasNumber, CompositionId, DocumentId, JurisdictionId, ObjectRef, PackageId,
    RuleId, TenantId,
};
use pfas_state::{CompositionStatus, EvidenceDocument, EvidencePackage, MaterialComposition};

use crate::assessment::{
    AlertStatus, ComplianceAssessment, RemediationAction, RiskAlert, ScipNotification,
    SubstitutionScenario,
};
use crate::regulatory::{Jurisdiction, Ruleset, RulesetStatus};
use crate::store::{EntityStore, StoreError};
use crate::substance::Substance;

#[derive(Default)]
struct Inner {
    substances: HashMap<(TenantId, CasNumber), Substance>,
    packages: HashMap<PackageId, EvidencePackage>,
    documents: HashMap<DocumentId, EvidenceDocument>,
    compositions: HashMap<CompositionId, MaterialComposition>,
    // Insertion order matters for list operations.
    package_order: Vec<PackageId>,
    composition_order: Vec<CompositionId>,
    jurisdictions: Vec<Jurisdiction>,
    rulesets: Vec<Ruleset>,
    assessments: HashMap<(TenantId, ObjectRef), ComplianceAssessment>,
    actions: Vec<RemediationAction>,
    scip_notifications: Vec<ScipNotification>,
    alerts: Vec<RiskAlert>,
    scenarios: Vec<SubstitutionScenario>,
}

/// In-memory [`EntityStore`] for tests and tooling.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn upsert_substance(&self, substance: Substance) -> Result<Substance, StoreError> {
        let mut inner = self.inner.write().await;
        inner
            .substances
            .insert((substance.tenant_id, substance.cas_number.clone()), substance.clone());
        Ok(substance)
    }

    async fn find_substance_by_cas(
        &self,
        tenant: TenantId,
        cas: &CasNumber,
    ) -> Result<Option<Substance>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.substances.get(&(tenant, cas.clone())).cloned())
    }

    async fn insert_package(&self, package: EvidencePackage) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.packages.contains_key(&package.id) {
            return Err(StoreError::Conflict {
                entity: "evidence_package",
                reason: format!("duplicate id {}", package.id),
            });
        }
        inner.package_order.push(package.id);
        inner.packages.insert(package.id, package);
        Ok(())
    }

    async fn update_package(&self, package: EvidencePackage) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.packages.contains_key(&package.id) {
            return Err(StoreError::NotFound {
                entity: "evidence_package",
                key: package.id.to_string(),
            });
        }
        inner.packages.insert(package.id, package);
        Ok(())
    }

    async fn get_package(
        &self,
        tenant: TenantId,
        id: PackageId,
    ) -> Result<EvidencePackage, StoreError> {
        let inner = self.inner.read().await;
        inner
            .packages
            .get(&id)
            .filter(|p| p.tenant_id == tenant)
            .cloned()
            .ok_or(StoreError::NotFound {
                entity: "evidence_package",
                key: id.to_string(),
            })
    }

    async fn list_packages_for_object(
        &self,
        tenant: TenantId,
        object: &ObjectRef,
    ) -> Result<Vec<EvidencePackage>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .package_order
            .iter()
            .filter_map(|id| inner.packages.get(id))
            .filter(|p| p.tenant_id == tenant && &p.object == object)
            .cloned()
            .collect())
    }

    async fn list_approved_packages(
        &self,
        tenant: TenantId,
    ) -> Result<Vec<EvidencePackage>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .package_order
            .iter()
            .filter_map(|id| inner.packages.get(id))
            .filter(|p| p.tenant_id == tenant && p.review_status.is_authoritative())
            .cloned()
            .collect())
    }

    async fn insert_document(&self, document: EvidenceDocument) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.documents.insert(document.id, document);
        Ok(())
    }

    async fn get_document(
        &self,
        tenant: TenantId,
        id: DocumentId,
    ) -> Result<EvidenceDocument, StoreError> {
        let inner = self.inner.read().await;
        inner
            .documents
            .get(&id)
            .filter(|d| d.tenant_id == tenant)
            .cloned()
            .ok_or(StoreError::NotFound {
                entity: "evidence_document",
                key: id.to_string(),
            })
    }

    async fn insert_composition(&self, row: MaterialComposition) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.composition_order.push(row.id);
        inner.compositions.insert(row.id, row);
        Ok(())
    }

    async fn update_composition(&self, row: MaterialComposition) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.compositions.contains_key(&row.id) {
            return Err(StoreError::NotFound {
                entity: "material_composition",
                key: row.id.to_string(),
            });
        }
        inner.compositions.insert(row.id, row);
        Ok(())
    }

    async fn list_compositions(
        &self,
        tenant: TenantId,
        material_id: &str,
        status: Option<CompositionStatus>,
    ) -> Result<Vec<MaterialComposition>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .composition_order
            .iter()
            .filter_map(|id| inner.compositions.get(id))
            .filter(|c| c.tenant_id == tenant && c.material_id == material_id)
            .filter(|c| status.map_or(true, |s| c.status == s))
            .cloned()
            .collect())
    }

    async fn list_compositions_by_package(
        &self,
        tenant: TenantId,
        package: PackageId,
    ) -> Result<Vec<MaterialComposition>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .composition_order
            .iter()
            .filter_map(|id| inner.compositions.get(id))
            .filter(|c| c.tenant_id == tenant && c.source_package_id == package)
            .cloned()
            .collect())
    }

    async fn insert_jurisdiction(&self, jurisdiction: Jurisdiction) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner
            .jurisdictions
            .iter()
            .any(|j| j.tenant_id == jurisdiction.tenant_id && j.id == jurisdiction.id)
        {
            return Err(StoreError::Conflict {
                entity: "jurisdiction",
                reason: format!("duplicate id {}", jurisdiction.id),
            });
        }
        inner.jurisdictions.push(jurisdiction);
        Ok(())
    }

    async fn list_active_jurisdictions(
        &self,
        tenant: TenantId,
    ) -> Result<Vec<Jurisdiction>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .jurisdictions
            .iter()
            .filter(|j| j.tenant_id == tenant && j.active)
            .cloned()
            .collect())
    }

    async fn insert_ruleset(&self, ruleset: Ruleset) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.rulesets.push(ruleset);
        Ok(())
    }

    async fn list_active_rulesets(
        &self,
        tenant: TenantId,
        jurisdiction: &JurisdictionId,
    ) -> Result<Vec<Ruleset>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .rulesets
            .iter()
            .filter(|r| {
                r.tenant_id == tenant
                    && &r.jurisdiction_id == jurisdiction
                    && r.status == RulesetStatus::Active
            })
            .cloned()
            .collect())
    }

    async fn find_assessment(
        &self,
        tenant: TenantId,
        object: &ObjectRef,
    ) -> Result<Option<ComplianceAssessment>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.assessments.get(&(tenant, object.clone())).cloned())
    }

    async fn upsert_assessment(
        &self,
        assessment: ComplianceAssessment,
    ) -> Result<ComplianceAssessment, StoreError> {
        let mut inner = self.inner.write().await;
        inner
            .assessments
            .insert((assessment.tenant_id, assessment.object.clone()), assessment.clone());
        Ok(assessment)
    }

    async fn find_action(
        &self,
        tenant: TenantId,
        assessment: AssessmentId,
        rule: RuleId,
        action_type: &str,
    ) -> Result<Option<RemediationAction>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .actions
            .iter()
            .find(|a| {
                a.tenant_id == tenant
                    && a.assessment_id == assessment
                    && a.rule_id == rule
                    && a.action_type == action_type
            })
            .cloned())
    }

    async fn insert_action(&self, action: RemediationAction) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.actions.push(action);
        Ok(())
    }

    async fn list_actions(
        &self,
        tenant: TenantId,
        assessment: AssessmentId,
    ) -> Result<Vec<RemediationAction>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .actions
            .iter()
            .filter(|a| a.tenant_id == tenant && a.assessment_id == assessment)
            .cloned()
            .collect())
    }

    async fn find_scip_notification(
        &self,
        tenant: TenantId,
        object: &ObjectRef,
        cas: &CasNumber,
    ) -> Result<Option<ScipNotification>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .scip_notifications
            .iter()
            .find(|n| {
                n.tenant_id == tenant
                    && n.object.object_id == object.object_id
                    && &n.substance_cas == cas
            })
            .cloned())
    }

    async fn insert_scip_notification(
        &self,
        notification: ScipNotification,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.scip_notifications.push(notification);
        Ok(())
    }

    async fn find_open_alert(
        &self,
        tenant: TenantId,
        object: &ObjectRef,
        alert_type: &str,
    ) -> Result<Option<RiskAlert>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .alerts
            .iter()
            .find(|a| {
                a.tenant_id == tenant
                    && &a.object == object
                    && a.alert_type == alert_type
                    && a.status == AlertStatus::Open
            })
            .cloned())
    }

    async fn insert_alert(&self, alert: RiskAlert) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.alerts.push(alert);
        Ok(())
    }

    async fn find_scenario(
        &self,
        tenant: TenantId,
        assessment: AssessmentId,
    ) -> Result<Option<SubstitutionScenario>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .scenarios
            .iter()
            .find(|s| s.tenant_id == tenant && s.assessment_id == assessment)
            .cloned())
    }

    async fn insert_scenario(&self, scenario: SubstitutionScenario) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.scenarios.push(scenario);
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
