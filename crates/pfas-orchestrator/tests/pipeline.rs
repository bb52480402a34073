//! End-to-end pipeline tests against the in-memory store: verdict
//! aggregation, idempotent fan-out, per-jurisdiction fault tolerance,
//! batch scanning, and manual overrides.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use pfas_core::{
    CasNumber, ComplianceStatus, JurisdictionId, ListingStatus, ObjectKind, ObjectRef, PackageId,
    RequestContext, RuleId, RulesetId, Severity, SourceType, TenantId, Timestamp,
};
use pfas_orchestrator::{
    AssessmentInput, Notifier, Orchestrator, OrchestratorError, PfasStatusTarget,
    StatusTargetRegistry, MAX_JURISDICTIONS_PER_RUN, NON_COMPLIANT_ALERT_TYPE,
};
use pfas_state::MaterialComposition;
use pfas_store::{
    EntityStore, Jurisdiction, MemoryStore, Rule, Ruleset, RulesetStatus, Substance,
    VerificationMetadata,
};

// ─── Fixtures ────────────────────────────────────────────────────────

#[derive(Default)]
struct RecordingNotifier {
    alerts: Mutex<Vec<String>>,
    emails: Mutex<Vec<String>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_alert(
        &self,
        _ctx: &RequestContext,
        _object: &ObjectRef,
        message: &str,
    ) -> anyhow::Result<()> {
        self.alerts.lock().unwrap().push(message.to_string());
        Ok(())
    }

    async fn send_email(
        &self,
        _ctx: &RequestContext,
        recipient: &str,
        _subject: &str,
        _body: &str,
    ) -> anyhow::Result<()> {
        self.emails.lock().unwrap().push(recipient.to_string());
        Ok(())
    }
}

#[derive(Default)]
struct RecordingTarget {
    applied: Mutex<Vec<ComplianceStatus>>,
}

#[async_trait]
impl PfasStatusTarget for RecordingTarget {
    async fn apply_pfas_status(
        &self,
        _ctx: &RequestContext,
        _object: &ObjectRef,
        status: ComplianceStatus,
    ) -> anyhow::Result<()> {
        self.applied.lock().unwrap().push(status);
        Ok(())
    }
}

struct Harness {
    store: Arc<MemoryStore>,
    orchestrator: Orchestrator<MemoryStore>,
    notifier: Arc<RecordingNotifier>,
    target: Arc<RecordingTarget>,
    ctx: RequestContext,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let target = Arc::new(RecordingTarget::default());
    let mut registry = StatusTargetRegistry::new();
    registry.register(ObjectKind::Article, target.clone());
    let orchestrator = Orchestrator::new(store.clone(), registry, notifier.clone());
    let ctx = RequestContext::new(TenantId::new(), "system:scanner").unwrap();
    Harness {
        store,
        orchestrator,
        notifier,
        target,
        ctx,
    }
}

fn article(id: &str) -> ObjectRef {
    ObjectRef::new(ObjectKind::Article, id).unwrap()
}

fn pfoa() -> CasNumber {
    CasNumber::new("335-67-1").unwrap()
}

fn critical_rule(max_ppm: f64) -> Rule {
    Rule {
        id: RuleId::new(),
        name: "PFOA concentration limit".to_string(),
        condition_json: json!({}),
        thresholds_json: json!({"max_concentration_ppm": max_ppm}),
        severity: Severity::Critical,
        exemptions_json: json!({}),
        actions_json: json!({"action_types": ["supplier_outreach"]}),
    }
}

async fn seed_jurisdiction(h: &Harness, slug: &str, rules: Vec<Rule>) -> JurisdictionId {
    let id = JurisdictionId::new(slug).unwrap();
    h.store
        .insert_jurisdiction(Jurisdiction {
            id: id.clone(),
            tenant_id: h.ctx.tenant_id,
            name: slug.to_uppercase(),
            active: true,
            created_at: Timestamp::now(),
        })
        .await
        .unwrap();
    h.store
        .insert_ruleset(Ruleset {
            id: RulesetId::new(),
            tenant_id: h.ctx.tenant_id,
            jurisdiction_id: id.clone(),
            name: format!("{slug} PFAS restriction"),
            version: 1,
            status: RulesetStatus::Active,
            rules,
            created_at: Timestamp::now(),
        })
        .await
        .unwrap();
    id
}

async fn seed_svhc_substance(h: &Harness) {
    h.store
        .upsert_substance(Substance {
            id: pfas_core::SubstanceId::new(),
            tenant_id: h.ctx.tenant_id,
            cas_number: pfoa(),
            name: "Perfluorooctanoic acid".to_string(),
            synonyms: vec!["pfoa".to_string()],
            pfas_flag: true,
            svhc_status: ListingStatus::Listed,
            restricted_status: ListingStatus::Listed,
            restriction_threshold_ppm: Some(0.025),
            molecular_formula: Some("C8HF15O2".to_string()),
            molecular_weight: Some(414.07),
            external_ids: BTreeMap::new(),
            verification_metadata: VerificationMetadata {
                sources_checked: vec!["pubchem".to_string(), "comptox".to_string()],
                verification_score: 100,
                consistency_checks: Vec::new(),
            },
            last_updated: Timestamp::now(),
        })
        .await
        .unwrap();
}

async fn seed_current_composition(h: &Harness, material_id: &str, ppm: f64) {
    let mut row = MaterialComposition::new(
        h.ctx.tenant_id,
        material_id,
        Some(pfoa()),
        ppm,
        SourceType::SupplierDeclaration,
        0.9,
        PackageId::new(),
        None,
    )
    .unwrap();
    row.mark_current().unwrap();
    h.store.insert_composition(row).await.unwrap();
}

// ─── End-to-end verdicts ─────────────────────────────────────────────

#[tokio::test]
async fn test_non_compliant_run_fans_out_once() {
    let h = harness();
    seed_jurisdiction(&h, "eu-reach", vec![critical_rule(25.0)]).await;
    seed_svhc_substance(&h).await;
    seed_current_composition(&h, "art-001", 50.0).await;

    let mut input = AssessmentInput::for_object(article("art-001"));
    input.responsible_party = Some("compliance@example.com".to_string());
    let outcome = h
        .orchestrator
        .create_or_update_assessment(&h.ctx, input)
        .await
        .unwrap();

    assert_eq!(outcome.assessment.status, ComplianceStatus::NonCompliant);
    assert!(outcome.assessment.reasoning.contains("335-67-1 at 50 ppm"));
    assert_eq!(outcome.assessment.decision_snapshots.len(), 1);
    assert_eq!(outcome.report.actions_created, 1);
    assert_eq!(outcome.report.notifications_created, 1);
    assert_eq!(outcome.report.alerts_created, 1);
    assert!(outcome.report.scenario_created);
    assert!(outcome.report.downstream_errors.is_empty());

    let actions = h
        .store
        .list_actions(h.ctx.tenant_id, outcome.assessment.id)
        .await
        .unwrap();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].action_type, "supplier_outreach");

    let alert = h
        .store
        .find_open_alert(h.ctx.tenant_id, &article("art-001"), NON_COMPLIANT_ALERT_TYPE)
        .await
        .unwrap();
    assert!(alert.is_some());

    let scenario = h
        .store
        .find_scenario(h.ctx.tenant_id, outcome.assessment.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(scenario.target_cas, pfoa());
    assert_eq!(scenario.target_concentration_ppm, 50.0);

    let notification = h
        .store
        .find_scip_notification(h.ctx.tenant_id, &article("art-001"), &pfoa())
        .await
        .unwrap();
    assert!(notification.is_some());

    assert_eq!(
        *h.target.applied.lock().unwrap(),
        vec![ComplianceStatus::NonCompliant]
    );
    assert_eq!(h.notifier.alerts.lock().unwrap().len(), 1);
    assert_eq!(
        *h.notifier.emails.lock().unwrap(),
        vec!["compliance@example.com".to_string()]
    );
}

#[tokio::test]
async fn test_repeated_run_is_idempotent() {
    let h = harness();
    seed_jurisdiction(&h, "eu-reach", vec![critical_rule(25.0)]).await;
    seed_svhc_substance(&h).await;
    seed_current_composition(&h, "art-001", 50.0).await;

    let first = h
        .orchestrator
        .create_or_update_assessment(&h.ctx, AssessmentInput::for_object(article("art-001")))
        .await
        .unwrap();
    let second = h
        .orchestrator
        .create_or_update_assessment(&h.ctx, AssessmentInput::for_object(article("art-001")))
        .await
        .unwrap();

    // Same assessment row, updated in place.
    assert_eq!(second.assessment.id, first.assessment.id);
    // Snapshots are append-only evidence of both evaluations.
    assert_eq!(second.assessment.decision_snapshots.len(), 2);
    // Fan-out artifacts were found, not re-created.
    assert_eq!(second.report.actions_created, 0);
    assert_eq!(second.report.notifications_created, 0);
    assert_eq!(second.report.alerts_created, 0);
    assert!(!second.report.scenario_created);
    assert_eq!(
        h.store
            .list_actions(h.ctx.tenant_id, first.assessment.id)
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_compliant_object_raises_nothing() {
    let h = harness();
    seed_jurisdiction(&h, "eu-reach", vec![critical_rule(25.0)]).await;
    seed_svhc_substance(&h).await;
    seed_current_composition(&h, "art-002", 5.0).await;

    let outcome = h
        .orchestrator
        .create_or_update_assessment(&h.ctx, AssessmentInput::for_object(article("art-002")))
        .await
        .unwrap();

    assert_eq!(outcome.assessment.status, ComplianceStatus::Compliant);
    assert_eq!(outcome.report.actions_created, 0);
    assert_eq!(outcome.report.alerts_created, 0);
    assert!(!outcome.report.scenario_created);
    // SVHC notification duty applies regardless of the verdict.
    assert_eq!(outcome.report.notifications_created, 1);
    assert!(h.notifier.alerts.lock().unwrap().is_empty());
}

// ─── Jurisdiction handling ───────────────────────────────────────────

#[tokio::test]
async fn test_no_jurisdictions_is_insufficient_data() {
    let h = harness();
    let outcome = h
        .orchestrator
        .create_or_update_assessment(&h.ctx, AssessmentInput::for_object(article("art-001")))
        .await
        .unwrap();
    assert_eq!(
        outcome.assessment.status,
        ComplianceStatus::InsufficientData
    );
    assert!(outcome.report.jurisdictions_evaluated.is_empty());
}

#[tokio::test]
async fn test_jurisdiction_cap_applies() {
    let h = harness();
    for slug in ["eu-reach", "us-tsca", "ca-prop65", "uk-reach"] {
        seed_jurisdiction(&h, slug, vec![critical_rule(25.0)]).await;
    }
    let outcome = h
        .orchestrator
        .create_or_update_assessment(&h.ctx, AssessmentInput::for_object(article("art-001")))
        .await
        .unwrap();
    assert_eq!(
        outcome.report.jurisdictions_evaluated.len(),
        MAX_JURISDICTIONS_PER_RUN
    );
}

#[tokio::test]
async fn test_failing_jurisdiction_is_skipped_not_fatal() {
    let h = harness();
    let mut broken = critical_rule(25.0);
    broken.thresholds_json = json!({"max_concentration_ppm": "very low"});
    seed_jurisdiction(&h, "broken-land", vec![broken]).await;
    seed_jurisdiction(&h, "eu-reach", vec![critical_rule(25.0)]).await;
    seed_current_composition(&h, "art-001", 50.0).await;

    let outcome = h
        .orchestrator
        .create_or_update_assessment(&h.ctx, AssessmentInput::for_object(article("art-001")))
        .await
        .unwrap();

    assert_eq!(outcome.report.jurisdictions_skipped.len(), 1);
    assert_eq!(outcome.report.jurisdictions_evaluated.len(), 1);
    // The healthy jurisdiction still produced the verdict.
    assert_eq!(outcome.assessment.status, ComplianceStatus::NonCompliant);
}

// ─── Batch scanning ──────────────────────────────────────────────────

#[tokio::test]
async fn test_batch_scan_accumulates() {
    let h = harness();
    seed_jurisdiction(&h, "eu-reach", vec![critical_rule(25.0)]).await;
    seed_current_composition(&h, "art-001", 50.0).await;
    seed_current_composition(&h, "art-002", 1.0).await;

    let report = h
        .orchestrator
        .batch_scan(&h.ctx, &[article("art-001"), article("art-002")])
        .await;

    assert_eq!(report.processed, 2);
    assert_eq!(report.non_compliant, 1);
    assert_eq!(report.compliant, 1);
    assert!(report.errors.is_empty());
}

// ─── Manual overrides ────────────────────────────────────────────────

#[tokio::test]
async fn test_override_requires_second_approver() {
    let h = harness();
    seed_jurisdiction(&h, "eu-reach", vec![critical_rule(25.0)]).await;
    seed_current_composition(&h, "art-001", 50.0).await;
    h.orchestrator
        .create_or_update_assessment(&h.ctx, AssessmentInput::for_object(article("art-001")))
        .await
        .unwrap();

    let err = h
        .orchestrator
        .apply_override(
            &h.ctx,
            &article("art-001"),
            "Legacy stock exemption".to_string(),
            h.ctx.actor.clone(),
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrchestratorError::SecondApproverRequired { .. }
    ));

    let overridden = h
        .orchestrator
        .apply_override(
            &h.ctx,
            &article("art-001"),
            "Legacy stock exemption".to_string(),
            "user:compliance-lead".to_string(),
            None,
        )
        .await
        .unwrap();
    assert_eq!(overridden.status, ComplianceStatus::Compliant);
    let record = overridden.override_record.unwrap();
    assert_eq!(record.approved_by, "user:compliance-lead");
    assert_eq!(record.requested_by, h.ctx.actor);
}

#[tokio::test]
async fn test_override_without_assessment_fails() {
    let h = harness();
    let err = h
        .orchestrator
        .apply_override(
            &h.ctx,
            &article("missing"),
            "n/a".to_string(),
            "user:other".to_string(),
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::AssessmentNotFound { .. }));
}
