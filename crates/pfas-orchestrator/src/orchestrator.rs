//! # Compliance Orchestrator
//!
//! The single entry point every producer calls — the scanner surface,
//! the supplier portal, evidence review, and batch jobs all converge
//! here. One run is a fixed 8-step pipeline:
//!
//! 1. Upsert the base assessment for (tenant, object). *Load-bearing.*
//! 2. Link supplied evidence packages.
//! 3. Load the object's `current` composition evidence.
//! 4. Evaluate up to [`MAX_JURISDICTIONS_PER_RUN`] active jurisdictions
//!    through the rule engine, aggregating statuses through the
//!    worsening lattice, and persist the verdict. *Load-bearing.* A
//!    single jurisdiction's failure is caught and skipped.
//! 5. Propagate the status onto the linked business entity.
//! 6. Fan out notifications-of-concern and risk alerts, idempotent by
//!    natural key (check-then-create, never blind-append).
//! 7. Generate at most one substitution scenario per assessment.
//! 8. Deliver a user alert and email for non-compliant verdicts.
//!
//! Steps 5–8 are best-effort: failures are collected into the
//! [`ExecutionReport`] and never roll back the persisted assessment.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use pfas_core::{
    CasNumber, ComplianceStatus, ListingStatus, ObjectRef, PackageId, RequestContext, Timestamp,
};
use pfas_rules::{EvaluationInput, JurisdictionVerdict, RuleEngine};
use pfas_state::{CompositionStatus, MaterialComposition};
use pfas_store::{
    ActionStatus, AlertStatus, ComplianceAssessment, EntityStore, NotificationStatus,
    OverrideRecord, RemediationAction, RiskAlert, ScipNotification, StoreError,
    SubstitutionScenario,
};

use crate::notify::Notifier;
use crate::registry::StatusTargetRegistry;
use crate::report::{BatchReport, DownstreamEffectError, ExecutionReport};

/// Jurisdiction cap per pipeline run.
pub const MAX_JURISDICTIONS_PER_RUN: usize = 3;

/// Alert type raised for non-compliant objects.
pub const NON_COMPLIANT_ALERT_TYPE: &str = "pfas_non_compliant";

/// Fatal pipeline errors — only the load-bearing steps raise these.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// A load-bearing store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// An override was requested for an object with no assessment.
    #[error("no assessment exists for {object}")]
    AssessmentNotFound {
        /// The object the override targeted.
        object: ObjectRef,
    },

    /// A compliance override needs an approver other than its requester.
    #[error("override approver must differ from requester {requested_by}")]
    SecondApproverRequired {
        /// The actor who both requested and tried to approve.
        requested_by: String,
    },
}

/// One pipeline invocation's input.
#[derive(Debug, Clone)]
pub struct AssessmentInput {
    /// The object to assess.
    pub object: ObjectRef,
    /// Evidence packages to link onto the assessment.
    pub evidence_package_ids: Vec<PackageId>,
    /// The object's declared use categories (exemption predicate input).
    pub use_categories: Vec<String>,
    /// Email recipient for non-compliant verdicts.
    pub responsible_party: Option<String>,
}

impl AssessmentInput {
    /// A bare input for scan-style invocations with no extra context.
    pub fn for_object(object: ObjectRef) -> Self {
        Self {
            object,
            evidence_package_ids: Vec::new(),
            use_categories: Vec::new(),
            responsible_party: None,
        }
    }
}

/// The pipeline's output: the persisted verdict plus the step report.
#[derive(Debug)]
pub struct AssessmentOutcome {
    /// The authoritative verdict record, as persisted.
    pub assessment: ComplianceAssessment,
    /// What each step did, including best-effort failures.
    pub report: ExecutionReport,
}

/// The compliance pipeline orchestrator.
pub struct Orchestrator<S> {
    store: Arc<S>,
    engine: RuleEngine,
    registry: StatusTargetRegistry,
    notifier: Arc<dyn Notifier>,
}

impl<S: EntityStore> Orchestrator<S> {
    pub fn new(store: Arc<S>, registry: StatusTargetRegistry, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            engine: RuleEngine::new(),
            registry,
            notifier,
        }
    }

    /// Run the full pipeline for one object.
    pub async fn create_or_update_assessment(
        &self,
        ctx: &RequestContext,
        input: AssessmentInput,
    ) -> Result<AssessmentOutcome, OrchestratorError> {
        let now = Timestamp::now();

        // Step 1: upsert the base assessment by natural key.
        let mut assessment = match self.store.find_assessment(ctx.tenant_id, &input.object).await? {
            Some(existing) => existing,
            None => ComplianceAssessment::new(ctx.tenant_id, input.object.clone()),
        };
        let mut report = ExecutionReport::new(assessment.id, input.object.clone());

        // Step 2: link supplied evidence packages.
        assessment.link_packages(&input.evidence_package_ids);

        // Step 3: load current composition evidence. A load failure is
        // tolerated; evaluation proceeds with no evidence.
        let compositions = match self
            .store
            .list_compositions(
                ctx.tenant_id,
                &input.object.object_id,
                Some(CompositionStatus::Current),
            )
            .await
        {
            Ok(rows) => rows,
            Err(err) => {
                tracing::error!(object = %input.object, %err, "composition load failed");
                report
                    .downstream_errors
                    .push(DownstreamEffectError::CompositionLoad(err.to_string()));
                Vec::new()
            }
        };

        // Step 4: evaluate active jurisdictions and persist the verdict.
        let verdicts = self
            .evaluate_jurisdictions(ctx, &input, &compositions, &mut report)
            .await?;
        let mut status = ComplianceStatus::Compliant;
        let mut sections = Vec::new();
        for verdict in &verdicts {
            status = status.worst_of(verdict.status);
            let mut section = format!("[{}] {}", verdict.jurisdiction_id, verdict.status);
            if !verdict.reasoning.is_empty() {
                section.push('\n');
                section.push_str(&verdict.reasoning);
            }
            sections.push(section);
            assessment.decision_snapshots.push(verdict.snapshot.clone());
        }
        if verdicts.is_empty() {
            // Nothing was evaluated; a clean verdict would be unfounded.
            status = ComplianceStatus::InsufficientData;
            sections.push("No jurisdiction could be evaluated.".to_string());
        }
        assessment.status = status;
        assessment.reasoning = sections.join("\n\n");
        assessment.updated_at = now;
        let assessment = self.store.upsert_assessment(assessment).await?;
        report.status = assessment.status;

        // Remediation actions for triggered rules, keyed by
        // (assessment, rule, action_type).
        self.fan_out_actions(ctx, &assessment, &verdicts, now, &mut report)
            .await;

        // Step 5: denormalized status onto the linked entity.
        if let Some(target) = self.registry.get(input.object.kind) {
            if let Err(err) = target
                .apply_pfas_status(ctx, &input.object, assessment.status)
                .await
            {
                tracing::error!(object = %input.object, %err, "status propagation failed");
                report
                    .downstream_errors
                    .push(DownstreamEffectError::StatusPropagation(err.to_string()));
            }
        }

        // Step 6: SVHC notifications-of-concern and the risk alert.
        self.fan_out_notifications(ctx, &input.object, &compositions, now, &mut report)
            .await;
        if assessment.status.is_blocking() {
            self.fan_out_alert(ctx, &input.object, now, &mut report).await;
        }

        // Step 7: substitution scenario for the worst offender.
        if assessment.status.is_blocking() && !compositions.is_empty() {
            self.generate_scenario(ctx, &assessment, &compositions, now, &mut report)
                .await;
        }

        // Step 8: user alert and email, best-effort.
        if assessment.status.is_blocking() {
            self.deliver_notifications(ctx, &input, &mut report).await;
        }

        tracing::info!(
            object = %input.object,
            status = %assessment.status,
            evaluated = report.jurisdictions_evaluated.len(),
            skipped = report.jurisdictions_skipped.len(),
            downstream_errors = report.downstream_errors.len(),
            "assessment pipeline completed"
        );
        Ok(AssessmentOutcome { assessment, report })
    }

    /// Run the pipeline once per entity, never aborting the batch.
    pub async fn batch_scan(
        &self,
        ctx: &RequestContext,
        objects: &[ObjectRef],
    ) -> BatchReport {
        let mut batch = BatchReport::default();
        for object in objects {
            batch.processed += 1;
            match self
                .create_or_update_assessment(ctx, AssessmentInput::for_object(object.clone()))
                .await
            {
                Ok(outcome) => match outcome.assessment.status {
                    ComplianceStatus::Compliant => batch.compliant += 1,
                    ComplianceStatus::NonCompliant => batch.non_compliant += 1,
                    _ => {}
                },
                Err(err) => {
                    tracing::error!(object = %object, %err, "batch entry failed");
                    batch.errors.push((object.clone(), err.to_string()));
                }
            }
        }
        batch
    }

    /// Apply a manual compliance override, marking the object compliant.
    ///
    /// Requires a second approver: the approver must differ from the
    /// requester, same rule as grade B/C review decisions.
    pub async fn apply_override(
        &self,
        ctx: &RequestContext,
        object: &ObjectRef,
        justification: String,
        approved_by: String,
        expires: Option<Timestamp>,
    ) -> Result<ComplianceAssessment, OrchestratorError> {
        if approved_by == ctx.actor {
            return Err(OrchestratorError::SecondApproverRequired {
                requested_by: ctx.actor.clone(),
            });
        }
        let mut assessment = self
            .store
            .find_assessment(ctx.tenant_id, object)
            .await?
            .ok_or_else(|| OrchestratorError::AssessmentNotFound {
                object: object.clone(),
            })?;
        let now = Timestamp::now();
        assessment.override_record = Some(OverrideRecord {
            justification,
            requested_by: ctx.actor.clone(),
            approved_by,
            expires,
            applied_at: now,
        });
        assessment.status = ComplianceStatus::Compliant;
        assessment.updated_at = now;
        tracing::warn!(object = %object, actor = %ctx.actor, "manual compliance override applied");
        Ok(self.store.upsert_assessment(assessment).await?)
    }

    /// Step 4 inner loop: evaluate up to the jurisdiction cap, catching
    /// per-jurisdiction failures.
    async fn evaluate_jurisdictions(
        &self,
        ctx: &RequestContext,
        input: &AssessmentInput,
        compositions: &[MaterialComposition],
        report: &mut ExecutionReport,
    ) -> Result<Vec<JurisdictionVerdict>, OrchestratorError> {
        let jurisdictions = self.store.list_active_jurisdictions(ctx.tenant_id).await?;
        let mut verdicts = Vec::new();
        for jurisdiction in jurisdictions.into_iter().take(MAX_JURISDICTIONS_PER_RUN) {
            let rulesets = match self
                .store
                .list_active_rulesets(ctx.tenant_id, &jurisdiction.id)
                .await
            {
                Ok(rulesets) => rulesets,
                Err(err) => {
                    tracing::error!(jurisdiction = %jurisdiction.id, %err, "ruleset load failed");
                    report
                        .jurisdictions_skipped
                        .push((jurisdiction.id, err.to_string()));
                    continue;
                }
            };
            match self.engine.evaluate(&EvaluationInput {
                object: &input.object,
                jurisdiction_id: &jurisdiction.id,
                rulesets: &rulesets,
                compositions,
                use_categories: &input.use_categories,
            }) {
                Ok(verdict) => {
                    report.jurisdictions_evaluated.push(jurisdiction.id);
                    verdicts.push(verdict);
                }
                Err(err) => {
                    tracing::error!(jurisdiction = %jurisdiction.id, %err, "jurisdiction evaluation failed");
                    report
                        .jurisdictions_skipped
                        .push((jurisdiction.id, err.to_string()));
                }
            }
        }
        Ok(verdicts)
    }

    /// One remediation action per (assessment, rule, action_type),
    /// check-then-create.
    async fn fan_out_actions(
        &self,
        ctx: &RequestContext,
        assessment: &ComplianceAssessment,
        verdicts: &[JurisdictionVerdict],
        now: Timestamp,
        report: &mut ExecutionReport,
    ) {
        for verdict in verdicts {
            for triggered in &verdict.triggered_rules {
                for action_type in &triggered.action_types {
                    let existing = self
                        .store
                        .find_action(ctx.tenant_id, assessment.id, triggered.rule_id, action_type)
                        .await;
                    match existing {
                        Ok(Some(_)) => {}
                        Ok(None) => {
                            let action = RemediationAction {
                                id: Uuid::new_v4(),
                                tenant_id: ctx.tenant_id,
                                assessment_id: assessment.id,
                                rule_id: triggered.rule_id,
                                action_type: action_type.clone(),
                                description: format!(
                                    "{}: {}",
                                    triggered.rule_name, triggered.explanation
                                ),
                                status: ActionStatus::Open,
                                created_at: now,
                            };
                            match self.store.insert_action(action).await {
                                Ok(()) => report.actions_created += 1,
                                Err(err) => report
                                    .downstream_errors
                                    .push(DownstreamEffectError::Action(err.to_string())),
                            }
                        }
                        Err(err) => report
                            .downstream_errors
                            .push(DownstreamEffectError::Action(err.to_string())),
                    }
                }
            }
        }
    }

    /// One notification-of-concern per (object, SVHC substance),
    /// check-then-create.
    async fn fan_out_notifications(
        &self,
        ctx: &RequestContext,
        object: &ObjectRef,
        compositions: &[MaterialComposition],
        now: Timestamp,
        report: &mut ExecutionReport,
    ) {
        for composition in compositions {
            let Some(cas) = &composition.substance_cas else {
                continue;
            };
            if let Err(err) = self
                .notify_substance_of_concern(ctx, object, cas, now, report)
                .await
            {
                report
                    .downstream_errors
                    .push(DownstreamEffectError::ScipNotification(err.to_string()));
            }
        }
    }

    async fn notify_substance_of_concern(
        &self,
        ctx: &RequestContext,
        object: &ObjectRef,
        cas: &CasNumber,
        now: Timestamp,
        report: &mut ExecutionReport,
    ) -> Result<(), StoreError> {
        let Some(substance) = self.store.find_substance_by_cas(ctx.tenant_id, cas).await? else {
            return Ok(());
        };
        if substance.svhc_status != ListingStatus::Listed {
            return Ok(());
        }
        if self
            .store
            .find_scip_notification(ctx.tenant_id, object, cas)
            .await?
            .is_some()
        {
            return Ok(());
        }
        self.store
            .insert_scip_notification(ScipNotification {
                id: Uuid::new_v4(),
                tenant_id: ctx.tenant_id,
                object: object.clone(),
                substance_cas: cas.clone(),
                status: NotificationStatus::Pending,
                created_at: now,
            })
            .await?;
        report.notifications_created += 1;
        Ok(())
    }

    /// At most one open alert per (object, alert type).
    async fn fan_out_alert(
        &self,
        ctx: &RequestContext,
        object: &ObjectRef,
        now: Timestamp,
        report: &mut ExecutionReport,
    ) {
        let existing = self
            .store
            .find_open_alert(ctx.tenant_id, object, NON_COMPLIANT_ALERT_TYPE)
            .await;
        match existing {
            Ok(Some(_)) => {}
            Ok(None) => {
                let alert = RiskAlert {
                    id: Uuid::new_v4(),
                    tenant_id: ctx.tenant_id,
                    object: object.clone(),
                    alert_type: NON_COMPLIANT_ALERT_TYPE.to_string(),
                    message: format!("{object} is non-compliant with PFAS regulations"),
                    status: AlertStatus::Open,
                    created_at: now,
                };
                match self.store.insert_alert(alert).await {
                    Ok(()) => report.alerts_created += 1,
                    Err(err) => report
                        .downstream_errors
                        .push(DownstreamEffectError::RiskAlert(err.to_string())),
                }
            }
            Err(err) => report
                .downstream_errors
                .push(DownstreamEffectError::RiskAlert(err.to_string())),
        }
    }

    /// At most one substitution scenario per assessment, proposing a
    /// substitute for the highest-concentration identified substance.
    async fn generate_scenario(
        &self,
        ctx: &RequestContext,
        assessment: &ComplianceAssessment,
        compositions: &[MaterialComposition],
        now: Timestamp,
        report: &mut ExecutionReport,
    ) {
        let Some(worst) = compositions
            .iter()
            .filter(|c| c.substance_cas.is_some())
            .max_by(|a, b| {
                a.typical_concentration
                    .total_cmp(&b.typical_concentration)
            })
        else {
            return;
        };
        // Checked by the filter above.
        let Some(cas) = worst.substance_cas.clone() else {
            return;
        };

        let existing = self.store.find_scenario(ctx.tenant_id, assessment.id).await;
        match existing {
            Ok(Some(_)) => {}
            Ok(None) => {
                let scenario = SubstitutionScenario {
                    id: Uuid::new_v4(),
                    tenant_id: ctx.tenant_id,
                    assessment_id: assessment.id,
                    target_cas: cas.clone(),
                    target_concentration_ppm: worst.typical_concentration,
                    suggestion: format!(
                        "Evaluate fluorine-free alternatives to {} ({} ppm, highest concentration in current evidence)",
                        cas, worst.typical_concentration
                    ),
                    created_at: now,
                };
                match self.store.insert_scenario(scenario).await {
                    Ok(()) => report.scenario_created = true,
                    Err(err) => report
                        .downstream_errors
                        .push(DownstreamEffectError::Scenario(err.to_string())),
                }
            }
            Err(err) => report
                .downstream_errors
                .push(DownstreamEffectError::Scenario(err.to_string())),
        }
    }

    /// Step 8: user alert plus email to the responsible party.
    async fn deliver_notifications(
        &self,
        ctx: &RequestContext,
        input: &AssessmentInput,
        report: &mut ExecutionReport,
    ) {
        let message = format!("{} is non-compliant with PFAS regulations", input.object);
        if let Err(err) = self.notifier.send_alert(ctx, &input.object, &message).await {
            report
                .downstream_errors
                .push(DownstreamEffectError::Delivery(err.to_string()));
        }
        if let Some(recipient) = &input.responsible_party {
            if let Err(err) = self
                .notifier
                .send_email(
                    ctx,
                    recipient,
                    "PFAS non-compliance detected",
                    &message,
                )
                .await
            {
                report
                    .downstream_errors
                    .push(DownstreamEffectError::Delivery(err.to_string()));
            }
        }
    }
}
