//! # Review Workflow Service
//!
//! Drives evidence packages through the review state machine and owns the
//! approval/rejection side effects as one unit of work:
//!
//! - **Approval**: the package's composition rows become `current`,
//!   competing `current` rows for the same material expire, prior
//!   approved packages for the object are superseded, and the
//!   orchestrator is invoked synchronously as the last step so the
//!   re-assessment always sees the new authoritative evidence. Never
//!   fire-and-forget: a scan racing an approval must not evaluate stale
//!   rows.
//! - **Rejection**: the package's rows expire without ever becoming
//!   `current` — a rejected declaration must not silently count as
//!   evidence.

use std::sync::Arc;

use pfas_core::{ObjectRef, PackageId, RequestContext, Timestamp};
use pfas_orchestrator::{AssessmentInput, AssessmentOutcome, Orchestrator};
use pfas_state::{CompositionStatus, EvidencePackage, ReviewDecision};
use pfas_store::EntityStore;

use crate::error::PipelineError;

/// The review workflow service.
pub struct ReviewService<S> {
    store: Arc<S>,
    orchestrator: Arc<Orchestrator<S>>,
}

impl<S: EntityStore> ReviewService<S> {
    pub fn new(store: Arc<S>, orchestrator: Arc<Orchestrator<S>>) -> Self {
        Self {
            store,
            orchestrator,
        }
    }

    /// A reviewer takes a submitted package.
    pub async fn start_review(
        &self,
        ctx: &RequestContext,
        package_id: PackageId,
        reason: &str,
    ) -> Result<EvidencePackage, PipelineError> {
        let mut package = self.store.get_package(ctx.tenant_id, package_id).await?;
        package.start_review(ReviewDecision {
            reviewer: ctx.actor.clone(),
            reason: reason.to_string(),
        })?;
        self.store.update_package(package.clone()).await?;
        Ok(package)
    }

    /// Approve a package under review and apply the approval effects.
    ///
    /// Grade B/C packages reject a decision by their own submitter.
    pub async fn approve(
        &self,
        ctx: &RequestContext,
        package_id: PackageId,
        reason: &str,
    ) -> Result<(EvidencePackage, AssessmentOutcome), PipelineError> {
        let mut package = self.store.get_package(ctx.tenant_id, package_id).await?;
        package.approve(ReviewDecision {
            reviewer: ctx.actor.clone(),
            reason: reason.to_string(),
        })?;
        self.store.update_package(package.clone()).await?;
        let outcome = self.finalize_approval(ctx, &package).await?;
        Ok((package, outcome))
    }

    /// Reject a package under review; its rows expire, never `current`.
    pub async fn reject(
        &self,
        ctx: &RequestContext,
        package_id: PackageId,
        reason: &str,
    ) -> Result<EvidencePackage, PipelineError> {
        let mut package = self.store.get_package(ctx.tenant_id, package_id).await?;
        package.reject(ReviewDecision {
            reviewer: ctx.actor.clone(),
            reason: reason.to_string(),
        })?;
        self.store.update_package(package.clone()).await?;

        let rows = self
            .store
            .list_compositions_by_package(ctx.tenant_id, package.id)
            .await?;
        for mut row in rows {
            if !row.status.is_terminal() {
                row.expire()?;
                self.store.update_composition(row).await?;
            }
        }
        tracing::info!(package = %package.id, actor = %ctx.actor, "evidence package rejected");
        Ok(package)
    }

    /// Expire approved packages whose validity window has lapsed,
    /// re-assessing each affected object. Returns the count expired.
    pub async fn expire_lapsed(
        &self,
        ctx: &RequestContext,
        now: Timestamp,
    ) -> Result<usize, PipelineError> {
        let approved = self.store.list_approved_packages(ctx.tenant_id).await?;
        let mut affected_objects: Vec<ObjectRef> = Vec::new();
        let mut expired = 0usize;
        for mut package in approved {
            if !package.validity_lapsed(now) {
                continue;
            }
            package.expire(&ctx.actor, "validity window lapsed")?;
            self.store.update_package(package.clone()).await?;
            let rows = self
                .store
                .list_compositions_by_package(ctx.tenant_id, package.id)
                .await?;
            for mut row in rows {
                if !row.status.is_terminal() {
                    row.expire()?;
                    self.store.update_composition(row).await?;
                }
            }
            if !affected_objects.contains(&package.object) {
                affected_objects.push(package.object.clone());
            }
            expired += 1;
            tracing::info!(package = %package.id, "approved package expired by sweep");
        }
        for object in affected_objects {
            self.orchestrator
                .create_or_update_assessment(ctx, AssessmentInput::for_object(object))
                .await?;
        }
        Ok(expired)
    }

    /// Approval side effects for an already-approved package: evidence
    /// rollover, supersession of prior approved packages, and the
    /// synchronous re-assessment. Also the entry path for grade A
    /// auto-approval at intake.
    pub(crate) async fn finalize_approval(
        &self,
        ctx: &RequestContext,
        package: &EvidencePackage,
    ) -> Result<AssessmentOutcome, PipelineError> {
        let new_rows = self
            .store
            .list_compositions_by_package(ctx.tenant_id, package.id)
            .await?;

        // Expire competing current rows before promoting the new ones, so
        // at most one row per material is current at any point.
        let mut materials: Vec<&str> = Vec::new();
        for row in &new_rows {
            if !materials.contains(&row.material_id.as_str()) {
                materials.push(&row.material_id);
            }
        }
        for material_id in materials {
            let current = self
                .store
                .list_compositions(ctx.tenant_id, material_id, Some(CompositionStatus::Current))
                .await?;
            for mut row in current {
                if row.source_package_id != package.id {
                    row.expire()?;
                    self.store.update_composition(row).await?;
                }
            }
        }
        for mut row in new_rows {
            row.mark_current()?;
            self.store.update_composition(row).await?;
        }

        // Supersede prior approved packages for the same object.
        let siblings = self
            .store
            .list_packages_for_object(ctx.tenant_id, &package.object)
            .await?;
        for mut sibling in siblings {
            if sibling.id != package.id && sibling.review_status.is_authoritative() {
                sibling.supersede(&ctx.actor, "replaced by newer approved package")?;
                self.store.update_package(sibling).await?;
            }
        }

        // The re-assessment runs synchronously as the last step, after
        // the evidence transition has fully landed.
        let outcome = self
            .orchestrator
            .create_or_update_assessment(
                ctx,
                AssessmentInput {
                    object: package.object.clone(),
                    evidence_package_ids: vec![package.id],
                    use_categories: Vec::new(),
                    responsible_party: None,
                },
            )
            .await?;
        tracing::info!(
            package = %package.id,
            object = %package.object,
            status = %outcome.assessment.status,
            "evidence package approved and object re-assessed"
        );
        Ok(outcome)
    }
}
