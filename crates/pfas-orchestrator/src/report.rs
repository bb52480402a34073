//! # Pipeline Execution Reports
//!
//! Every orchestrator run returns a report of what each step did and
//! which best-effort steps failed. Downstream failures are typed and
//! collected here rather than logged to the void, so tests can assert on
//! partial failure directly.

use thiserror::Error;

use pfas_core::{AssessmentId, ComplianceStatus, JurisdictionId, ObjectRef};

/// A best-effort pipeline step that failed.
///
/// These never roll back the persisted assessment; the verdict is the
/// authoritative output and the effects are retried on the next run
/// (their natural keys make re-creation idempotent).
#[derive(Error, Debug)]
pub enum DownstreamEffectError {
    /// Denormalized status propagation onto the linked entity failed.
    #[error("status propagation failed: {0}")]
    StatusPropagation(String),

    /// Loading the object's current composition evidence failed.
    #[error("composition load failed: {0}")]
    CompositionLoad(String),

    /// Persisting a remediation action failed.
    #[error("remediation action creation failed: {0}")]
    Action(String),

    /// Creating a notification-of-concern record failed.
    #[error("notification-of-concern creation failed: {0}")]
    ScipNotification(String),

    /// Creating a risk alert failed.
    #[error("risk alert creation failed: {0}")]
    RiskAlert(String),

    /// Generating a substitution scenario failed.
    #[error("substitution scenario generation failed: {0}")]
    Scenario(String),

    /// User alert or email delivery failed.
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}

/// What one orchestrator run did.
#[derive(Debug)]
pub struct ExecutionReport {
    /// The assessment that was created or updated.
    pub assessment_id: AssessmentId,
    /// The assessed object.
    pub object: ObjectRef,
    /// The final aggregated status.
    pub status: ComplianceStatus,
    /// Jurisdictions whose evaluation succeeded, in evaluation order.
    pub jurisdictions_evaluated: Vec<JurisdictionId>,
    /// Jurisdictions whose evaluation failed, with the failure rendered.
    pub jurisdictions_skipped: Vec<(JurisdictionId, String)>,
    /// Remediation actions created this run (existing ones not counted).
    pub actions_created: usize,
    /// Notification-of-concern records created this run.
    pub notifications_created: usize,
    /// Risk alerts created this run.
    pub alerts_created: usize,
    /// Whether a substitution scenario was generated this run.
    pub scenario_created: bool,
    /// Best-effort step failures. Never fatal.
    pub downstream_errors: Vec<DownstreamEffectError>,
}

impl ExecutionReport {
    pub(crate) fn new(assessment_id: AssessmentId, object: ObjectRef) -> Self {
        Self {
            assessment_id,
            object,
            status: ComplianceStatus::UnderReview,
            jurisdictions_evaluated: Vec::new(),
            jurisdictions_skipped: Vec::new(),
            actions_created: 0,
            notifications_created: 0,
            alerts_created: 0,
            scenario_created: false,
            downstream_errors: Vec::new(),
        }
    }
}

/// Accumulated outcome of a batch scan.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Entities the scan attempted.
    pub processed: usize,
    /// Entities that came out `compliant`.
    pub compliant: usize,
    /// Entities that came out `non_compliant`.
    pub non_compliant: usize,
    /// Entities whose pipeline run failed entirely, with the error
    /// rendered. A single failure never aborts the batch.
    pub errors: Vec<(ObjectRef, String)>,
}
