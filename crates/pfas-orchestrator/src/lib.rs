//! # pfas-orchestrator — The Compliance Pipeline Entry Point
//!
//! Sequences verification evidence, rule evaluation, verdict persistence,
//! and idempotent downstream fan-out behind one entry point,
//! [`Orchestrator::create_or_update_assessment`]. Every producer — the
//! scan surface, the supplier portal, evidence review, batch jobs — goes
//! through it; there is no other writer of compliance verdicts.

pub mod notify;
pub mod orchestrator;
pub mod registry;
pub mod report;

pub use notify::{LogNotifier, Notifier};
pub use orchestrator::{
    AssessmentInput, AssessmentOutcome, Orchestrator, OrchestratorError,
    MAX_JURISDICTIONS_PER_RUN, NON_COMPLIANT_ALERT_TYPE,
};
pub use registry::{PfasStatusTarget, StatusTargetRegistry};
pub use report::{BatchReport, DownstreamEffectError, ExecutionReport};
