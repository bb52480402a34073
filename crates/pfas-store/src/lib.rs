//! # pfas-store — Entity Records and the Persistence Boundary
//!
//! Defines the entity records owned by the hosted store (verified
//! substances, regulatory rulesets, assessments, and the remediation
//! artifacts the orchestrator fans out to), the [`EntityStore`]
//! collaborator trait that is the stack's only persistence seam, and
//! [`MemoryStore`], the in-memory implementation used by test suites and
//! the CLI.
//!
//! The evidence-side records (`EvidencePackage`, `EvidenceDocument`,
//! `MaterialComposition`) live in `pfas-state` next to their state
//! machines; this crate stores them but does not define them.

pub mod assessment;
pub mod memory;
pub mod regulatory;
pub mod store;
pub mod substance;

// ─── Record re-exports ──────────────────────────────────────────────

pub use assessment::{
    ActionStatus, AlertStatus, ComplianceAssessment, DecisionSnapshotEntry, NotificationStatus,
    OverrideRecord, RemediationAction, RiskAlert, ScipNotification, SubstitutionScenario,
};
pub use regulatory::{Jurisdiction, Rule, Ruleset, RulesetStatus};
pub use substance::{Substance, VerificationMetadata};

// ─── Store re-exports ───────────────────────────────────────────────

pub use memory::MemoryStore;
pub use store::{EntityStore, StoreError};
