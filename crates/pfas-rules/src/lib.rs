//! # pfas-rules — Regulatory Rule Evaluation
//!
//! A pure evaluation engine: given one jurisdiction's active rulesets and
//! an object's current composition evidence, it produces a
//! [`JurisdictionVerdict`] with the aggregated status, the triggered
//! rules, human-readable reasoning (exempted rules included, annotated),
//! and a frozen decision snapshot for audit replay. Persistence of the
//! verdict and the action fan-out belong to the orchestrator.

pub mod engine;
pub mod payload;
pub mod snapshot;

pub use engine::{
    EvaluationInput, JurisdictionVerdict, RuleEngine, RuleEngineError, TriggeredRule,
};
pub use payload::{
    MalformedPayload, RuleActions, RuleCondition, RuleExemptions, RuleThresholds, TypedRule,
};
