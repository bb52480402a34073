//! Structured errors for evidence lifecycle transitions and intake
//! validation, with from/to context on every rejected transition.

use thiserror::Error;

use pfas_core::QualityGrade;

/// Errors raised by the evidence state machines and record constructors.
#[derive(Error, Debug)]
pub enum EvidenceError {
    /// Attempted transition is not valid from the current state.
    #[error("invalid evidence transition: {from} -> {to}")]
    InvalidTransition {
        /// Current state.
        from: String,
        /// Attempted target state.
        to: String,
    },

    /// The record is in a terminal state.
    #[error("evidence record is in terminal state {state}")]
    TerminalState {
        /// The terminal state.
        state: String,
    },

    /// A grade B/C decision came from the submitting actor.
    #[error("grade {grade} decisions require a second person; {actor} submitted this package")]
    SecondPersonRequired {
        /// The package's quality grade.
        grade: QualityGrade,
        /// The actor who attempted the decision.
        actor: String,
    },

    /// A confidence score was outside its valid range.
    #[error("confidence score {value} outside valid range {expected}")]
    InvalidConfidence {
        /// The rejected value.
        value: f64,
        /// The expected range.
        expected: String,
    },

    /// A concentration was negative or not finite.
    #[error("invalid concentration value: {value}")]
    InvalidConcentration {
        /// The rejected value.
        value: f64,
    },

    /// An AI-extracted field has no page citation.
    #[error("extracted field {field:?} has no page citation")]
    MissingPageCitation {
        /// The uncited field.
        field: String,
    },
}
