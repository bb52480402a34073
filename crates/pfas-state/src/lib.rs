//! # pfas-state — Evidence Lifecycle State Machines
//!
//! Implements the evidence-side state machines of the PFAS stack. Each
//! state is an enum variant with validated transitions: transition methods
//! return `Result`, invalid transitions are rejected with structured
//! errors naming the current state and the attempted target.
//!
//! ## State Machines
//!
//! - **Evidence package review** (`package.rs`):
//!   `Draft → Submitted → UnderReview → Approved/Rejected`, with
//!   `Approved → Superseded/Expired`. Second-person enforcement for
//!   grade B/C decisions lives here as a transition precondition.
//!
//! - **Material composition currency** (`composition.rs`):
//!   `UnderReview → Current → Expired`, driven by the owning package's
//!   review outcome.
//!
//! - **Evidence documents** (`document.rs`): not a state machine, but the
//!   tamper-evidence and page-citation invariants are enforced at
//!   construction, next to the records they protect.

pub mod composition;
pub mod document;
pub mod error;
pub mod package;

// ─── Package re-exports ─────────────────────────────────────────────

pub use package::{
    EvidencePackage, ReviewDecision, ReviewState, ReviewTransitionRecord, Signatory,
};

// ─── Composition re-exports ─────────────────────────────────────────

pub use composition::{CompositionStatus, MaterialComposition, UnitBasis};

// ─── Document re-exports ────────────────────────────────────────────

pub use document::{DocType, EvidenceDocument, ExtractionMetadata};

// ─── Error re-exports ───────────────────────────────────────────────

pub use error::EvidenceError;
