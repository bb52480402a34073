//! # pfas-evidence — Intake and Review Pipeline
//!
//! Turns declarations (manual forms, laboratory imports, AI-extracted
//! documents) into evidence packages with quality grades, drives them
//! through the review state machine, and owns the approval side effects:
//! evidence rollover, supersession, and the synchronous re-assessment of
//! the affected object through the orchestrator.

pub mod error;
pub mod intake;
pub mod review;

pub use error::PipelineError;
pub use intake::{
    CompositionEntry, DeclarationForm, DocumentExtractor, ExtractedDeclaration, IntakeService,
    UploadedFile, EXTRACTION_SUBMIT_GATE, LAB_AUTO_APPROVE_CONFIDENCE,
};
pub use review::ReviewService;
