//! Pipeline-level errors: intake and review failures wrapping the state
//! machine, store, and orchestrator error families.

use thiserror::Error;

use pfas_orchestrator::OrchestratorError;
use pfas_state::EvidenceError;
use pfas_store::StoreError;

/// Errors raised by the evidence intake and review services.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A state-machine transition or record validation failed.
    #[error(transparent)]
    Evidence(#[from] EvidenceError),

    /// The persistence collaborator failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The synchronous post-approval assessment run failed.
    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),

    /// The document extraction collaborator failed.
    #[error("document extraction failed: {0}")]
    Extraction(String),
}
