//! # pfas-core — Foundational Types for the PFAS Compliance Stack
//!
//! This crate is the bedrock of the stack. It defines the type-system
//! primitives every other crate builds on:
//!
//! 1. **Validated identifier newtypes.** `CasNumber` (with CAS check-digit
//!    validation), `JurisdictionId`, and one UUID newtype per record
//!    family. No bare strings for identifiers.
//!
//! 2. **Explicit request context.** `RequestContext { tenant_id, actor }`
//!    is passed into every pipeline call — there is no ambient
//!    "current user/tenant" lookup anywhere in the stack.
//!
//! 3. **UTC-only timestamps.** `Timestamp` enforces UTC with Z suffix and
//!    seconds precision, and carries the staleness arithmetic behind the
//!    30-day substance cache window.
//!
//! 4. **Two digest paths.** Raw SHA-256 for file tamper-evidence; RFC 8785
//!    canonical JSON + SHA-256 for decision-snapshot audit digests.
//!
//! 5. **Single status vocabulary.** `ComplianceStatus` with its monotonic
//!    worsening lattice, plus the evidence grading and claim enums, defined
//!    once and matched exhaustively everywhere.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `pfas-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - All public types derive `Debug`, `Clone`, and implement
//!   `Serialize`/`Deserialize`.

pub mod digest;
pub mod error;
pub mod identity;
pub mod status;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use digest::{canonical_digest, sha256_digest, ContentDigest};
pub use error::CoreError;
pub use identity::{
    AssessmentId, CasNumber, CompositionId, DocumentId, JurisdictionId, ObjectKind, ObjectRef,
    PackageId, RequestContext, RuleId, RulesetId, SubstanceId, TenantId,
};
pub use status::{
    ClaimStatus, ComplianceStatus, IntentionallyAdded, ListingStatus, QualityGrade, Severity,
    SourceType,
};
pub use temporal::Timestamp;
