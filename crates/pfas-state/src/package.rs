//! # Evidence Package Review State Machine
//!
//! Models the review lifecycle of a substance declaration from submission
//! to a terminal verdict.
//!
//! ## States
//!
//! ```text
//! Draft ──▶ Submitted ──▶ UnderReview ──▶ Approved ──▶ Superseded (terminal)
//!                              │              │
//!                              │              └──▶ Expired (terminal)
//!                              │
//!                              └──▶ Rejected (terminal)
//! ```
//!
//! ## Design Decision
//!
//! The review workflow uses an enum with validated transitions rather than
//! typestate types. Packages are persisted and re-hydrated between
//! transitions, so the state must be data, not a type parameter. The enum
//! approach with transition methods returning `Result` rejects invalid
//! transitions at runtime with structured errors.
//!
//! ## Review Policy
//!
//! Quality grades B and C require a second-person decision: the approving
//! or rejecting reviewer must not be the actor who submitted the package.
//! This is enforced here as a transition precondition, not left to the
//! reviewer UI.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use pfas_core::{
    ClaimStatus, IntentionallyAdded, ObjectRef, PackageId, QualityGrade, TenantId, Timestamp,
};

use crate::error::EvidenceError;

// ─── Review State ────────────────────────────────────────────────────

/// The review state of an evidence package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewState {
    /// Incomplete intake; a human must complete or confirm it.
    Draft,
    /// Submitted and awaiting a reviewer.
    Submitted,
    /// A reviewer has taken the package.
    UnderReview,
    /// Accepted as authoritative evidence.
    Approved,
    /// Refused; its compositions never count as evidence (terminal).
    Rejected,
    /// A newer approved package for the same object replaced it (terminal).
    Superseded,
    /// Its validity window lapsed (terminal).
    Expired,
}

impl ReviewState {
    /// Whether this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Superseded | Self::Expired)
    }

    /// Whether the package currently counts as authoritative evidence.
    pub fn is_authoritative(&self) -> bool {
        matches!(self, Self::Approved)
    }
}

impl std::fmt::Display for ReviewState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Draft => "DRAFT",
            Self::Submitted => "SUBMITTED",
            Self::UnderReview => "UNDER_REVIEW",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Superseded => "SUPERSEDED",
            Self::Expired => "EXPIRED",
        };
        f.write_str(s)
    }
}

// ─── Supporting Records ──────────────────────────────────────────────

/// The person who signed the declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signatory {
    /// Full name.
    pub name: String,
    /// Role within the signing organization.
    pub role: String,
    /// The signing organization.
    pub organization: String,
}

/// A reviewer's decision context for a transition.
#[derive(Debug, Clone)]
pub struct ReviewDecision {
    /// The acting reviewer.
    pub reviewer: String,
    /// Reason recorded on the transition.
    pub reason: String,
}

/// Record of a review state transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewTransitionRecord {
    /// State before the transition.
    pub from_state: ReviewState,
    /// State after the transition.
    pub to_state: ReviewState,
    /// When the transition occurred.
    pub timestamp: Timestamp,
    /// The acting principal.
    pub actor: String,
    /// Reason for the transition.
    pub reason: String,
}

// ─── Evidence Package ────────────────────────────────────────────────

/// A substance declaration under review, with its full transition history.
///
/// Packages are never deleted — a replaced package is superseded, a lapsed
/// one expired, so the audit trail stays intact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidencePackage {
    /// Unique identifier.
    pub id: PackageId,
    /// Tenant partition key.
    pub tenant_id: TenantId,
    /// The article/material/supplier this evidence is about.
    pub object: ObjectRef,
    /// The declaration's presence claim.
    pub claim_status: ClaimStatus,
    /// Whether the substance was intentionally added.
    pub intentionally_added: IntentionallyAdded,
    /// Human-readable threshold the declaration was made against.
    pub threshold_definition: Option<String>,
    /// Numeric threshold in ppm, when the definition carries one.
    pub threshold_numeric_ppm: Option<f64>,
    /// Start of the validity window.
    pub valid_from: Option<Timestamp>,
    /// End of the validity window.
    pub valid_to: Option<Timestamp>,
    /// Who signed the declaration.
    pub signatory: Option<Signatory>,
    /// Provenance tier, assigned at creation.
    pub quality_grade: QualityGrade,
    /// Intake confidence, 0-100.
    pub confidence_score: f64,
    /// Current review state.
    pub review_status: ReviewState,
    /// The actor who submitted the package.
    pub submitted_by: String,
    /// When the package was created.
    pub created_at: Timestamp,
    /// Free-form intake metadata (e.g. extraction prompt details).
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    /// Ordered log of all review transitions.
    pub transitions: Vec<ReviewTransitionRecord>,
}

impl EvidencePackage {
    /// Create a package at a given entry state.
    ///
    /// The entry state is an intake routing decision (grade and confidence
    /// driven) made by the evidence pipeline; the state machine only
    /// validates subsequent transitions.
    ///
    /// # Errors
    ///
    /// Rejects confidence scores outside 0-100.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tenant_id: TenantId,
        object: ObjectRef,
        claim_status: ClaimStatus,
        quality_grade: QualityGrade,
        confidence_score: f64,
        entry_state: ReviewState,
        submitted_by: impl Into<String>,
    ) -> Result<Self, EvidenceError> {
        if !(0.0..=100.0).contains(&confidence_score) {
            return Err(EvidenceError::InvalidConfidence {
                value: confidence_score,
                expected: "0-100".to_string(),
            });
        }
        Ok(Self {
            id: PackageId::new(),
            tenant_id,
            object,
            claim_status,
            intentionally_added: IntentionallyAdded::Unknown,
            threshold_definition: None,
            threshold_numeric_ppm: None,
            valid_from: None,
            valid_to: None,
            signatory: None,
            quality_grade,
            confidence_score,
            review_status: entry_state,
            submitted_by: submitted_by.into(),
            created_at: Timestamp::now(),
            metadata: BTreeMap::new(),
            transitions: Vec::new(),
        })
    }

    /// Complete a draft and submit it for review (DRAFT → SUBMITTED).
    pub fn submit(&mut self, actor: &str, reason: &str) -> Result<(), EvidenceError> {
        self.require_state(ReviewState::Draft, "SUBMITTED")?;
        self.do_transition(ReviewState::Submitted, actor, reason);
        Ok(())
    }

    /// A reviewer takes the package (SUBMITTED → UNDER_REVIEW).
    pub fn start_review(&mut self, decision: ReviewDecision) -> Result<(), EvidenceError> {
        self.require_state(ReviewState::Submitted, "UNDER_REVIEW")?;
        self.do_transition(ReviewState::UnderReview, &decision.reviewer, &decision.reason);
        Ok(())
    }

    /// Approve the package (UNDER_REVIEW → APPROVED).
    ///
    /// For grades B and C the reviewer must differ from the submitter.
    pub fn approve(&mut self, decision: ReviewDecision) -> Result<(), EvidenceError> {
        self.require_state(ReviewState::UnderReview, "APPROVED")?;
        self.require_second_person(&decision.reviewer)?;
        self.do_transition(ReviewState::Approved, &decision.reviewer, &decision.reason);
        Ok(())
    }

    /// Reject the package (UNDER_REVIEW → REJECTED).
    ///
    /// For grades B and C the reviewer must differ from the submitter.
    pub fn reject(&mut self, decision: ReviewDecision) -> Result<(), EvidenceError> {
        self.require_state(ReviewState::UnderReview, "REJECTED")?;
        self.require_second_person(&decision.reviewer)?;
        self.do_transition(ReviewState::Rejected, &decision.reviewer, &decision.reason);
        Ok(())
    }

    /// Mark the package replaced by a newer approved package
    /// (APPROVED → SUPERSEDED).
    pub fn supersede(&mut self, actor: &str, reason: &str) -> Result<(), EvidenceError> {
        self.require_state(ReviewState::Approved, "SUPERSEDED")?;
        self.do_transition(ReviewState::Superseded, actor, reason);
        Ok(())
    }

    /// Expire the package after its validity window lapsed
    /// (APPROVED → EXPIRED).
    pub fn expire(&mut self, actor: &str, reason: &str) -> Result<(), EvidenceError> {
        self.require_state(ReviewState::Approved, "EXPIRED")?;
        self.do_transition(ReviewState::Expired, actor, reason);
        Ok(())
    }

    /// Whether the package's validity window has lapsed at `now`.
    pub fn validity_lapsed(&self, now: Timestamp) -> bool {
        matches!(self.valid_to, Some(until) if until < now)
    }

    /// Validate the second-person rule for decision transitions.
    fn require_second_person(&self, reviewer: &str) -> Result<(), EvidenceError> {
        if self.quality_grade.requires_second_person() && reviewer == self.submitted_by {
            return Err(EvidenceError::SecondPersonRequired {
                grade: self.quality_grade,
                actor: reviewer.to_string(),
            });
        }
        Ok(())
    }

    /// Validate that the package is in the expected state.
    fn require_state(&self, expected: ReviewState, target: &str) -> Result<(), EvidenceError> {
        if self.review_status.is_terminal() {
            return Err(EvidenceError::TerminalState {
                state: self.review_status.to_string(),
            });
        }
        if self.review_status != expected {
            return Err(EvidenceError::InvalidTransition {
                from: self.review_status.to_string(),
                to: target.to_string(),
            });
        }
        Ok(())
    }

    /// Record a state transition.
    fn do_transition(&mut self, to: ReviewState, actor: &str, reason: &str) {
        self.transitions.push(ReviewTransitionRecord {
            from_state: self.review_status,
            to_state: to,
            timestamp: Timestamp::now(),
            actor: actor.to_string(),
            reason: reason.to_string(),
        });
        self.review_status = to;
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pfas_core::ObjectKind;

    fn object() -> ObjectRef {
        ObjectRef::new(ObjectKind::Article, "art-001").unwrap()
    }

    fn decision(reviewer: &str) -> ReviewDecision {
        ReviewDecision {
            reviewer: reviewer.to_string(),
            reason: "test decision".to_string(),
        }
    }

    fn make_submitted(grade: QualityGrade) -> EvidencePackage {
        EvidencePackage::new(
            TenantId::new(),
            object(),
            ClaimStatus::Present,
            grade,
            90.0,
            ReviewState::Submitted,
            "user:supplier",
        )
        .unwrap()
    }

    // ── Happy-path lifecycle ─────────────────────────────────────────

    #[test]
    fn test_draft_to_submitted() {
        let mut pkg = EvidencePackage::new(
            TenantId::new(),
            object(),
            ClaimStatus::Unknown,
            QualityGrade::C,
            60.0,
            ReviewState::Draft,
            "system:extractor",
        )
        .unwrap();
        pkg.submit("user:supplier", "Fields confirmed").unwrap();
        assert_eq!(pkg.review_status, ReviewState::Submitted);
        assert_eq!(pkg.transitions.len(), 1);
    }

    #[test]
    fn test_submitted_through_approved() {
        let mut pkg = make_submitted(QualityGrade::B);
        pkg.start_review(decision("user:reviewer")).unwrap();
        pkg.approve(decision("user:reviewer")).unwrap();
        assert_eq!(pkg.review_status, ReviewState::Approved);
        assert!(pkg.review_status.is_authoritative());
        assert_eq!(pkg.transitions.len(), 2);
    }

    #[test]
    fn test_rejection_is_terminal() {
        let mut pkg = make_submitted(QualityGrade::B);
        pkg.start_review(decision("user:reviewer")).unwrap();
        pkg.reject(decision("user:reviewer")).unwrap();
        assert_eq!(pkg.review_status, ReviewState::Rejected);
        assert!(pkg.review_status.is_terminal());
        assert!(pkg.submit("user:supplier", "retry").is_err());
    }

    #[test]
    fn test_approved_to_superseded() {
        let mut pkg = make_submitted(QualityGrade::B);
        pkg.start_review(decision("user:reviewer")).unwrap();
        pkg.approve(decision("user:reviewer")).unwrap();
        pkg.supersede("system:review", "Replaced by newer package").unwrap();
        assert_eq!(pkg.review_status, ReviewState::Superseded);
        assert!(pkg.review_status.is_terminal());
    }

    #[test]
    fn test_approved_to_expired() {
        let mut pkg = make_submitted(QualityGrade::B);
        pkg.start_review(decision("user:reviewer")).unwrap();
        pkg.approve(decision("user:reviewer")).unwrap();
        pkg.expire("system:sweep", "Validity window lapsed").unwrap();
        assert_eq!(pkg.review_status, ReviewState::Expired);
    }

    // ── Second-person rule ───────────────────────────────────────────

    #[test]
    fn test_grade_b_self_approval_rejected() {
        let mut pkg = make_submitted(QualityGrade::B);
        pkg.start_review(decision("user:supplier")).unwrap();
        let err = pkg.approve(decision("user:supplier")).unwrap_err();
        match err {
            EvidenceError::SecondPersonRequired { grade, .. } => {
                assert_eq!(grade, QualityGrade::B)
            }
            other => panic!("expected SecondPersonRequired, got {other:?}"),
        }
    }

    #[test]
    fn test_grade_c_self_rejection_rejected() {
        let mut pkg = make_submitted(QualityGrade::C);
        pkg.start_review(decision("user:supplier")).unwrap();
        assert!(pkg.reject(decision("user:supplier")).is_err());
    }

    #[test]
    fn test_grade_a_self_decision_allowed() {
        let mut pkg = make_submitted(QualityGrade::A);
        pkg.start_review(decision("user:supplier")).unwrap();
        pkg.approve(decision("user:supplier")).unwrap();
        assert_eq!(pkg.review_status, ReviewState::Approved);
    }

    // ── Invalid transitions ──────────────────────────────────────────

    #[test]
    fn test_cannot_approve_from_submitted() {
        let mut pkg = make_submitted(QualityGrade::B);
        assert!(pkg.approve(decision("user:reviewer")).is_err());
    }

    #[test]
    fn test_cannot_supersede_unapproved() {
        let mut pkg = make_submitted(QualityGrade::B);
        assert!(pkg.supersede("system:review", "test").is_err());
    }

    #[test]
    fn test_cannot_submit_twice() {
        let mut pkg = make_submitted(QualityGrade::B);
        assert!(pkg.submit("user:supplier", "again").is_err());
    }

    // ── Validation ───────────────────────────────────────────────────

    #[test]
    fn test_confidence_out_of_range_rejected() {
        let result = EvidencePackage::new(
            TenantId::new(),
            object(),
            ClaimStatus::Present,
            QualityGrade::B,
            140.0,
            ReviewState::Submitted,
            "user:supplier",
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_validity_lapsed() {
        let mut pkg = make_submitted(QualityGrade::B);
        let now = Timestamp::now();
        assert!(!pkg.validity_lapsed(now));
        pkg.valid_to = Some(now.minus_days(1));
        assert!(pkg.validity_lapsed(now));
        pkg.valid_to = Some(now.plus_days(1));
        assert!(!pkg.validity_lapsed(now));
    }

    // ── Serialization ────────────────────────────────────────────────

    #[test]
    fn test_package_serialization() {
        let pkg = make_submitted(QualityGrade::B);
        let json = serde_json::to_string(&pkg).unwrap();
        let parsed: EvidencePackage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.review_status, pkg.review_status);
        assert_eq!(parsed.id, pkg.id);
    }
}
