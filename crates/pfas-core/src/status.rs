//! # Shared Status Enums — Single Source of Truth
//!
//! One definition of every status vocabulary in the stack. Every `match`
//! on these enums is exhaustive — adding a variant forces every consumer
//! to handle it at compile time.
//!
//! `ComplianceStatus` additionally carries the monotonic worsening lattice
//! used for verdict aggregation: combining statuses always takes the worse
//! one, so the aggregate of any multiset of statuses is independent of the
//! order they arrive in.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ─── Compliance Status ───────────────────────────────────────────────

/// The verdict status of a compliance assessment.
///
/// Ordered by severity for aggregation:
/// `Compliant < UnderReview < InsufficientData < RequiresAction < NonCompliant`.
///
/// `InsufficientData` ranks above `Compliant` deliberately: absence of
/// rules (or of evidence) is not proof of safety, so a jurisdiction with
/// no active ruleset can never launder an object into a clean verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    /// All evaluated rules passed.
    Compliant,
    /// A pending evidence decision blocks a final verdict.
    UnderReview,
    /// No active rules or no evidence to evaluate against.
    InsufficientData,
    /// A warning-severity rule triggered; remediation expected.
    RequiresAction,
    /// A critical-severity rule triggered.
    NonCompliant,
}

impl ComplianceStatus {
    /// Severity rank used by the worsening lattice.
    fn rank(&self) -> u8 {
        match self {
            Self::Compliant => 0,
            Self::UnderReview => 1,
            Self::InsufficientData => 2,
            Self::RequiresAction => 3,
            Self::NonCompliant => 4,
        }
    }

    /// Combine two statuses, keeping the worse one.
    ///
    /// This operation is commutative, associative, and idempotent, which
    /// makes any fold over it order-independent.
    pub fn worst_of(self, other: ComplianceStatus) -> ComplianceStatus {
        if other.rank() > self.rank() {
            other
        } else {
            self
        }
    }

    /// Whether this status blocks the object (surfaces alerts, emails,
    /// substitution scenarios).
    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::NonCompliant)
    }

    /// Canonical snake_case tag, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compliant => "compliant",
            Self::UnderReview => "under_review",
            Self::InsufficientData => "insufficient_data",
            Self::RequiresAction => "requires_action",
            Self::NonCompliant => "non_compliant",
        }
    }
}

impl std::str::FromStr for ComplianceStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compliant" => Ok(Self::Compliant),
            "under_review" => Ok(Self::UnderReview),
            "insufficient_data" => Ok(Self::InsufficientData),
            "requires_action" => Ok(Self::RequiresAction),
            "non_compliant" => Ok(Self::NonCompliant),
            other => Err(CoreError::InvalidIdentifier {
                kind: "compliance_status".to_string(),
                reason: format!("unknown status {other:?}"),
            }),
        }
    }
}

impl std::fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Rule Severity ───────────────────────────────────────────────────

/// Severity of a regulatory rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Triggering forces `non_compliant`.
    Critical,
    /// Triggering upgrades `compliant` to `requires_action`.
    Warning,
}

impl Severity {
    /// The status a triggered rule of this severity contributes.
    pub fn triggered_status(&self) -> ComplianceStatus {
        match self {
            Self::Critical => ComplianceStatus::NonCompliant,
            Self::Warning => ComplianceStatus::RequiresAction,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Critical => "critical",
            Self::Warning => "warning",
        })
    }
}

// ─── Evidence Vocabulary ─────────────────────────────────────────────

/// A declaration's claim about substance presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    /// The substance is present.
    Present,
    /// The substance is declared absent.
    NotPresent,
    /// The declarant does not know.
    Unknown,
    /// The evidence could not resolve the question.
    Inconclusive,
}

/// Whether the substance was intentionally added to the material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentionallyAdded {
    Yes,
    No,
    Unknown,
}

/// Provenance tier of a piece of evidence, assigned at creation and never
/// inferred later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QualityGrade {
    /// Laboratory test result — assumed ground truth.
    A,
    /// Supplier declaration — requires a human decision.
    B,
    /// AI-inferred extraction — requires a human decision.
    C,
    /// Any other or unverified source.
    D,
}

impl QualityGrade {
    /// Whether an approval/rejection decision on this grade must come from
    /// a different person than the submitter.
    pub fn requires_second_person(&self) -> bool {
        matches!(self, Self::B | Self::C)
    }
}

impl std::fmt::Display for QualityGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        })
    }
}

/// Where a material composition row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    SupplierDeclaration,
    LabTest,
    AiInferred,
}

/// A regulatory listing status reported by the regulatory-status provider.
///
/// Defaults to `Unknown` when the provider did not answer — never to
/// `NotListed`, which is a positive claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Listed,
    NotListed,
    #[default]
    Unknown,
}

// ─── Tests ───────────────────────────────────────────────────────────
