//! # Material Composition Currency Transitions
//!
//! One `MaterialComposition` row per (material, substance) occurrence.
//! Rows are born `UnderReview` alongside their evidence package and either
//! become `Current` when the package is approved or `Expired` when it is
//! rejected or replaced.
//!
//! ## Invariant
//!
//! At most one row per (material_id, substance_cas) is `Current` at a
//! time. The rollover (expire the old winner, promote the new rows) is
//! performed by the review service as part of the approval unit of work;
//! this module only validates the individual transitions.

use serde::{Deserialize, Serialize};

use pfas_core::{
    CasNumber, CompositionId, DocumentId, PackageId, SourceType, TenantId, Timestamp,
};

use crate::error::EvidenceError;

/// Currency status of a composition row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositionStatus {
    /// Created with a not-yet-approved package.
    UnderReview,
    /// The authoritative row for its (material, substance) pair.
    Current,
    /// Replaced, rejected, or lapsed (terminal).
    Expired,
}

impl CompositionStatus {
    /// Whether this status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Expired)
    }
}

impl std::fmt::Display for CompositionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::UnderReview => "UNDER_REVIEW",
            Self::Current => "CURRENT",
            Self::Expired => "EXPIRED",
        })
    }
}

/// Concentration unit basis. Threshold comparisons all happen in ppm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnitBasis {
    #[default]
    Ppm,
}

/// A single (material, substance) concentration observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialComposition {
    /// Unique identifier.
    pub id: CompositionId,
    /// Tenant partition key.
    pub tenant_id: TenantId,
    /// The material (or article) the observation belongs to.
    pub material_id: String,
    /// The observed substance. `None` while identity resolution is pending;
    /// rows without a CAS number are excluded from per-substance threshold
    /// checks but still contribute to aggregate totals.
    pub substance_cas: Option<CasNumber>,
    /// Typical concentration in `unit_basis`.
    pub typical_concentration: f64,
    /// Unit basis of the concentration value.
    pub unit_basis: UnitBasis,
    /// Provenance of the observation.
    pub source_type: SourceType,
    /// Observation confidence, 0.0-1.0.
    pub confidence_score: f64,
    /// The evidence document the observation was taken from, if any.
    pub source_document_id: Option<DocumentId>,
    /// The evidence package that carried the observation.
    pub source_package_id: PackageId,
    /// Currency status.
    pub status: CompositionStatus,
    /// When the row was created.
    pub created_at: Timestamp,
}

impl MaterialComposition {
    /// Create a row in `UnderReview`, validating the numeric fields.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tenant_id: TenantId,
        material_id: impl Into<String>,
        substance_cas: Option<CasNumber>,
        typical_concentration: f64,
        source_type: SourceType,
        confidence_score: f64,
        source_package_id: PackageId,
        source_document_id: Option<DocumentId>,
    ) -> Result<Self, EvidenceError> {
        if !typical_concentration.is_finite() || typical_concentration < 0.0 {
            return Err(EvidenceError::InvalidConcentration {
                value: typical_concentration,
            });
        }
        if !(0.0..=1.0).contains(&confidence_score) {
            return Err(EvidenceError::InvalidConfidence {
                value: confidence_score,
                expected: "0.0-1.0".to_string(),
            });
        }
        Ok(Self {
            id: CompositionId::new(),
            tenant_id,
            material_id: material_id.into(),
            substance_cas,
            typical_concentration,
            unit_basis: UnitBasis::Ppm,
            source_type,
            confidence_score,
            source_document_id,
            source_package_id,
            status: CompositionStatus::UnderReview,
            created_at: Timestamp::now(),
        })
    }

    /// Promote the row to `Current` (UNDER_REVIEW → CURRENT).
    pub fn mark_current(&mut self) -> Result<(), EvidenceError> {
        if self.status != CompositionStatus::UnderReview {
            return Err(EvidenceError::InvalidTransition {
                from: self.status.to_string(),
                to: "CURRENT".to_string(),
            });
        }
        self.status = CompositionStatus::Current;
        Ok(())
    }

    /// Expire the row (UNDER_REVIEW or CURRENT → EXPIRED).
    ///
    /// Used for rejection (rows never become current), supersession (the
    /// prior winner steps down), and validity lapse.
    pub fn expire(&mut self) -> Result<(), EvidenceError> {
        if self.status.is_terminal() {
            return Err(EvidenceError::TerminalState {
                state: self.status.to_string(),
            });
        }
        self.status = CompositionStatus::Expired;
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn make_row(concentration: f64) -> MaterialComposition {
        MaterialComposition::new(
            TenantId::new(),
            "mat-001",
            Some(CasNumber::new("335-67-1").unwrap()),
            concentration,
            SourceType::SupplierDeclaration,
            0.95,
            PackageId::new(),
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_new_row_is_under_review() {
        let row = make_row(50.0);
        assert_eq!(row.status, CompositionStatus::UnderReview);
        assert_eq!(row.unit_basis, UnitBasis::Ppm);
    }

    #[test]
    fn test_mark_current() {
        let mut row = make_row(50.0);
        row.mark_current().unwrap();
        assert_eq!(row.status, CompositionStatus::Current);
        // Promoting twice is invalid.
        assert!(row.mark_current().is_err());
    }

    #[test]
    fn test_expire_from_under_review_and_current() {
        let mut rejected = make_row(50.0);
        rejected.expire().unwrap();
        assert_eq!(rejected.status, CompositionStatus::Expired);

        let mut superseded = make_row(50.0);
        superseded.mark_current().unwrap();
        superseded.expire().unwrap();
        assert_eq!(superseded.status, CompositionStatus::Expired);
    }

    #[test]
    fn test_expired_is_terminal() {
        let mut row = make_row(50.0);
        row.expire().unwrap();
        assert!(row.expire().is_err());
        assert!(row.mark_current().is_err());
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        assert!(MaterialComposition::new(
            TenantId::new(),
            "mat-001",
            None,
            -1.0,
            SourceType::LabTest,
            0.5,
            PackageId::new(),
            None,
        )
        .is_err());
        assert!(MaterialComposition::new(
            TenantId::new(),
            "mat-001",
            None,
            10.0,
            SourceType::LabTest,
            1.5,
            PackageId::new(),
            None,
        )
        .is_err());
        assert!(MaterialComposition::new(
            TenantId::new(),
            "mat-001",
            None,
            f64::NAN,
            SourceType::LabTest,
            0.5,
            PackageId::new(),
            None,
        )
        .is_err());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let row = make_row(25.5);
        let json = serde_json::to_string(&row).unwrap();
        let parsed: MaterialComposition = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, row.id);
        assert_eq!(parsed.status, row.status);
    }
}
