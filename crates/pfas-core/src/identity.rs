//! # Domain Identity Newtypes
//!
//! Newtype wrappers for all identifiers in the PFAS stack. These prevent
//! accidental identifier confusion — you cannot pass a `PackageId` where an
//! `AssessmentId` is expected, and you cannot smuggle an unvalidated string
//! into a field that expects a CAS number.
//!
//! ## Invariant
//!
//! `CasNumber` and `JurisdictionId` have validated constructors; the only way
//! to obtain one is through `new()`, which rejects malformed input. Every
//! record keyed by a CAS number is therefore keyed by a *checked* CAS number.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

// ─── CAS Number ──────────────────────────────────────────────────────

/// A CAS Registry Number, the unique key for a chemical substance.
///
/// Format: 2-7 digits, hyphen, 2 digits, hyphen, 1 check digit
/// (e.g. `335-67-1` for PFOA). The check digit is validated on
/// construction: digits excluding the check digit are weighted 1..n from
/// the right, summed, and reduced modulo 10.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CasNumber(String);

impl CasNumber {
    /// Parse and validate a CAS number.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCasNumber`] if the segment structure is
    /// wrong, a segment contains non-digits, or the check digit does not
    /// match.
    pub fn new(raw: &str) -> Result<Self, CoreError> {
        let trimmed = raw.trim();
        let parts: Vec<&str> = trimmed.split('-').collect();
        if parts.len() != 3 {
            return Err(CoreError::InvalidCasNumber {
                value: trimmed.to_string(),
                reason: "expected three hyphen-separated segments".to_string(),
            });
        }
        let (head, mid, check) = (parts[0], parts[1], parts[2]);
        if head.len() < 2 || head.len() > 7 || mid.len() != 2 || check.len() != 1 {
            return Err(CoreError::InvalidCasNumber {
                value: trimmed.to_string(),
                reason: "segment lengths must be 2-7 / 2 / 1".to_string(),
            });
        }
        if !parts.iter().all(|p| p.bytes().all(|b| b.is_ascii_digit())) {
            return Err(CoreError::InvalidCasNumber {
                value: trimmed.to_string(),
                reason: "segments must be numeric".to_string(),
            });
        }

        let digits: Vec<u32> = head
            .chars()
            .chain(mid.chars())
            .filter_map(|c| c.to_digit(10))
            .collect();
        let weighted: u32 = digits
            .iter()
            .rev()
            .enumerate()
            .map(|(i, d)| (i as u32 + 1) * d)
            .sum();
        let expected = weighted % 10;
        let actual = check.chars().next().and_then(|c| c.to_digit(10)).unwrap_or(10);
        if expected != actual {
            return Err(CoreError::InvalidCasNumber {
                value: trimmed.to_string(),
                reason: format!("check digit mismatch: expected {expected}, got {actual}"),
            });
        }

        Ok(Self(trimmed.to_string()))
    }

    /// The CAS number as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CasNumber {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<CasNumber> for String {
    fn from(cas: CasNumber) -> Self {
        cas.0
    }
}

impl std::fmt::Display for CasNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ─── Jurisdiction Identifier ─────────────────────────────────────────

/// Identifier for a regulatory jurisdiction (e.g. `eu-reach`, `us-tsca`,
/// `us-ca-prop65`).
///
/// Validated to be non-empty after trimming. Jurisdiction identifiers are
/// operator-assigned slugs, not UUIDs, so they survive fixture files and
/// cross-system references unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JurisdictionId(String);

impl JurisdictionId {
    /// Create a jurisdiction identifier from a non-empty slug.
    pub fn new(raw: &str) -> Result<Self, CoreError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidIdentifier {
                kind: "jurisdiction".to_string(),
                reason: "must be non-empty".to_string(),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JurisdictionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ─── UUID Newtypes ───────────────────────────────────────────────────

/// Multi-tenant partition key carried on every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantId(pub Uuid);

/// Unique identifier for a verified substance record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubstanceId(pub Uuid);

/// Unique identifier for an evidence package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageId(pub Uuid);

/// Unique identifier for an evidence document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub Uuid);

/// Unique identifier for a material composition row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompositionId(pub Uuid);

/// Unique identifier for a compliance assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssessmentId(pub Uuid);

/// Unique identifier for a regulatory ruleset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RulesetId(pub Uuid);

/// Unique identifier for a single regulatory rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleId(pub Uuid);

macro_rules! impl_uuid_id {
    ($ty:ident, $prefix:literal) => {
        impl $ty {
            /// Generate a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Access the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $ty {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }
    };
}

impl_uuid_id!(TenantId, "tenant");
impl_uuid_id!(SubstanceId, "substance");
impl_uuid_id!(PackageId, "package");
impl_uuid_id!(DocumentId, "document");
impl_uuid_id!(CompositionId, "composition");
impl_uuid_id!(AssessmentId, "assessment");
impl_uuid_id!(RulesetId, "ruleset");
impl_uuid_id!(RuleId, "rule");

// ─── Assessed Object Reference ───────────────────────────────────────

/// The kind of business entity a compliance assessment attaches to.
///
/// Dispatch on object kind goes through the orchestrator's status-target
/// registry, never through string comparisons scattered across the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// A finished article (assembled product component).
    Article,
    /// A raw or intermediate material.
    Material,
    /// A supplier organization.
    Supplier,
    /// A sellable product.
    Product,
    /// A free-text custom item submitted through the scan surface.
    CustomItem,
}

impl ObjectKind {
    /// Canonical snake_case tag, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Article => "article",
            Self::Material => "material",
            Self::Supplier => "supplier",
            Self::Product => "product",
            Self::CustomItem => "custom_item",
        }
    }
}

impl std::str::FromStr for ObjectKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "article" => Ok(Self::Article),
            "material" => Ok(Self::Material),
            "supplier" => Ok(Self::Supplier),
            "product" => Ok(Self::Product),
            "custom_item" => Ok(Self::CustomItem),
            other => Err(CoreError::InvalidIdentifier {
                kind: "object_kind".to_string(),
                reason: format!("unknown object kind {other:?}"),
            }),
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to the business entity being assessed: kind plus the entity's
/// own identifier in the hosted store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    /// The kind of entity.
    pub kind: ObjectKind,
    /// The entity's identifier in the owning store.
    pub object_id: String,
}

impl ObjectRef {
    /// Build a reference, rejecting empty object identifiers.
    pub fn new(kind: ObjectKind, object_id: impl Into<String>) -> Result<Self, CoreError> {
        let object_id = object_id.into();
        if object_id.trim().is_empty() {
            return Err(CoreError::InvalidIdentifier {
                kind: "object_id".to_string(),
                reason: "must be non-empty".to_string(),
            });
        }
        Ok(Self { kind, object_id })
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.object_id)
    }
}

// ─── Request Context ─────────────────────────────────────────────────

/// Explicit per-call context: which tenant the call operates on and who
/// initiated it.
///
/// Every pipeline entry point takes a `RequestContext` — there is no
/// ambient "current user" lookup anywhere in the stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// The tenant partition all reads and writes are scoped to.
    pub tenant_id: TenantId,
    /// The acting user or system principal (e.g. `user:fatima`,
    /// `system:batch-scanner`).
    pub actor: String,
}

impl RequestContext {
    /// Build a context, rejecting empty actors.
    pub fn new(tenant_id: TenantId, actor: impl Into<String>) -> Result<Self, CoreError> {
        let actor = actor.into();
        if actor.trim().is_empty() {
            return Err(CoreError::InvalidIdentifier {
                kind: "actor".to_string(),
                reason: "must be non-empty".to_string(),
            });
        }
        Ok(Self { tenant_id, actor })
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
