//! # Evidence Documents
//!
//! A document belongs to exactly one evidence package. The raw file bytes
//! are fingerprinted with SHA-256 at intake so later tampering is
//! detectable, and AI-extracted documents carry a page map tying every
//! extracted field to the page it was read from.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use pfas_core::{sha256_digest, ContentDigest, DocumentId, PackageId, TenantId, Timestamp};

use crate::error::EvidenceError;

/// The kind of document supplied as evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocType {
    /// Supplier declaration of conformity.
    SupplierDeclaration,
    /// Laboratory analysis report.
    LabReport,
    /// Safety data sheet.
    SafetyDataSheet,
    /// Anything else.
    Other,
}

/// Metadata about the AI extraction that produced a document's fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    /// Version tag of the extraction prompt.
    pub prompt_version: String,
    /// Version tag of the extraction model.
    pub model_version: String,
    /// Extraction confidence, 0.0-1.0.
    pub confidence_score: f64,
}

/// An uploaded evidence file with tamper-evidence and audit citations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceDocument {
    /// Unique identifier.
    pub id: DocumentId,
    /// Tenant partition key.
    pub tenant_id: TenantId,
    /// The owning package.
    pub package_id: PackageId,
    /// Original file name.
    pub file_name: String,
    /// SHA-256 of the raw file bytes.
    pub file_hash_sha256: ContentDigest,
    /// Document kind.
    pub doc_type: DocType,
    /// Field name → page number citation for audit.
    #[serde(default)]
    pub page_map: BTreeMap<String, u32>,
    /// Present iff the document's fields were AI-extracted.
    pub extraction_metadata: Option<ExtractionMetadata>,
    /// When the document was ingested.
    pub created_at: Timestamp,
}

impl EvidenceDocument {
    /// Ingest a manually supplied document (no extraction metadata, page
    /// map optional).
    pub fn manual(
        tenant_id: TenantId,
        package_id: PackageId,
        file_name: impl Into<String>,
        file_bytes: &[u8],
        doc_type: DocType,
    ) -> Self {
        Self {
            id: DocumentId::new(),
            tenant_id,
            package_id,
            file_name: file_name.into(),
            file_hash_sha256: sha256_digest(file_bytes),
            doc_type,
            page_map: BTreeMap::new(),
            extraction_metadata: None,
            created_at: Timestamp::now(),
        }
    }

    /// Ingest an AI-extracted document.
    ///
    /// Every extracted field must appear in the page map — an extracted
    /// fact without a page citation cannot be audited and is rejected
    /// here, at intake, rather than discovered during a later audit.
    pub fn extracted(
        tenant_id: TenantId,
        package_id: PackageId,
        file_name: impl Into<String>,
        file_bytes: &[u8],
        doc_type: DocType,
        extracted_fields: &[String],
        page_map: BTreeMap<String, u32>,
        metadata: ExtractionMetadata,
    ) -> Result<Self, EvidenceError> {
        if !(0.0..=1.0).contains(&metadata.confidence_score) {
            return Err(EvidenceError::InvalidConfidence {
                value: metadata.confidence_score,
                expected: "0.0-1.0".to_string(),
            });
        }
        for field in extracted_fields {
            if !page_map.contains_key(field) {
                return Err(EvidenceError::MissingPageCitation {
                    field: field.clone(),
                });
            }
        }
        Ok(Self {
            id: DocumentId::new(),
            tenant_id,
            package_id,
            file_name: file_name.into(),
            file_hash_sha256: sha256_digest(file_bytes),
            doc_type,
            page_map,
            extraction_metadata: Some(metadata),
            created_at: Timestamp::now(),
        })
    }

    /// Re-hash candidate bytes against the stored fingerprint.
    pub fn matches_bytes(&self, file_bytes: &[u8]) -> bool {
        sha256_digest(file_bytes) == self.file_hash_sha256
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(confidence: f64) -> ExtractionMetadata {
        ExtractionMetadata {
            prompt_version: "pfas-decl-v3".to_string(),
            model_version: "extract-2026-01".to_string(),
            confidence_score: confidence,
        }
    }

    #[test]
    fn test_manual_document_hashes_bytes() {
        let doc = EvidenceDocument::manual(
            TenantId::new(),
            PackageId::new(),
            "decl.pdf",
            b"file contents",
            DocType::SupplierDeclaration,
        );
        assert!(doc.matches_bytes(b"file contents"));
        assert!(!doc.matches_bytes(b"tampered contents"));
        assert!(doc.extraction_metadata.is_none());
    }

    #[test]
    fn test_extracted_requires_page_citations() {
        let fields = vec!["claim_status".to_string(), "threshold_ppm".to_string()];
        let mut pages = BTreeMap::new();
        pages.insert("claim_status".to_string(), 1);

        let err = EvidenceDocument::extracted(
            TenantId::new(),
            PackageId::new(),
            "decl.pdf",
            b"pdf bytes",
            DocType::SupplierDeclaration,
            &fields,
            pages.clone(),
            metadata(0.92),
        )
        .unwrap_err();
        match err {
            EvidenceError::MissingPageCitation { field } => {
                assert_eq!(field, "threshold_ppm")
            }
            other => panic!("expected MissingPageCitation, got {other:?}"),
        }

        pages.insert("threshold_ppm".to_string(), 3);
        let doc = EvidenceDocument::extracted(
            TenantId::new(),
            PackageId::new(),
            "decl.pdf",
            b"pdf bytes",
            DocType::SupplierDeclaration,
            &fields,
            pages,
            metadata(0.92),
        )
        .unwrap();
        assert_eq!(doc.page_map.len(), 2);
    }

    #[test]
    fn test_extracted_rejects_bad_confidence() {
        assert!(EvidenceDocument::extracted(
            TenantId::new(),
            PackageId::new(),
            "decl.pdf",
            b"pdf bytes",
            DocType::SupplierDeclaration,
            &[],
            BTreeMap::new(),
            metadata(1.2),
        )
        .is_err());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let doc = EvidenceDocument::manual(
            TenantId::new(),
            PackageId::new(),
            "report.pdf",
            b"lab data",
            DocType::LabReport,
        );
        let json = serde_json::to_string(&doc).unwrap();
        let parsed: EvidenceDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.file_hash_sha256, doc.file_hash_sha256);
    }
}
