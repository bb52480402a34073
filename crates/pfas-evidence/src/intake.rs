//! # Evidence Intake
//!
//! Three intake paths converge on the same package + document +
//! composition records, differing only in quality grade and entry state:
//!
//! - **Manual supplier declaration** — grade B, always enters at
//!   `submitted`; a human decision is mandatory.
//! - **Laboratory import** — grade A, assumed ground truth;
//!   auto-approves above [`LAB_AUTO_APPROVE_CONFIDENCE`], otherwise
//!   enters at `submitted`.
//! - **AI extraction from an uploaded document** — grade C; extraction
//!   confidence above [`EXTRACTION_SUBMIT_GATE`] enters at `submitted`,
//!   anything lower stays in `draft` so a human completes and confirms
//!   it first. Low confidence is a routing decision, not a failure.
//!
//! Anything else goes in as grade D and starts in `draft`.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use pfas_core::{
    CasNumber, ClaimStatus, IntentionallyAdded, ObjectRef, QualityGrade, RequestContext,
    SourceType, Timestamp,
};
use pfas_orchestrator::AssessmentOutcome;
use pfas_state::{
    DocType, EvidenceDocument, EvidencePackage, ExtractionMetadata, MaterialComposition,
    ReviewState, Signatory,
};
use pfas_store::EntityStore;

use crate::error::PipelineError;
use crate::review::ReviewService;

/// Extraction confidence (0.0-1.0) above which an AI-extracted package
/// enters review directly instead of staying in draft.
pub const EXTRACTION_SUBMIT_GATE: f64 = 0.8;

/// Package confidence (0-100) at or above which a laboratory result is
/// approved without a human decision.
pub const LAB_AUTO_APPROVE_CONFIDENCE: f64 = 90.0;

/// Package confidence assigned to manual supplier declarations.
const SUPPLIER_PACKAGE_CONFIDENCE: f64 = 80.0;

/// Row confidence for supplier-declared compositions.
const SUPPLIER_ROW_CONFIDENCE: f64 = 0.8;

/// Row confidence for laboratory-measured compositions.
const LAB_ROW_CONFIDENCE: f64 = 0.99;

/// One declared substance occurrence in an intake form.
#[derive(Debug, Clone)]
pub struct CompositionEntry {
    /// The substance's CAS number, when the declarant identified it.
    pub substance_cas: Option<CasNumber>,
    /// Declared typical concentration in ppm.
    pub concentration_ppm: f64,
}

/// A declaration submitted through a form or import.
#[derive(Debug, Clone)]
pub struct DeclarationForm {
    /// The object the declaration is about.
    pub object: ObjectRef,
    /// The presence claim.
    pub claim_status: ClaimStatus,
    /// Whether the substance was intentionally added.
    pub intentionally_added: IntentionallyAdded,
    /// Human-readable threshold the declaration was made against.
    pub threshold_definition: Option<String>,
    /// Numeric threshold in ppm, when stated.
    pub threshold_numeric_ppm: Option<f64>,
    /// Validity window start.
    pub valid_from: Option<Timestamp>,
    /// Validity window end.
    pub valid_to: Option<Timestamp>,
    /// Who signed the declaration.
    pub signatory: Option<Signatory>,
    /// Declared substance occurrences.
    pub compositions: Vec<CompositionEntry>,
}

impl DeclarationForm {
    /// A minimal form asserting a claim with some composition entries.
    pub fn new(object: ObjectRef, claim_status: ClaimStatus) -> Self {
        Self {
            object,
            claim_status,
            intentionally_added: IntentionallyAdded::Unknown,
            threshold_definition: None,
            threshold_numeric_ppm: None,
            valid_from: None,
            valid_to: None,
            signatory: None,
            compositions: Vec::new(),
        }
    }
}

/// An uploaded evidence file.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Original file name.
    pub file_name: String,
    /// Raw file bytes.
    pub bytes: Vec<u8>,
    /// Document kind.
    pub doc_type: DocType,
}

/// The extraction collaborator's structured output for one document.
#[derive(Debug, Clone)]
pub struct ExtractedDeclaration {
    /// The extracted presence claim.
    pub claim_status: ClaimStatus,
    /// Extracted substance occurrences.
    pub compositions: Vec<CompositionEntry>,
    /// Extraction confidence, 0.0-1.0.
    pub confidence_score: f64,
    /// Names of the fields the extractor populated.
    pub extracted_fields: Vec<String>,
    /// Field name → page number citation.
    pub page_citations: BTreeMap<String, u32>,
    /// Version tag of the extraction prompt.
    pub prompt_version: String,
    /// Version tag of the extraction model.
    pub model_version: String,
}

/// The document extraction collaborator. Its output is never trusted
/// directly; it only pre-populates a package that still goes through
/// grading and review.
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    /// Extract a structured declaration from a document.
    async fn extract(&self, file: &UploadedFile) -> anyhow::Result<ExtractedDeclaration>;
}

/// The intake service.
pub struct IntakeService<S> {
    store: Arc<S>,
    review: Arc<ReviewService<S>>,
    extractor: Arc<dyn DocumentExtractor>,
}

impl<S: EntityStore> IntakeService<S> {
    pub fn new(
        store: Arc<S>,
        review: Arc<ReviewService<S>>,
        extractor: Arc<dyn DocumentExtractor>,
    ) -> Self {
        Self {
            store,
            review,
            extractor,
        }
    }

    /// Intake a manual supplier declaration (grade B, enters `submitted`).
    pub async fn submit_declaration(
        &self,
        ctx: &RequestContext,
        form: DeclarationForm,
        file: Option<UploadedFile>,
    ) -> Result<EvidencePackage, PipelineError> {
        let package = self
            .create_package(
                ctx,
                &form,
                QualityGrade::B,
                SUPPLIER_PACKAGE_CONFIDENCE,
                ReviewState::Submitted,
            )
            .await?;
        let document_id = match file {
            Some(file) => {
                let doc = EvidenceDocument::manual(
                    ctx.tenant_id,
                    package.id,
                    file.file_name,
                    &file.bytes,
                    file.doc_type,
                );
                let id = doc.id;
                self.store.insert_document(doc).await?;
                Some(id)
            }
            None => None,
        };
        self.create_compositions(
            ctx,
            &package,
            &form.compositions,
            SourceType::SupplierDeclaration,
            SUPPLIER_ROW_CONFIDENCE,
            document_id,
        )
        .await?;
        tracing::info!(package = %package.id, object = %package.object, "supplier declaration submitted");
        Ok(package)
    }

    /// Import a laboratory result (grade A).
    ///
    /// At or above [`LAB_AUTO_APPROVE_CONFIDENCE`] the package is
    /// approved on intake and the object re-assessed immediately; below
    /// it, a human still decides. Returns the assessment outcome when
    /// auto-approval ran.
    pub async fn import_lab_result(
        &self,
        ctx: &RequestContext,
        form: DeclarationForm,
        confidence_score: f64,
        file: UploadedFile,
    ) -> Result<(EvidencePackage, Option<AssessmentOutcome>), PipelineError> {
        let auto_approve = confidence_score >= LAB_AUTO_APPROVE_CONFIDENCE;
        let entry_state = if auto_approve {
            ReviewState::Approved
        } else {
            ReviewState::Submitted
        };
        let package = self
            .create_package(ctx, &form, QualityGrade::A, confidence_score, entry_state)
            .await?;
        let doc = EvidenceDocument::manual(
            ctx.tenant_id,
            package.id,
            file.file_name,
            &file.bytes,
            file.doc_type,
        );
        let document_id = doc.id;
        self.store.insert_document(doc).await?;
        self.create_compositions(
            ctx,
            &package,
            &form.compositions,
            SourceType::LabTest,
            LAB_ROW_CONFIDENCE,
            Some(document_id),
        )
        .await?;

        let outcome = if auto_approve {
            Some(self.review.finalize_approval(ctx, &package).await?)
        } else {
            None
        };
        tracing::info!(
            package = %package.id,
            auto_approved = auto_approve,
            "laboratory result imported"
        );
        Ok((package, outcome))
    }

    /// Intake a document through the extraction collaborator (grade C).
    ///
    /// Extraction confidence routes the entry state; it never fails the
    /// submission.
    pub async fn intake_document(
        &self,
        ctx: &RequestContext,
        object: ObjectRef,
        file: UploadedFile,
    ) -> Result<EvidencePackage, PipelineError> {
        let extracted = self
            .extractor
            .extract(&file)
            .await
            .map_err(|e| PipelineError::Extraction(e.to_string()))?;

        let entry_state = if extracted.confidence_score > EXTRACTION_SUBMIT_GATE {
            ReviewState::Submitted
        } else {
            ReviewState::Draft
        };
        let form = DeclarationForm {
            compositions: extracted.compositions.clone(),
            ..DeclarationForm::new(object, extracted.claim_status)
        };
        let package = self
            .create_package(
                ctx,
                &form,
                QualityGrade::C,
                extracted.confidence_score * 100.0,
                entry_state,
            )
            .await?;

        let doc = EvidenceDocument::extracted(
            ctx.tenant_id,
            package.id,
            file.file_name.clone(),
            &file.bytes,
            file.doc_type,
            &extracted.extracted_fields,
            extracted.page_citations,
            ExtractionMetadata {
                prompt_version: extracted.prompt_version,
                model_version: extracted.model_version,
                confidence_score: extracted.confidence_score,
            },
        )?;
        let document_id = doc.id;
        self.store.insert_document(doc).await?;
        self.create_compositions(
            ctx,
            &package,
            &extracted.compositions,
            SourceType::AiInferred,
            extracted.confidence_score,
            Some(document_id),
        )
        .await?;
        tracing::info!(
            package = %package.id,
            entry_state = %package.review_status,
            confidence = extracted.confidence_score,
            "document extracted into evidence package"
        );
        Ok(package)
    }

    /// Intake from an unverified source (grade D, stays in `draft`).
    pub async fn submit_unverified(
        &self,
        ctx: &RequestContext,
        form: DeclarationForm,
        confidence_score: f64,
    ) -> Result<EvidencePackage, PipelineError> {
        let package = self
            .create_package(ctx, &form, QualityGrade::D, confidence_score, ReviewState::Draft)
            .await?;
        self.create_compositions(
            ctx,
            &package,
            &form.compositions,
            SourceType::SupplierDeclaration,
            SUPPLIER_ROW_CONFIDENCE,
            None,
        )
        .await?;
        Ok(package)
    }

    async fn create_package(
        &self,
        ctx: &RequestContext,
        form: &DeclarationForm,
        grade: QualityGrade,
        confidence_score: f64,
        entry_state: ReviewState,
    ) -> Result<EvidencePackage, PipelineError> {
        let mut package = EvidencePackage::new(
            ctx.tenant_id,
            form.object.clone(),
            form.claim_status,
            grade,
            confidence_score,
            entry_state,
            ctx.actor.clone(),
        )?;
        package.intentionally_added = form.intentionally_added;
        package.threshold_definition = form.threshold_definition.clone();
        package.threshold_numeric_ppm = form.threshold_numeric_ppm;
        package.valid_from = form.valid_from;
        package.valid_to = form.valid_to;
        package.signatory = form.signatory.clone();
        self.store.insert_package(package.clone()).await?;
        Ok(package)
    }

    async fn create_compositions(
        &self,
        ctx: &RequestContext,
        package: &EvidencePackage,
        entries: &[CompositionEntry],
        source_type: SourceType,
        confidence: f64,
        document_id: Option<pfas_core::DocumentId>,
    ) -> Result<(), PipelineError> {
        for entry in entries {
            let row = MaterialComposition::new(
                ctx.tenant_id,
                package.object.object_id.clone(),
                entry.substance_cas.clone(),
                entry.concentration_ppm,
                source_type,
                confidence,
                package.id,
                document_id,
            )?;
            self.store.insert_composition(row).await?;
        }
        Ok(())
    }
}
