//! # Evidence Subcommand
//!
//! Walks one declaration through the full lifecycle against the fixture
//! environment: intake, review, approval, rollover, and the re-assessment
//! the approval triggers. Each stage is printed as it happens.

use std::sync::Arc;

use clap::{Args, ValueEnum};

use pfas_core::{CasNumber, ClaimStatus, ObjectKind, ObjectRef, RequestContext, TenantId};
use pfas_evidence::{
    CompositionEntry, DeclarationForm, IntakeService, ReviewService, UploadedFile,
};
use pfas_orchestrator::{LogNotifier, Orchestrator, StatusTargetRegistry};
use pfas_state::DocType;
use pfas_store::MemoryStore;
use pfas_verify::VerificationService;

use crate::fixtures::{
    self, FixtureExtractor, FixtureIdentityProvider, FixtureRegulatoryProvider,
};

/// Which intake channel the demo declaration enters through.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum IntakeMode {
    /// Manual supplier declaration (grade B, reviewed by a second person).
    Manual,
    /// Laboratory result import (grade A, auto-approved at high confidence).
    Lab,
    /// Document upload through extraction (grade C).
    Upload,
}

/// Arguments for the evidence subcommand.
#[derive(Args, Debug)]
pub struct EvidenceArgs {
    /// Material the declaration is about.
    #[arg(long, default_value = "material-001")]
    pub object_id: String,

    /// CAS number of the declared substance.
    #[arg(long, default_value = "335-67-1")]
    pub cas: String,

    /// Declared concentration in ppm.
    #[arg(long, default_value_t = 40.0)]
    pub ppm: f64,

    /// Intake channel to demonstrate.
    #[arg(long, value_enum, default_value = "manual")]
    pub mode: IntakeMode,
}

pub async fn run(args: EvidenceArgs) -> anyhow::Result<()> {
    let cas = CasNumber::new(&args.cas)?;
    let object = ObjectRef::new(ObjectKind::Material, args.object_id.clone())?;
    let tenant = TenantId::new();
    let supplier = RequestContext::new(tenant, "user:supplier")?;
    let reviewer = RequestContext::new(tenant, "user:reviewer")?;

    let store = Arc::new(MemoryStore::new());
    fixtures::seed_regulatory_data(&store, tenant).await?;

    let verifier = VerificationService::new(
        store.clone(),
        FixtureIdentityProvider::pubchem(),
        FixtureIdentityProvider::comptox(),
        Arc::new(FixtureRegulatoryProvider),
    );
    let substance = verifier.verify(&supplier, &cas).await?;
    println!(
        "verified {} ({}) score {}",
        substance.cas_number, substance.name, substance.verification_metadata.verification_score,
    );

    let orchestrator = Arc::new(Orchestrator::new(
        store.clone(),
        StatusTargetRegistry::new(),
        Arc::new(LogNotifier),
    ));
    let review = Arc::new(ReviewService::new(store.clone(), orchestrator));
    let intake = IntakeService::new(store.clone(), review.clone(), Arc::new(FixtureExtractor));

    let form = DeclarationForm {
        compositions: vec![CompositionEntry {
            substance_cas: Some(cas),
            concentration_ppm: args.ppm,
        }],
        ..DeclarationForm::new(object, ClaimStatus::Present)
    };
    let file = UploadedFile {
        file_name: "declaration.pdf".to_string(),
        bytes: b"fixture declaration".to_vec(),
        doc_type: DocType::SupplierDeclaration,
    };

    let outcome = match args.mode {
        IntakeMode::Manual => {
            let package = intake
                .submit_declaration(&supplier, form, Some(file))
                .await?;
            println!(
                "package {} grade {} entered {}",
                package.id, package.quality_grade, package.review_status
            );
            review
                .start_review(&reviewer, package.id, "routine review")
                .await?;
            println!("package {} under review by user:reviewer", package.id);
            let (approved, outcome) = review
                .approve(&reviewer, package.id, "declaration matches records")
                .await?;
            println!("package {} {}", approved.id, approved.review_status);
            outcome
        }
        IntakeMode::Lab => {
            let (package, outcome) = intake
                .import_lab_result(&supplier, form, 95.0, file)
                .await?;
            println!(
                "package {} grade {} entered {}",
                package.id, package.quality_grade, package.review_status
            );
            match outcome {
                Some(outcome) => outcome,
                None => anyhow::bail!("laboratory import below the auto-approval gate"),
            }
        }
        IntakeMode::Upload => {
            let package = intake
                .intake_document(&supplier, form.object.clone(), file)
                .await?;
            println!(
                "package {} grade {} entered {} (extraction confidence {:.2})",
                package.id,
                package.quality_grade,
                package.review_status,
                package.confidence_score / 100.0,
            );
            review
                .start_review(&reviewer, package.id, "extraction check")
                .await?;
            let (approved, outcome) = review
                .approve(&reviewer, package.id, "extraction verified against source")
                .await?;
            println!("package {} {}", approved.id, approved.review_status);
            outcome
        }
    };

    println!(
        "assessment {}: {}",
        outcome.assessment.id, outcome.assessment.status
    );
    println!("{}", outcome.assessment.reasoning);
    println!(
        "created: {} actions, {} notifications, {} alerts{}",
        outcome.report.actions_created,
        outcome.report.notifications_created,
        outcome.report.alerts_created,
        if outcome.report.scenario_created {
            ", 1 substitution scenario"
        } else {
            ""
        },
    );
    Ok(())
}
