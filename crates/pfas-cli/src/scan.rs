//! # Scan Subcommand
//!
//! Linked-entity and custom-item scan modes: runs the orchestrator
//! pipeline for one or more objects against the fixture environment and
//! prints the verdicts. Multiple object ids run as a batch scan.

use std::str::FromStr;
use std::sync::Arc;

use clap::Args;

use pfas_core::{
    CasNumber, ObjectKind, ObjectRef, PackageId, RequestContext, SourceType, TenantId,
};
use pfas_orchestrator::{AssessmentInput, LogNotifier, Orchestrator, StatusTargetRegistry};
use pfas_state::MaterialComposition;
use pfas_store::{EntityStore, MemoryStore};
use pfas_verify::VerificationService;

use crate::fixtures::{self, FixtureIdentityProvider, FixtureRegulatoryProvider};

/// Arguments for the scan subcommand.
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Kind of object to scan (article, material, supplier, product,
    /// custom_item).
    #[arg(long, default_value = "article")]
    pub object_type: String,

    /// Object ids to scan. More than one runs as a batch.
    #[arg(long, required = true, num_args = 1..)]
    pub object_id: Vec<String>,

    /// CAS number of a substance present in the scanned objects.
    #[arg(long, default_value = "335-67-1")]
    pub cas: String,

    /// Declared concentration in ppm for the seeded evidence.
    #[arg(long, default_value_t = 50.0)]
    pub ppm: f64,
}

pub async fn run(args: ScanArgs) -> anyhow::Result<()> {
    let kind = ObjectKind::from_str(&args.object_type)?;
    let cas = CasNumber::new(&args.cas)?;
    let ctx = RequestContext::new(TenantId::new(), "user:cli")?;

    let store = Arc::new(MemoryStore::new());
    fixtures::seed_regulatory_data(&store, ctx.tenant_id).await?;

    // Verify the substance first so SVHC notification duties can attach.
    let verifier = VerificationService::new(
        store.clone(),
        FixtureIdentityProvider::pubchem(),
        FixtureIdentityProvider::comptox(),
        Arc::new(FixtureRegulatoryProvider),
    );
    verifier.verify(&ctx, &cas).await?;

    // Seed current evidence for each scanned object.
    for object_id in &args.object_id {
        let mut row = MaterialComposition::new(
            ctx.tenant_id,
            object_id.clone(),
            Some(cas.clone()),
            args.ppm,
            SourceType::SupplierDeclaration,
            0.8,
            PackageId::new(),
            None,
        )?;
        row.mark_current()?;
        store.insert_composition(row).await?;
    }

    let orchestrator = Orchestrator::new(
        store.clone(),
        StatusTargetRegistry::new(),
        Arc::new(LogNotifier),
    );

    if args.object_id.len() == 1 {
        let object = ObjectRef::new(kind, args.object_id[0].clone())?;
        let outcome = orchestrator
            .create_or_update_assessment(&ctx, AssessmentInput::for_object(object))
            .await?;
        println!("{}", serde_json::to_string_pretty(&outcome.assessment)?);
        println!(
            "jurisdictions: {} evaluated, {} skipped; created: {} actions, {} notifications, {} alerts{}",
            outcome.report.jurisdictions_evaluated.len(),
            outcome.report.jurisdictions_skipped.len(),
            outcome.report.actions_created,
            outcome.report.notifications_created,
            outcome.report.alerts_created,
            if outcome.report.scenario_created {
                ", 1 substitution scenario"
            } else {
                ""
            },
        );
    } else {
        let objects = args
            .object_id
            .iter()
            .map(|id| ObjectRef::new(kind, id.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        let report = orchestrator.batch_scan(&ctx, &objects).await;
        println!(
            "batch scan: {} processed, {} compliant, {} non-compliant, {} errors",
            report.processed,
            report.compliant,
            report.non_compliant,
            report.errors.len(),
        );
        for (object, error) in &report.errors {
            eprintln!("  {object}: {error}");
        }
    }
    Ok(())
}
