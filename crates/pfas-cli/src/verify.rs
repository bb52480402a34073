//! # Verify Subcommand
//!
//! CAS-lookup entry mode: resolves a CAS number through the verification
//! service and prints the reconciled substance record.

use std::sync::Arc;

use clap::Args;

use pfas_core::{CasNumber, RequestContext, TenantId};
use pfas_store::MemoryStore;
use pfas_verify::VerificationService;

use crate::fixtures::{FixtureIdentityProvider, FixtureRegulatoryProvider};

/// Arguments for the verify subcommand.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// CAS registry number to verify (e.g. 335-67-1).
    #[arg(long)]
    pub cas: String,
}

pub async fn run(args: VerifyArgs) -> anyhow::Result<()> {
    let cas = CasNumber::new(&args.cas)?;
    let store = Arc::new(MemoryStore::new());
    let service = VerificationService::new(
        store,
        FixtureIdentityProvider::pubchem(),
        FixtureIdentityProvider::comptox(),
        Arc::new(FixtureRegulatoryProvider),
    );
    let ctx = RequestContext::new(TenantId::new(), "user:cli")?;

    let substance = service.verify(&ctx, &cas).await?;
    println!("{}", serde_json::to_string_pretty(&substance)?);
    Ok(())
}
