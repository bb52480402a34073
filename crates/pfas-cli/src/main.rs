//! # pfas CLI Entry Point
//!
//! Assembles subcommands and dispatches to handler modules.

use clap::Parser;

/// PFAS compliance toolchain.
///
/// Verifies chemical substances, runs compliance scans, and drives the
/// evidence lifecycle against an in-memory fixture environment.
#[derive(Parser, Debug)]
#[command(name = "pfas", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Verify a substance identity across providers.
    Verify(pfas_cli::verify::VerifyArgs),
    /// Assess one or more objects for PFAS compliance.
    Scan(pfas_cli::scan::ScanArgs),
    /// Walk a declaration through intake, review, and re-assessment.
    Evidence(pfas_cli::evidence::EvidenceArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Verify(args) => pfas_cli::verify::run(args).await,
        Commands::Scan(args) => pfas_cli::scan::run(args).await,
        Commands::Evidence(args) => pfas_cli::evidence::run(args).await,
    }
}
