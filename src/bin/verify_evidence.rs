//! Evidence Verification CLI
//!
//! Re-verifies every record of a JSONL evidence export and reports the
//! ones whose integrity hash no longer matches.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::Path;
use tracing::{error, info};

use eduzen_evidence::evidence::{load_records_from_file, EvidenceHasher, EvidenceVerifier};
use eduzen_evidence::secret::get_secret;

#[derive(Parser)]
#[command(name = "verify-evidence")]
#[command(about = "Verify EDUZEN signature evidence integrity")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the JSONL evidence log
    #[arg(short, long, value_name = "PATH")]
    log_path: String,

    /// Accept records sealed with the legacy concatenation scheme
    #[arg(long)]
    accept_legacy: bool,

    /// Print every record's result
    #[arg(short, long)]
    verbose: bool,

    /// Suppress output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        tracing::Level::ERROR
    } else if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    if let Err(e) = run(&cli) {
        error!("Evidence verification failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

fn run(cli: &Cli) -> Result<()> {
    info!("Verifying evidence log: {}", cli.log_path);

    if !Path::new(&cli.log_path).exists() {
        return Err(anyhow!("Evidence log not found: {}", cli.log_path));
    }

    let verifier =
        EvidenceVerifier::new(EvidenceHasher::new(get_secret()?)).accept_legacy(cli.accept_legacy);
    let records = load_records_from_file(&cli.log_path)?;
    let report = verifier.audit_records(&records);

    if cli.verbose {
        for (record, result) in records.iter().zip(&report.results) {
            println!("{}  [{}]", result.summary(), record.summary());
        }
    } else if !cli.quiet {
        for &index in &report.failed {
            println!("{}", report.results[index].summary());
        }
    }

    if !cli.quiet {
        println!("{}", report.summary());
    }

    if !report.is_clean() {
        return Err(anyhow!(
            "{} record(s) failed verification",
            report.failed.len()
        ));
    }

    Ok(())
}
