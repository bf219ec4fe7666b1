//! # credpass CLI entry point
//!
//! Parses command-line arguments, opens a session against the configured
//! ledger, and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use credpass_cli::commit::{run_commit, CommitArgs};
use credpass_cli::credential::{
    run_audit, run_issue, run_list, run_revoke, run_status, run_verify, AuditArgs, IssueArgs,
};
use credpass_cli::issuers::{run_issuers, IssuersArgs};
use credpass_cli::proof::{run_disclose, run_verify_proof, DiscloseArgs};
use credpass_cli::session::Session;
use credpass_cli::GlobalOpts;
use credpass_core::CredentialId;

/// Credential commitment and selective-disclosure toolkit.
#[derive(Parser, Debug)]
#[command(name = "credpass", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute a credential commitment.
    Commit(CommitArgs),

    /// Issue a credential (issuer).
    Issue(IssueArgs),

    /// Revoke a credential you issued (issuer).
    Revoke { id: CredentialId },

    /// Generate a selective-disclosure proof (holder).
    Disclose(DiscloseArgs),

    /// Verify a proof bundle file, or `-` for stdin (verifier).
    VerifyProof { file: PathBuf },

    /// Verify a credential by id with full disclosure (verifier).
    Verify { id: CredentialId },

    /// Resolve a credential's status.
    Status { id: CredentialId },

    /// List credentials you hold or issued.
    List,

    /// Check a credential's anchored commitment against its fields.
    Audit(AuditArgs),

    /// Issuer registry operations.
    Issuers(IssuersArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = Session::open(&cli.global).and_then(|session| match &cli.command {
        Commands::Commit(args) => run_commit(args, &session),
        Commands::Issue(args) => run_issue(args, &session),
        Commands::Revoke { id } => run_revoke(*id, &session),
        Commands::Disclose(args) => run_disclose(args, &session),
        Commands::VerifyProof { file } => run_verify_proof(file, &session),
        Commands::Verify { id } => run_verify(*id, &session),
        Commands::Status { id } => run_status(*id, &session),
        Commands::List => run_list(&session),
        Commands::Audit(args) => run_audit(args, &session),
        Commands::Issuers(args) => run_issuers(args, &session),
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}
