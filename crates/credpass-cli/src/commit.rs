//! # Commit Subcommand
//!
//! Computes the commitment for a set of credential fields. Touches no
//! ledger state; useful to preview an issuance or to reproduce a value
//! anchored by the legacy delimited scheme.

use anyhow::Result;
use clap::Args;

use credpass_core::{Address, CredentialFields, HashAlgorithm};
use credpass_engine::CommitmentScheme;

use crate::session::Session;

/// Arguments for `credpass commit`.
#[derive(Args, Debug)]
pub struct CommitArgs {
    /// Credential type, e.g. "Bachelor of Science".
    #[arg(long = "type")]
    pub credential_type: String,
    /// Issuing institution.
    #[arg(long)]
    pub institution: String,
    /// Issue date, seconds since epoch.
    #[arg(long)]
    pub issue_date: u64,
    #[arg(long, value_parser = Address::parse)]
    pub holder: Address,
    #[arg(long, value_parser = Address::parse)]
    pub issuer: Address,
    /// Use the legacy pipe-delimited Keccak-256 scheme.
    #[arg(long, conflicts_with = "algorithm")]
    pub legacy: bool,
    /// Hash for the framed scheme (keccak256 or sha256).
    #[arg(long)]
    pub algorithm: Option<HashAlgorithm>,
}

/// Execute `credpass commit`.
pub fn run_commit(args: &CommitArgs, session: &Session) -> Result<u8> {
    let fields = CredentialFields {
        credential_type: args.credential_type.clone(),
        institution: args.institution.clone(),
        issue_date: args.issue_date,
        holder: args.holder,
        issuer: args.issuer,
    };
    let scheme = if args.legacy {
        CommitmentScheme::LegacyDelimited
    } else {
        CommitmentScheme::Framed(
            args.algorithm
                .unwrap_or(session.service().config().algorithm),
        )
    };

    let commitment = session
        .service()
        .compute_commitment(session.principal(), &fields, scheme)?;
    println!("{commitment}");
    Ok(0)
}
