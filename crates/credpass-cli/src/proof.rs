//! # Proof Subcommands
//!
//! `disclose` builds a selective-disclosure bundle for one of the acting
//! holder's credentials; `verify-proof` checks a bundle file against the
//! ledger. Bundles are the same JSON documents the HTTP service accepts.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use credpass_core::CredentialId;
use credpass_engine::{DisclosurePolicy, ProofBundle};

use crate::credential::report;
use crate::session::Session;

/// A field the holder may choose to reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Field {
    Type,
    Institution,
    IssueDate,
    ExpiryDate,
    Holder,
    Issuer,
}

/// Arguments for `credpass disclose`.
#[derive(Args, Debug)]
pub struct DiscloseArgs {
    pub id: CredentialId,
    /// Fields to reveal. Defaults to the credential type only.
    #[arg(long, value_enum, value_delimiter = ',')]
    pub show: Vec<Field>,
    /// Write the bundle here instead of stdout.
    #[arg(long, short)]
    pub out: Option<PathBuf>,
}

/// Build a policy from the selected fields.
pub fn policy_from(fields: &[Field]) -> DisclosurePolicy {
    if fields.is_empty() {
        return DisclosurePolicy::default();
    }
    let mut policy = DisclosurePolicy::none();
    for field in fields {
        match field {
            Field::Type => policy.show_type = true,
            Field::Institution => policy.show_institution = true,
            Field::IssueDate => policy.show_issue_date = true,
            Field::ExpiryDate => policy.show_expiry_date = true,
            Field::Holder => policy.show_holder = true,
            Field::Issuer => policy.show_issuer = true,
        }
    }
    policy
}

/// Execute `credpass disclose`.
pub fn run_disclose(args: &DiscloseArgs, session: &Session) -> Result<u8> {
    let policy = policy_from(&args.show);
    let bundle = session
        .block_on(
            session
                .service()
                .generate_disclosure_proof(session.principal(), args.id, policy),
        )
        .with_context(|| format!("failed to disclose credential {}", args.id))?;
    let json = serde_json::to_string_pretty(&bundle)?;

    match &args.out {
        Some(path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("failed to write bundle: {}", path.display()))?;
            println!("OK: proof written to {}", path.display());
            println!("{}", bundle.share_text());
        }
        None => println!("{json}"),
    }
    Ok(0)
}

/// Execute `credpass verify-proof`. `-` reads the bundle from stdin.
pub fn run_verify_proof(file: &Path, session: &Session) -> Result<u8> {
    let raw = if file == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read bundle from stdin")?;
        buf
    } else {
        std::fs::read_to_string(file)
            .with_context(|| format!("failed to read bundle: {}", file.display()))?
    };
    let bundle: ProofBundle =
        serde_json::from_str(&raw).context("file is not a valid proof bundle")?;

    let result = session.block_on(session.service().verify_proof(session.principal(), &bundle))?;
    report(&result)
}
