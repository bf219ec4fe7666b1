//! # Credential Subcommands
//!
//! Issuance, revocation, status, listing, by-id verification and
//! commitment audit. Mutating commands write the snapshot back.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::Args;

use credpass_core::{Address, CredentialId, Expiry};
use credpass_engine::{CommitmentAudit, CommitmentScheme, IssueCredential, VerificationResult};

use crate::session::Session;
use crate::{print_json, EXIT_INVALID};

/// Arguments for `credpass issue`.
#[derive(Args, Debug)]
pub struct IssueArgs {
    #[arg(long, value_parser = Address::parse)]
    pub holder: Address,
    #[arg(long = "type")]
    pub credential_type: String,
    #[arg(long)]
    pub institution: String,
    /// Expiry as YYYY-MM-DD or seconds since epoch. Omit for no expiry.
    #[arg(long, value_parser = parse_expiry)]
    pub expiry: Option<Expiry>,
    #[arg(long)]
    pub metadata_uri: Option<String>,
}

/// Arguments for `credpass audit`.
#[derive(Args, Debug)]
pub struct AuditArgs {
    pub id: CredentialId,
    /// Recompute with the legacy pipe-delimited scheme.
    #[arg(long)]
    pub legacy: bool,
}

/// Parse `YYYY-MM-DD` (midnight UTC) or epoch seconds. `0` means never.
pub fn parse_expiry(raw: &str) -> Result<Expiry, String> {
    let raw = raw.trim();
    if raw.chars().all(|c| c.is_ascii_digit()) {
        return raw
            .parse::<u64>()
            .map(Expiry::from_secs)
            .map_err(|e| e.to_string());
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD or epoch seconds: {e}"))?;
    let secs = date
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .ok_or_else(|| format!("invalid date: {raw}"))?;
    u64::try_from(secs)
        .map(Expiry::from_secs)
        .map_err(|_| format!("date before 1970: {raw}"))
}

/// Execute `credpass issue`.
pub fn run_issue(args: &IssueArgs, session: &Session) -> Result<u8> {
    let request = IssueCredential {
        holder: args.holder,
        credential_type: args.credential_type.clone(),
        institution: args.institution.clone(),
        expiry: args.expiry.unwrap_or_default(),
        metadata_uri: args.metadata_uri.clone(),
    };
    let credential = session
        .block_on(session.service().issue_credential(session.principal(), request))
        .context("issuance failed")?;
    session.persist()?;

    eprintln!("OK: issued credential {}", credential.id);
    print_json(&credential)?;
    Ok(0)
}

/// Execute `credpass revoke`.
pub fn run_revoke(id: CredentialId, session: &Session) -> Result<u8> {
    let credential = session
        .block_on(session.service().revoke_credential(session.principal(), id))
        .with_context(|| format!("failed to revoke credential {id}"))?;
    session.persist()?;

    println!("OK: credential {} revoked", credential.id);
    Ok(0)
}

/// Execute `credpass status`.
pub fn run_status(id: CredentialId, session: &Session) -> Result<u8> {
    let status = session.block_on(session.service().resolve_status(session.principal(), id))?;
    println!("{status}");
    Ok(0)
}

/// Execute `credpass list`.
pub fn run_list(session: &Session) -> Result<u8> {
    let credentials =
        session.block_on(session.service().list_credentials(session.principal()))?;
    print_json(&credentials)?;
    Ok(0)
}

/// Execute `credpass verify`.
pub fn run_verify(id: CredentialId, session: &Session) -> Result<u8> {
    let result = session.block_on(
        session
            .service()
            .verify_credential_by_id(session.principal(), id),
    )?;
    report(&result)
}

/// Execute `credpass audit`.
pub fn run_audit(args: &AuditArgs, session: &Session) -> Result<u8> {
    let scheme = if args.legacy {
        CommitmentScheme::LegacyDelimited
    } else {
        CommitmentScheme::Framed(session.service().config().algorithm)
    };
    let audit = session.block_on(
        session
            .service()
            .audit_commitment(session.principal(), args.id, scheme),
    )?;
    match audit {
        CommitmentAudit::Matches => {
            println!("OK: commitment of credential {} matches its fields", args.id);
            Ok(0)
        }
        CommitmentAudit::Mismatch { expected, recorded } => {
            println!("MISMATCH: credential {}", args.id);
            println!("  recorded: {recorded}");
            println!("  expected: {expected}");
            Ok(EXIT_INVALID)
        }
        CommitmentAudit::Absent => bail!("credential {} has no commitment", args.id),
    }
}

/// Print a verification outcome and map it to an exit code.
pub(crate) fn report(result: &VerificationResult) -> Result<u8> {
    if result.valid {
        println!("VALID");
    } else {
        let reason = result.reason.map(|r| r.as_str()).unwrap_or("UNKNOWN");
        println!(
            "INVALID ({reason}): {}",
            result.explanation().unwrap_or("verification failed")
        );
    }
    print_json(result)?;
    Ok(if result.valid { 0 } else { EXIT_INVALID })
}
