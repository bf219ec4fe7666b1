//! # credpass-cli — Command Line Interface
//!
//! The `credpass` binary drives the same [`CredentialService`] the HTTP
//! service uses, against either the REST ledger gateway or a local JSON
//! snapshot of the in-memory ledger.
//!
//! ## Subcommands
//!
//! - `credpass commit` — Compute a commitment (framed or `--legacy`).
//! - `credpass issue` / `revoke` — Issuer operations.
//! - `credpass disclose` — Generate a disclosure proof bundle.
//! - `credpass verify-proof` / `verify` — Verifier operations.
//! - `credpass status` / `list` / `audit` — Record inspection.
//! - `credpass issuers list|register|deregister` — Registry maintenance.
//!
//! ## Exit codes
//!
//! `0` success (or a valid verification), `1` operational error, `2` a
//! verification that completed with `valid = false`.
//!
//! ```bash
//! credpass --snapshot ledger.json --as governor:0x33.. issuers register 0x11.. "Acme University"
//! credpass --snapshot ledger.json --as issuer:0x11.. issue --holder 0x22.. --type "BSc" --institution "Acme University"
//! credpass --snapshot ledger.json --as holder:0x22.. disclose 1 --show type,institution --out proof.json
//! credpass --snapshot ledger.json verify-proof proof.json
//! ```
//!
//! [`CredentialService`]: credpass_engine::CredentialService

pub mod commit;
pub mod config;
pub mod credential;
pub mod issuers;
pub mod proof;
pub mod session;

use std::path::PathBuf;

use clap::Args;

/// Exit code for a verification that completed and found the credential wanting.
pub const EXIT_INVALID: u8 = 2;

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Path to a YAML configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the REST ledger gateway.
    #[arg(long, global = true)]
    pub ledger_url: Option<String>,

    /// JSON ledger snapshot to operate on. Mutating commands write it back.
    #[arg(long, global = true)]
    pub snapshot: Option<PathBuf>,

    /// Principal to act as.
    #[arg(long = "as", value_name = "ROLE[:ADDRESS]", global = true)]
    pub principal: Option<String>,
}

/// Print a value as pretty JSON on stdout.
pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
