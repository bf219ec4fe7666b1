//! # CLI Configuration
//!
//! An optional YAML file supplies defaults for the ledger connection, the
//! hash algorithm and the acting principal:
//!
//! ```yaml
//! ledger_url: https://gateway.example.org
//! ledger_token: s3cret
//! timeout_secs: 10
//! snapshot: ./ledger.json
//! hash: keccak256
//! principal: verifier
//! ```
//!
//! Precedence, highest first: command-line flags, environment variables,
//! the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use credpass_core::HashAlgorithm;
use credpass_ledger::LedgerConfig;

use crate::GlobalOpts;

/// Contents of the `--config` YAML file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    #[serde(default)]
    pub ledger_url: Option<String>,
    #[serde(default)]
    pub ledger_token: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub snapshot: Option<PathBuf>,
    #[serde(default)]
    pub hash: Option<HashAlgorithm>,
    #[serde(default)]
    pub principal: Option<String>,
}

impl CliConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }
}

/// Settings after merging flags, environment and file.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub ledger: LedgerConfig,
    pub hash: HashAlgorithm,
    pub principal: Option<String>,
}

/// Merge `opts`, the environment seen through `env`, and `file`.
pub fn resolve<F>(opts: &GlobalOpts, file: &CliConfig, env: F) -> Result<Resolved>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |var: &str| -> Option<String> {
        match var {
            "CREDPASS_LEDGER_URL" => opts
                .ledger_url
                .clone()
                .or_else(|| env(var))
                .or_else(|| file.ledger_url.clone()),
            "CREDPASS_LEDGER_SNAPSHOT" => opts
                .snapshot
                .as_ref()
                .map(|p| p.display().to_string())
                .or_else(|| env(var))
                .or_else(|| file.snapshot.as_ref().map(|p| p.display().to_string())),
            "CREDPASS_LEDGER_TOKEN" => env(var).or_else(|| file.ledger_token.clone()),
            "CREDPASS_LEDGER_TIMEOUT_SECS" => {
                env(var).or_else(|| file.timeout_secs.map(|s| s.to_string()))
            }
            _ => env(var),
        }
    };
    let ledger = LedgerConfig::from_lookup(lookup).context("invalid ledger configuration")?;

    let hash = match env("CREDPASS_HASH") {
        Some(raw) => raw.parse().context("invalid CREDPASS_HASH")?,
        None => file.hash.unwrap_or_default(),
    };

    Ok(Resolved {
        ledger,
        hash,
        principal: opts.principal.clone().or_else(|| file.principal.clone()),
    })
}
