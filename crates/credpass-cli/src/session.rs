//! # CLI Session
//!
//! One session per invocation: the resolved ledger, the acting principal,
//! and a single-threaded Tokio runtime to drive the async service from
//! synchronous subcommand handlers.
//!
//! When the ledger is a local snapshot, the session keeps a handle to the
//! in-memory ledger so mutating commands can write the file back.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};

use credpass_core::Address;
use credpass_engine::{CredentialService, EngineConfig, Principal, Role};
use credpass_ledger::{HttpLedger, InMemoryLedger, Ledger, LedgerBackend};

use crate::config::{self, CliConfig};
use crate::GlobalOpts;

/// Parse `role[:address]`.
pub fn parse_principal(raw: &str) -> Result<Principal> {
    let (role, address) = match raw.split_once(':') {
        Some((role, address)) => (role, Some(address)),
        None => (raw, None),
    };
    let role: Role = role.parse()?;
    let address = address
        .filter(|a| !a.trim().is_empty())
        .map(Address::parse)
        .transpose()?;
    Ok(Principal::new(role, address)?)
}

pub struct Session {
    runtime: tokio::runtime::Runtime,
    service: CredentialService,
    principal: Principal,
    snapshot: Option<(InMemoryLedger, PathBuf)>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("principal", &self.principal)
            .field("snapshot", &self.snapshot.as_ref().map(|(_, p)| p))
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Open a session from global flags and the process environment.
    pub fn open(opts: &GlobalOpts) -> Result<Self> {
        Self::open_with_env(opts, |var| std::env::var(var).ok())
    }

    pub fn open_with_env<F>(opts: &GlobalOpts, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = match &opts.config {
            Some(path) => CliConfig::load(path)?,
            None => CliConfig::default(),
        };
        let resolved = config::resolve(opts, &file, env)?;

        let principal = match &resolved.principal {
            Some(raw) => {
                parse_principal(raw).with_context(|| format!("invalid --as value \"{raw}\""))?
            }
            None => Principal::verifier(),
        };

        let (ledger, snapshot): (Arc<dyn Ledger>, _) = match &resolved.ledger.backend {
            LedgerBackend::Http(http) => {
                tracing::debug!(url = %http.base_url, "using ledger gateway");
                (Arc::new(HttpLedger::new(http)?), None)
            }
            LedgerBackend::InMemory { snapshot: Some(path) } => {
                let memory = open_snapshot(path)?;
                (Arc::new(memory.clone()), Some((memory, path.clone())))
            }
            LedgerBackend::InMemory { snapshot: None } => {
                tracing::warn!("no --snapshot or --ledger-url given; using an empty ledger");
                (Arc::new(InMemoryLedger::new()), None)
            }
        };

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("failed to start async runtime")?;

        let service = CredentialService::new(ledger).with_config(EngineConfig {
            algorithm: resolved.hash,
        });

        Ok(Self {
            runtime,
            service,
            principal,
            snapshot,
        })
    }

    pub fn service(&self) -> &CredentialService {
        &self.service
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Run a future to completion on the session runtime.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Write the snapshot back after a mutation. No-op for remote ledgers.
    pub fn persist(&self) -> Result<()> {
        if let Some((ledger, path)) = &self.snapshot {
            ledger.save(path)?;
            tracing::info!(path = %path.display(), "snapshot saved");
        }
        Ok(())
    }
}

/// Load a snapshot, or start empty when the file does not exist yet.
fn open_snapshot(path: &Path) -> Result<InMemoryLedger> {
    if path.exists() {
        tracing::debug!(path = %path.display(), "loading snapshot");
        InMemoryLedger::load(path).map_err(|e| anyhow!(e))
    } else {
        tracing::info!(path = %path.display(), "snapshot not found; starting empty");
        Ok(InMemoryLedger::new())
    }
}
