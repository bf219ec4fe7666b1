//! Ledger configuration.
//!
//! Selects between the REST gateway and the in-memory ledger. Loaded from
//! the environment by default:
//!
//! - `CREDPASS_LEDGER_URL` — gateway base URL. When absent, the in-memory
//!   ledger is used.
//! - `CREDPASS_LEDGER_TOKEN` — optional bearer token for the gateway.
//! - `CREDPASS_LEDGER_TIMEOUT_SECS` — request timeout (default: 30).
//! - `CREDPASS_LEDGER_SNAPSHOT` — JSON snapshot seeding the in-memory ledger.

use std::path::PathBuf;
use std::sync::Arc;

use url::Url;
use zeroize::Zeroizing;

use crate::error::LedgerError;
use crate::http::HttpLedger;
use crate::memory::InMemoryLedger;
use crate::Ledger;

/// Default gateway request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the REST ledger gateway.
///
/// Custom `Debug` redacts the `api_token` field.
#[derive(Clone)]
pub struct HttpLedgerConfig {
    /// Gateway base URL.
    pub base_url: Url,
    /// Bearer token sent with every request, if any.
    pub api_token: Option<Zeroizing<String>>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for HttpLedgerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpLedgerConfig")
            .field("base_url", &self.base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl HttpLedgerConfig {
    /// Settings for an unauthenticated gateway at `base_url`.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            api_token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Which ledger implementation to use.
#[derive(Debug, Clone)]
pub enum LedgerBackend {
    /// In-process ledger, optionally seeded from a snapshot file.
    InMemory { snapshot: Option<PathBuf> },
    /// REST gateway.
    Http(HttpLedgerConfig),
}

/// Ledger configuration.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Selected backend.
    pub backend: LedgerBackend,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            backend: LedgerBackend::InMemory { snapshot: None },
        }
    }
}

impl LedgerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let Some(raw_url) = non_empty("CREDPASS_LEDGER_URL") else {
            return Ok(Self {
                backend: LedgerBackend::InMemory {
                    snapshot: non_empty("CREDPASS_LEDGER_SNAPSHOT").map(PathBuf::from),
                },
            });
        };

        let base_url = Url::parse(raw_url.trim()).map_err(|e| {
            ConfigError::InvalidUrl("CREDPASS_LEDGER_URL".to_string(), e.to_string())
        })?;

        let timeout_secs = match non_empty("CREDPASS_LEDGER_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidNumber {
                    var: "CREDPASS_LEDGER_TIMEOUT_SECS".to_string(),
                    value: raw,
                })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            backend: LedgerBackend::Http(HttpLedgerConfig {
                base_url,
                api_token: non_empty("CREDPASS_LEDGER_TOKEN").map(Zeroizing::new),
                timeout_secs,
            }),
        })
    }

    /// Build the configured ledger.
    pub fn connect(&self) -> Result<Arc<dyn Ledger>, LedgerError> {
        match &self.backend {
            LedgerBackend::InMemory { snapshot: Some(path) } => {
                tracing::info!(path = %path.display(), "loading in-memory ledger snapshot");
                Ok(Arc::new(InMemoryLedger::load(path)?))
            }
            LedgerBackend::InMemory { snapshot: None } => {
                tracing::warn!("no ledger configured; using an empty in-memory ledger");
                Ok(Arc::new(InMemoryLedger::new()))
            }
            LedgerBackend::Http(config) => {
                tracing::info!(base_url = %config.base_url, "using REST ledger gateway");
                Ok(Arc::new(HttpLedger::new(config)?))
            }
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("invalid number for {var}: \"{value}\"")]
    InvalidNumber { var: String, value: String },
    #[error("invalid ledger API token: {0}")]
    InvalidToken(String),
}
