//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! AppState owns no credential data. Every record lives on the ledger and
//! is reached through the [`CredentialService`] facade, which is cheap to
//! clone and safe to share across requests.

use std::sync::Arc;

use thiserror::Error;
use zeroize::Zeroizing;

use credpass_core::HashAlgorithm;
use credpass_engine::{CredentialService, EngineConfig};
use credpass_ledger::{InMemoryLedger, Ledger};

/// Invalid service configuration.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a port number, got \"{value}\"")]
    InvalidPort { var: &'static str, value: String },

    #[error("{var}: {reason}")]
    InvalidValue { var: &'static str, reason: String },
}

/// Application configuration.
///
/// Custom `Debug` redacts the `auth_token` to prevent credential leakage in logs.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Shared bearer secret. If `None`, authentication is disabled.
    pub auth_token: Option<Zeroizing<String>>,
    /// Hash used for new commitments and proof hashes.
    pub hash: HashAlgorithm,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field(
                "auth_token",
                &self.auth_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("hash", &self.hash)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            auth_token: None,
            hash: HashAlgorithm::default(),
        }
    }
}

impl AppConfig {
    /// Load from `PORT`, `AUTH_TOKEN` and `CREDPASS_HASH`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let port = match non_empty("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort {
                    var: "PORT",
                    value: raw,
                })?,
            None => defaults.port,
        };

        let hash = match non_empty("CREDPASS_HASH") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e: credpass_core::ValidationError| ConfigError::InvalidValue {
                    var: "CREDPASS_HASH",
                    reason: e.to_string(),
                })?,
            None => defaults.hash,
        };

        Ok(Self {
            port,
            auth_token: non_empty("AUTH_TOKEN").map(Zeroizing::new),
            hash,
        })
    }
}

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub service: CredentialService,
    pub config: AppConfig,
}

impl AppState {
    /// State over an empty in-memory ledger with default configuration.
    pub fn new() -> Self {
        Self::with_ledger(AppConfig::default(), Arc::new(InMemoryLedger::new()))
    }

    /// State over the given ledger.
    pub fn with_ledger(config: AppConfig, ledger: Arc<dyn Ledger>) -> Self {
        let service = CredentialService::new(ledger).with_config(EngineConfig {
            algorithm: config.hash,
        });
        Self { service, config }
    }

    /// Replace the service, e.g. to inject a fixed clock.
    pub fn with_service(mut self, service: CredentialService) -> Self {
        self.service = service;
        self
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 8080);
        assert!(config.auth_token.is_none());
        assert_eq!(config.hash, HashAlgorithm::Keccak256);
    }

    #[test]
    fn reads_all_variables() {
        let config = AppConfig::from_lookup(lookup(&[
            ("PORT", "9090"),
            ("AUTH_TOKEN", "s3cret"),
            ("CREDPASS_HASH", "sha256"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.auth_token.as_deref().map(String::as_str), Some("s3cret"));
        assert_eq!(config.hash, HashAlgorithm::Sha256);
    }

    #[test]
    fn blank_token_disables_auth() {
        let config = AppConfig::from_lookup(lookup(&[("AUTH_TOKEN", "  ")])).unwrap();
        assert!(config.auth_token.is_none());
    }

    #[test]
    fn rejects_bad_port() {
        let err = AppConfig::from_lookup(lookup(&[("PORT", "http")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort { .. }));
    }

    #[test]
    fn rejects_unknown_hash() {
        let err = AppConfig::from_lookup(lookup(&[("CREDPASS_HASH", "md5")])).unwrap_err();
        assert!(err.to_string().contains("CREDPASS_HASH"));
    }

    #[test]
    fn debug_redacts_token() {
        let config = AppConfig {
            auth_token: Some(Zeroizing::new("s3cret".into())),
            ..AppConfig::default()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("s3cret"));
    }

    #[test]
    fn state_uses_configured_hash() {
        let config = AppConfig {
            hash: HashAlgorithm::Sha256,
            ..AppConfig::default()
        };
        let state = AppState::with_ledger(config, Arc::new(InMemoryLedger::new()));
        assert_eq!(state.service.config().algorithm, HashAlgorithm::Sha256);
    }
}
