//! # credpass-ledger — Ledger Accessor
//!
//! The ledger is the append-only, authoritative store of credential records
//! and issuer registrations. The engine never owns that state: it reads
//! through the [`Ledger`] trait and routes the two external writes
//! (issuance and revocation) through it.
//!
//! ## Implementations
//!
//! | Type | Backing | Use |
//! |------|---------|-----|
//! | [`InMemoryLedger`] | `parking_lot::RwLock` + JSON snapshot | tests, local development, CLI fixtures |
//! | [`HttpLedger`] | REST gateway in front of the chain | production |
//!
//! ## Failure model
//!
//! Reads return `Ok(None)` for absent records. Transport failures and
//! undecodable responses are [`LedgerError::Unavailable`] /
//! [`LedgerError::Malformed`], which callers treat as retryable. The HTTP
//! client resends after transport failures internally with exponential
//! backoff, except that issuance is only resent when the connection never
//! opened. Nothing above this crate retries.

pub mod config;
pub mod error;
pub mod http;
pub mod memory;
pub(crate) mod retry;

pub use config::{ConfigError, HttpLedgerConfig, LedgerBackend, LedgerConfig};
pub use error::LedgerError;
pub use http::HttpLedger;
pub use memory::{InMemoryLedger, LedgerSnapshot};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use credpass_core::{
    Address, Commitment, Credential, CredentialId, Expiry, IssuerRegistration,
};

/// A credential issuance write.
///
/// The issue date is supplied by the caller because it is one of the
/// committed fields: the ledger must record exactly the instant the
/// commitment was computed over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuanceRequest {
    /// Issuing principal.
    pub issuer: Address,
    /// Holding principal.
    pub holder: Address,
    /// Credential type.
    pub credential_type: String,
    /// Issuing institution.
    #[serde(rename = "institutionName")]
    pub institution: String,
    /// Issue date, seconds since epoch.
    pub issue_date: u64,
    /// Expiry, `0` for never.
    #[serde(rename = "expiryDate", default)]
    pub expiry: Expiry,
    /// Opaque external metadata reference.
    #[serde(default, rename = "metadataURI", skip_serializing_if = "Option::is_none")]
    pub metadata_uri: Option<String>,
    /// Commitment to bind, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commitment: Option<Commitment>,
}

/// Read/write access to the credential ledger.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Fetch a credential by id.
    async fn credential(&self, id: CredentialId) -> Result<Option<Credential>, LedgerError>;

    /// Fetch the credential bound to a commitment.
    async fn credential_by_commitment(
        &self,
        commitment: &Commitment,
    ) -> Result<Option<Credential>, LedgerError>;

    /// Ids of credentials held by `holder`, in issuance order.
    async fn holder_credentials(&self, holder: &Address)
        -> Result<Vec<CredentialId>, LedgerError>;

    /// Ids of credentials issued by `issuer`, in issuance order.
    async fn issuer_credentials(&self, issuer: &Address)
        -> Result<Vec<CredentialId>, LedgerError>;

    /// Registry entry for an issuer, registered or not.
    async fn issuer_registration(
        &self,
        issuer: &Address,
    ) -> Result<Option<IssuerRegistration>, LedgerError>;

    /// Whether `issuer` is currently a recognised issuer.
    async fn is_registered_issuer(&self, issuer: &Address) -> Result<bool, LedgerError> {
        Ok(self
            .issuer_registration(issuer)
            .await?
            .is_some_and(|r| r.registered))
    }

    /// All registry entries.
    async fn issuers(&self) -> Result<Vec<IssuerRegistration>, LedgerError>;

    /// Record a new credential and return its ledger-assigned id.
    async fn issue_credential(&self, request: IssuanceRequest)
        -> Result<CredentialId, LedgerError>;

    /// Revoke a credential. Only its issuer may do so; repeating is a no-op.
    async fn revoke_credential(&self, issuer: &Address, id: CredentialId)
        -> Result<(), LedgerError>;

    /// Register (or re-register) an issuer under a display name.
    async fn register_issuer(&self, issuer: &Address, name: &str) -> Result<(), LedgerError>;

    /// Withdraw an issuer's recognition, keeping its registry entry.
    async fn deregister_issuer(&self, issuer: &Address) -> Result<(), LedgerError>;
}
