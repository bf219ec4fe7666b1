//! # Engine Errors and Verification Failure Reasons
//!
//! Two distinct channels:
//!
//! - [`EngineError`] aborts an operation: malformed input, a permission
//!   failure, a missing precondition, or an unreachable ledger. Input and
//!   permission errors are raised before any hashing or ledger access.
//! - [`FailureReason`] is a *result*: a verification that completed and
//!   found the proof or credential wanting. It travels inside
//!   [`VerificationResult`](crate::VerificationResult), never as `Err`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use credpass_core::{Address, CredentialId, ValidationError};
use credpass_ledger::LedgerError;

use crate::access::{Operation, Role};

/// Errors that abort an engine operation.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Malformed field, identifier, or request.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    /// The principal's role does not permit the operation.
    #[error("access denied: role '{role}' may not {operation}")]
    AccessDenied { role: Role, operation: Operation },

    /// The role permits the operation, but not on this credential.
    #[error("access denied: {0}")]
    NotOwner(String),

    /// A role that acts on its own records was presented without an address.
    #[error("access denied: role '{0}' requires a principal address")]
    Unidentified(Role),

    /// Disclosure requested for a credential issued without a commitment.
    #[error("credential {0} has no commitment to disclose against")]
    NoCommitment(CredentialId),

    /// No credential with this id.
    #[error("credential {0} not found")]
    CredentialNotFound(CredentialId),

    /// Issuance by an issuer the registry does not recognise.
    #[error("issuer {0} is not registered")]
    IssuerNotRegistered(Address),

    /// The ledger could not be reached. Safe to retry.
    #[error("ledger unavailable: {0}")]
    LedgerUnavailable(String),

    /// The ledger refused a write.
    #[error("ledger rejected the request: {0}")]
    LedgerRejected(String),
}

impl EngineError {
    /// Whether the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::LedgerUnavailable(_))
    }

    /// Whether this is a permission failure of any kind.
    pub fn is_access_denied(&self) -> bool {
        matches!(
            self,
            Self::AccessDenied { .. } | Self::NotOwner(_) | Self::Unidentified(_)
        )
    }
}

impl From<LedgerError> for EngineError {
    fn from(err: LedgerError) -> Self {
        match err {
            e if e.is_unavailable() => {
                tracing::warn!(error = %e, "ledger unavailable");
                Self::LedgerUnavailable(e.to_string())
            }
            LedgerError::CredentialNotFound(id) => Self::CredentialNotFound(id),
            LedgerError::IssuerNotRegistered(address) => Self::IssuerNotRegistered(address),
            LedgerError::NotCredentialIssuer { id, caller } => {
                Self::NotOwner(format!("{caller} did not issue credential {id}"))
            }
            other => Self::LedgerRejected(other.to_string()),
        }
    }
}

/// Why a verification returned `valid = false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureReason {
    /// The recomputed proof hash differs from the presented one, or the
    /// presented values do not match the presented policy.
    ProofMismatch,
    /// No credential on the ledger carries the presented commitment.
    UnknownCommitment,
    /// The proof is internally consistent but claims values the ledger
    /// record does not hold.
    BindingMismatch,
    /// No credential with the requested id.
    UnknownCredential,
    /// The credential was revoked by its issuer.
    Revoked,
    /// The credential is past its expiry date.
    Expired,
    /// The credential's issuer is not (or no longer) registered.
    IssuerNotRegistered,
}

impl FailureReason {
    /// Machine-readable code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProofMismatch => "PROOF_MISMATCH",
            Self::UnknownCommitment => "UNKNOWN_COMMITMENT",
            Self::BindingMismatch => "BINDING_MISMATCH",
            Self::UnknownCredential => "UNKNOWN_CREDENTIAL",
            Self::Revoked => "REVOKED",
            Self::Expired => "EXPIRED",
            Self::IssuerNotRegistered => "ISSUER_NOT_REGISTERED",
        }
    }

    /// Human-readable explanation for display.
    pub fn description(&self) -> &'static str {
        match self {
            Self::ProofMismatch => "The proof hash does not match the disclosed values.",
            Self::UnknownCommitment => "No credential matches this commitment.",
            Self::BindingMismatch => {
                "The disclosed values do not match the credential on record."
            }
            Self::UnknownCredential => "No credential exists with this id.",
            Self::Revoked => "This credential has been revoked by the issuer.",
            Self::Expired => "This credential has expired.",
            Self::IssuerNotRegistered => "The issuer is not registered in the system.",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
