//! Ledger error types.

use credpass_core::{Address, Commitment, CredentialId};
use thiserror::Error;

use crate::config::ConfigError;

/// Errors from ledger reads and writes.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The ledger could not be reached, or answered with a server error.
    #[error("ledger unavailable ({endpoint}): {reason}")]
    Unavailable { endpoint: String, reason: String },

    /// The ledger answered with a body that could not be decoded.
    #[error("malformed ledger response ({endpoint}): {reason}")]
    Malformed { endpoint: String, reason: String },

    /// No credential with this id.
    #[error("credential {0} not found")]
    CredentialNotFound(CredentialId),

    /// Revocation attempted by someone other than the issuer.
    #[error("{caller} is not the issuer of credential {id}")]
    NotCredentialIssuer { id: CredentialId, caller: Address },

    /// Issuance attempted by an unrecognised issuer.
    #[error("issuer {0} is not registered")]
    IssuerNotRegistered(Address),

    /// The commitment is already bound to another credential.
    #[error("commitment {0} is already bound to a credential")]
    DuplicateCommitment(Commitment),

    /// Every credential id has been handed out.
    #[error("credential id space exhausted")]
    IdSpaceExhausted,

    /// The ledger refused the request for a reason not modelled above.
    #[error("ledger rejected {endpoint} ({status}): {message}")]
    Rejected {
        endpoint: String,
        status: u16,
        message: String,
    },

    /// Snapshot file could not be read or written.
    #[error("snapshot {path}: {reason}")]
    Snapshot { path: String, reason: String },

    /// Invalid ledger configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl LedgerError {
    /// Whether the failure is an I/O fault that may succeed on retry.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::Malformed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_io_faults_are_unavailable() {
        assert!(LedgerError::Unavailable {
            endpoint: "GET /v1/issuers".into(),
            reason: "connection refused".into(),
        }
        .is_unavailable());
        assert!(LedgerError::Malformed {
            endpoint: "GET /v1/issuers".into(),
            reason: "expected array".into(),
        }
        .is_unavailable());
        assert!(!LedgerError::CredentialNotFound(CredentialId::new(3)).is_unavailable());
        assert!(!LedgerError::IssuerNotRegistered(Address::from_bytes([1; 20])).is_unavailable());
    }
}
