//! # Access Controller
//!
//! Fixed role × operation permission table. Evaluation is a pure lookup;
//! ownership checks on individual credentials happen in
//! [`CredentialService`](crate::CredentialService) after the record is
//! fetched.
//!
//! | Operation | Holder | Issuer | Verifier | Governor |
//! |-----------|:------:|:------:|:--------:|:--------:|
//! | compute_commitment | | ✓ | ✓ | |
//! | issue_credential | | ✓ | | |
//! | revoke_credential | | ✓ own | | |
//! | generate_disclosure | ✓ own | | | |
//! | verify_proof | | | ✓ | |
//! | verify_credential | | | ✓ | |
//! | resolve_status | ✓ own | ✓ | ✓ | |
//! | read_own_credentials | ✓ | ✓ | | |
//! | list_issuers | | | ✓ | ✓ |
//! | manage_issuers | | | | ✓ |
//!
//! A principal's role is fixed for its lifetime. Switching roles means
//! constructing a new [`Principal`].

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use credpass_core::{Address, ValidationError};

use crate::error::EngineError;

/// Authenticated role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Holder,
    Issuer,
    Verifier,
    Governor,
}

impl Role {
    /// Return the string representation of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Holder => "holder",
            Self::Issuer => "issuer",
            Self::Verifier => "verifier",
            Self::Governor => "governor",
        }
    }

    /// Whether this role acts on records tied to its own address.
    pub fn requires_address(&self) -> bool {
        !matches!(self, Self::Verifier)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "holder" => Ok(Self::Holder),
            "issuer" => Ok(Self::Issuer),
            "verifier" => Ok(Self::Verifier),
            "governor" => Ok(Self::Governor),
            _ => Err(ValidationError::UnknownRole(s.to_string())),
        }
    }
}

/// Gated engine operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    ComputeCommitment,
    IssueCredential,
    RevokeCredential,
    GenerateDisclosure,
    VerifyProof,
    VerifyCredential,
    ResolveStatus,
    ReadOwnCredentials,
    ListIssuers,
    ManageIssuers,
}

impl Operation {
    /// Return the string representation of this operation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ComputeCommitment => "compute_commitment",
            Self::IssueCredential => "issue_credential",
            Self::RevokeCredential => "revoke_credential",
            Self::GenerateDisclosure => "generate_disclosure",
            Self::VerifyProof => "verify_proof",
            Self::VerifyCredential => "verify_credential",
            Self::ResolveStatus => "resolve_status",
            Self::ReadOwnCredentials => "read_own_credentials",
            Self::ListIssuers => "list_issuers",
            Self::ManageIssuers => "manage_issuers",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether `role` may perform `operation` at all.
pub const fn permits(role: Role, operation: Operation) -> bool {
    use Operation::*;
    match role {
        Role::Holder => matches!(
            operation,
            GenerateDisclosure | ResolveStatus | ReadOwnCredentials
        ),
        Role::Issuer => matches!(
            operation,
            ComputeCommitment | IssueCredential | RevokeCredential | ResolveStatus
                | ReadOwnCredentials
        ),
        Role::Verifier => matches!(
            operation,
            ComputeCommitment | VerifyProof | VerifyCredential | ResolveStatus | ListIssuers
        ),
        Role::Governor => matches!(operation, ListIssuers | ManageIssuers),
    }
}

/// An authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    role: Role,
    address: Option<Address>,
}

impl Principal {
    /// Build a principal. Holders, issuers, and governors need an address.
    pub fn new(role: Role, address: Option<Address>) -> Result<Self, EngineError> {
        if role.requires_address() && address.is_none() {
            return Err(EngineError::Unidentified(role));
        }
        Ok(Self { role, address })
    }

    pub fn holder(address: Address) -> Self {
        Self {
            role: Role::Holder,
            address: Some(address),
        }
    }

    pub fn issuer(address: Address) -> Self {
        Self {
            role: Role::Issuer,
            address: Some(address),
        }
    }

    pub fn verifier() -> Self {
        Self {
            role: Role::Verifier,
            address: None,
        }
    }

    pub fn governor(address: Address) -> Self {
        Self {
            role: Role::Governor,
            address: Some(address),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }

    /// The principal's address, or `Unidentified` when it has none.
    pub fn require_address(&self) -> Result<&Address, EngineError> {
        self.address
            .as_ref()
            .ok_or(EngineError::Unidentified(self.role))
    }
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.address {
            Some(address) => write!(f, "{}:{}", self.role, address),
            None => f.write_str(self.role.as_str()),
        }
    }
}

/// Reject `operation` unless the principal's role permits it.
pub fn authorize(principal: &Principal, operation: Operation) -> Result<(), EngineError> {
    if permits(principal.role, operation) {
        Ok(())
    } else {
        tracing::warn!(
            role = principal.role.as_str(),
            operation = operation.as_str(),
            "access denied"
        );
        Err(EngineError::AccessDenied {
            role: principal.role,
            operation,
        })
    }
}
