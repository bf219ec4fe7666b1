#![deny(missing_docs)]

//! # credpass-core — Foundational Types for credpass
//!
//! This crate defines the types every other crate in the workspace depends
//! on. It has no internal crate dependencies and performs no I/O. It uses only
//! `serde`, `thiserror`, `chrono`, `sha2`, `sha3`, and `hex` from the
//! external ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** An [`Address`] is not a
//!    string, a [`Commitment`] is not a [`ProofHash`], and a [`CredentialId`]
//!    is not a bare integer. Validation happens once, at construction.
//!
//! 2. **[`FramedFields`] is the sole path to hashing.** Every commitment and
//!    proof hash in the stack is computed over a framed, tagged, length-prefixed
//!    field sequence, so no two distinct field layouts can collide by
//!    concatenation.
//!
//! 3. **Ledger records are plain data.** [`Credential`] and
//!    [`IssuerRegistration`] carry no behaviour beyond invariant-preserving
//!    accessors; the ledger crate owns persistence and the engine crate owns
//!    derivation.
//!
//! 4. **[`ValidationError`] for malformed input.** Structured errors with
//!    `thiserror`. No `Box<dyn Error>` and no `.unwrap()` outside tests.

pub mod credential;
pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

// Re-export primary types at crate root for ergonomic imports.
pub use credential::{
    validate_text, Commitment, Credential, CredentialFields, CredentialStatus, Expiry,
    IssuerRegistration, MAX_TEXT_FIELD_LEN,
};
pub use digest::{
    keccak256_legacy_text, Digest32, FieldTag, FramedFields, HashAlgorithm, HashDomain, ProofHash,
};
pub use error::ValidationError;
pub use identity::{Address, CredentialId};
pub use temporal::Timestamp;
