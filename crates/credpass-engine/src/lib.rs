//! # credpass-engine — Commitment & Selective-Disclosure Verification
//!
//! The engine derives a binding commitment for a credential at issuance,
//! builds disclosure proofs that reveal only chosen attributes, verifies those
//! proofs against ledger state, and resolves a credential's tri-state
//! validity.
//!
//! ## Components
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`commitment`] | Commitment Generator: framed and legacy schemes, audit |
//! | [`status`] | Status Resolver: revoked > expired > valid |
//! | [`disclosure`] | Disclosure Proof Generator: policy, nonce, proof bundle |
//! | [`verifier`] | Proof Verifier and full-disclosure verification |
//! | [`access`] | Access Controller: fixed role/operation permission table |
//! | [`service`] | [`CredentialService`] facade gating every operation |
//!
//! ## What the proof is, and is not
//!
//! A disclosure proof is a commit-and-reveal hash: disclosed attributes travel
//! in the clear, undisclosed attributes are omitted, and the proof hash binds
//! the disclosed values to the commitment, a fresh nonce, and the issuer and
//! holder addresses. It is **not** zero-knowledge. A verifier learns which
//! attributes were withheld, and anyone holding a bundle can re-present it.
//! Current validity always comes from the ledger, never from the proof.
//!
//! ## Time and randomness
//!
//! No function here reads the wall clock or an ambient RNG. The current
//! instant arrives as a [`Timestamp`](credpass_core::Timestamp) argument and
//! nonces are drawn from a caller-supplied `CryptoRng`; [`CredentialService`]
//! supplies both at the boundary.

pub mod access;
pub mod clock;
pub mod commitment;
pub mod disclosure;
pub mod error;
pub mod service;
pub mod status;
pub mod verifier;

pub use access::{authorize, permits, Operation, Principal, Role};
pub use clock::{Clock, FixedClock, SystemClock};
pub use commitment::{audit_commitment, commit, CommitmentAudit, CommitmentScheme};
pub use disclosure::{
    disclose, disclose_with_nonce, proof_hash, DisclosedValues, DisclosurePolicy, Nonce,
    ProofBundle,
};
pub use error::{EngineError, FailureReason};
pub use service::{CredentialService, EngineConfig, IssueCredential};
pub use status::resolve_status;
pub use verifier::{
    verify_credential_by_id, verify_proof, DisclosedAttributes, VerificationResult,
};
