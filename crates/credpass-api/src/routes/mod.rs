//! # API Route Modules
//!
//! - `commitments` — stateless commitment computation.
//! - `credentials` — issuance, listing, status, by-id verification,
//!   revocation, commitment audit, and disclosure proof generation.
//! - `proofs` — verification of presented disclosure bundles.
//! - `issuers` — issuer registry reads and governor maintenance.

pub mod commitments;
pub mod credentials;
pub mod issuers;
pub mod proofs;
