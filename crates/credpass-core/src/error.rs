//! # Error Hierarchy
//!
//! Validation errors for domain primitives, built with `thiserror`.
//!
//! Every variant carries the offending input (or enough of it to locate the
//! problem) and the expected format, so callers can render a precise
//! explanation without re-parsing.

use thiserror::Error;

/// Validation errors for domain primitive newtypes and credential fields.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Address is not `0x` followed by 40 hex digits.
    #[error("invalid address: \"{0}\" (expected 0x followed by 40 hex digits)")]
    InvalidAddress(String),

    /// Mixed-case address whose capitalisation is not a valid EIP-55 checksum.
    #[error("invalid address checksum: \"{0}\"")]
    BadChecksum(String),

    /// A 32-byte digest is not `0x` followed by 64 hex digits.
    #[error("invalid digest: \"{0}\" (expected 0x followed by 64 hex digits)")]
    InvalidDigest(String),

    /// A text attribute is empty after trimming.
    #[error("field {field} must not be empty")]
    EmptyField {
        /// Name of the offending field.
        field: &'static str,
    },

    /// A text attribute exceeds the permitted byte length.
    #[error("field {field} is {len} bytes, maximum is {max}")]
    FieldTooLong {
        /// Name of the offending field.
        field: &'static str,
        /// Actual length in bytes.
        len: usize,
        /// Maximum permitted length in bytes.
        max: usize,
    },

    /// Expiry is not after the issue date.
    #[error("expiry date {expiry} is not after issue date {issue}")]
    ExpiryBeforeIssue {
        /// Issue date, seconds since epoch.
        issue: u64,
        /// Expiry date, seconds since epoch.
        expiry: u64,
    },

    /// A timestamp value is out of the representable range.
    #[error("invalid timestamp {value}: {reason}")]
    InvalidTimestamp {
        /// The rejected value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Unrecognised hash algorithm name.
    #[error("unknown hash algorithm: \"{0}\" (expected keccak256 or sha256)")]
    UnknownAlgorithm(String),

    /// Unrecognised principal role name.
    #[error("unknown role: \"{0}\" (expected holder, issuer, verifier or governor)")]
    UnknownRole(String),
}
