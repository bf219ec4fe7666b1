//! # Digests and Framed Hashing
//!
//! Defines [`Digest32`], the [`HashAlgorithm`] tag, and [`FramedFields`],
//! the byte layout every commitment and proof hash is computed over.
//!
//! ## Framing
//!
//! ```text
//! len(domain):u64be ‖ domain ‖ { tag:u8 ‖ len(value):u64be ‖ value }*
//! ```
//!
//! The domain string separates commitment hashes from proof hashes. The
//! per-field tag means an omitted field can never shift a neighbour into its
//! slot: a disclosed institution cannot be replayed as a disclosed type.
//!
//! ## Security Invariant
//!
//! [`HashAlgorithm::digest`] only accepts [`FramedFields`]. The one
//! exception, [`keccak256_legacy_text`], exists to recompute commitments
//! anchored by older clients and is never used for new values.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::Sha256;
use sha3::{Digest, Keccak256};

use crate::error::ValidationError;
use crate::identity::Address;

/// Hash function used for commitments and proof hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// Keccak-256, native to the EVM ledgers credentials are anchored on.
    #[default]
    Keccak256,
    /// SHA-256.
    Sha256,
}

impl HashAlgorithm {
    /// Return the string representation of this algorithm.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keccak256 => "keccak256",
            Self::Sha256 => "sha256",
        }
    }

    /// Hash a framed field sequence.
    pub fn digest(&self, fields: &FramedFields) -> Digest32 {
        Digest32(self.hash(fields.as_bytes()))
    }

    fn hash(&self, bytes: &[u8]) -> [u8; 32] {
        match self {
            Self::Keccak256 => Keccak256::digest(bytes).into(),
            Self::Sha256 => Sha256::digest(bytes).into(),
        }
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keccak256" | "keccak-256" => Ok(Self::Keccak256),
            "sha256" | "sha-256" => Ok(Self::Sha256),
            _ => Err(ValidationError::UnknownAlgorithm(s.to_string())),
        }
    }
}

/// Keccak-256 over raw UTF-8 text, for legacy delimited commitments only.
pub fn keccak256_legacy_text(text: &str) -> Digest32 {
    Digest32(HashAlgorithm::Keccak256.hash(text.as_bytes()))
}

// ---------------------------------------------------------------------------
// Digest32
// ---------------------------------------------------------------------------

/// A 32-byte hash value, rendered as `0x` followed by 64 hex digits.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest32([u8; 32]);

impl Digest32 {
    /// The all-zero value.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Wrap raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse `0x` + 64 hex digits (prefix optional, case-insensitive).
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|_| ValidationError::InvalidDigest(s.to_string()))?;
        Ok(Self(bytes))
    }

    /// Access the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Whether every byte is zero.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl std::fmt::Debug for Digest32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Digest32({})", self.to_hex())
    }
}

impl std::fmt::Display for Digest32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Digest32 {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Digest32 {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Digest32> for String {
    fn from(d: Digest32) -> Self {
        d.to_hex()
    }
}

/// The hash a disclosure proof commits to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProofHash(Digest32);

impl ProofHash {
    /// Wrap a digest.
    pub fn new(digest: Digest32) -> Self {
        Self(digest)
    }

    /// The underlying digest.
    pub fn digest(&self) -> &Digest32 {
        &self.0
    }
}

impl std::fmt::Display for ProofHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

// ---------------------------------------------------------------------------
// Framing
// ---------------------------------------------------------------------------

/// Domain separation for framed hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashDomain {
    /// Issuance-time credential commitment.
    Commitment,
    /// Selective-disclosure proof hash.
    Disclosure,
}

impl HashDomain {
    /// The domain string written at the head of every frame.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Commitment => "credpass/commitment/v1",
            Self::Disclosure => "credpass/disclosure/v1",
        }
    }
}

/// Field tags. Values are part of the hash layout and must never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FieldTag {
    /// Credential type, e.g. "BSc Computer Science".
    CredentialType = 0x01,
    /// Issuing institution name.
    Institution = 0x02,
    /// Issue date, seconds since epoch.
    IssueDate = 0x03,
    /// Expiry date, seconds since epoch, 0 for never.
    ExpiryDate = 0x04,
    /// Holder address.
    Holder = 0x05,
    /// Issuer address.
    Issuer = 0x06,
    /// Credential commitment.
    Commitment = 0x07,
    /// Disclosure nonce.
    Nonce = 0x08,
}

/// A framed, tagged, length-prefixed field sequence ready for hashing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramedFields {
    buf: Vec<u8>,
}

impl FramedFields {
    /// Start a frame for the given domain.
    pub fn new(domain: HashDomain) -> Self {
        let mut buf = Vec::with_capacity(256);
        let tag = domain.as_str().as_bytes();
        buf.extend_from_slice(&(tag.len() as u64).to_be_bytes());
        buf.extend_from_slice(tag);
        Self { buf }
    }

    /// Append a raw field.
    pub fn push(&mut self, tag: FieldTag, value: &[u8]) -> &mut Self {
        self.buf.push(tag as u8);
        self.buf.extend_from_slice(&(value.len() as u64).to_be_bytes());
        self.buf.extend_from_slice(value);
        self
    }

    /// Append a UTF-8 text field.
    pub fn push_str(&mut self, tag: FieldTag, value: &str) -> &mut Self {
        self.push(tag, value.as_bytes())
    }

    /// Append an integer field as 8 big-endian bytes.
    pub fn push_u64(&mut self, tag: FieldTag, value: u64) -> &mut Self {
        self.push(tag, &value.to_be_bytes())
    }

    /// Append an address field as its 20 raw bytes.
    pub fn push_address(&mut self, tag: FieldTag, value: &Address) -> &mut Self {
        self.push(tag, value.as_bytes())
    }

    /// Append a digest field as its 32 raw bytes.
    pub fn push_digest(&mut self, tag: FieldTag, value: &Digest32) -> &mut Self {
        self.push(tag, value.as_bytes())
    }

    /// The framed bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keccak_empty_input_matches_known_value() {
        assert_eq!(
            keccak256_legacy_text("").to_hex(),
            "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn algorithms_produce_distinct_digests() {
        let mut f = FramedFields::new(HashDomain::Commitment);
        f.push_str(FieldTag::CredentialType, "BSc");
        let k = HashAlgorithm::Keccak256.digest(&f);
        let s = HashAlgorithm::Sha256.digest(&f);
        assert_ne!(k, s);
        assert_eq!(k, HashAlgorithm::Keccak256.digest(&f));
    }

    #[test]
    fn domains_separate_identical_fields() {
        let mut a = FramedFields::new(HashDomain::Commitment);
        a.push_str(FieldTag::CredentialType, "BSc");
        let mut b = FramedFields::new(HashDomain::Disclosure);
        b.push_str(FieldTag::CredentialType, "BSc");
        assert_ne!(
            HashAlgorithm::default().digest(&a),
            HashAlgorithm::default().digest(&b)
        );
    }

    #[test]
    fn tags_prevent_field_relabelling() {
        let mut a = FramedFields::new(HashDomain::Disclosure);
        a.push_str(FieldTag::CredentialType, "Acme U");
        let mut b = FramedFields::new(HashDomain::Disclosure);
        b.push_str(FieldTag::Institution, "Acme U");
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn length_prefix_prevents_boundary_shift() {
        let mut a = FramedFields::new(HashDomain::Disclosure);
        a.push_str(FieldTag::CredentialType, "ab")
            .push_str(FieldTag::Institution, "c");
        let mut b = FramedFields::new(HashDomain::Disclosure);
        b.push_str(FieldTag::CredentialType, "a")
            .push_str(FieldTag::Institution, "bc");
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn digest_hex_round_trip_and_errors() {
        let d = Digest32::from_bytes([0xab; 32]);
        let hex = d.to_hex();
        assert_eq!(hex.len(), 66);
        assert_eq!(Digest32::parse(&hex).unwrap(), d);
        assert_eq!(Digest32::parse(&hex[2..]).unwrap(), d);
        assert!(Digest32::parse("0x1234").is_err());
        assert!(Digest32::ZERO.is_zero());
        assert!(!d.is_zero());
    }

    #[test]
    fn algorithm_parses_aliases() {
        assert_eq!("KECCAK256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Keccak256);
        assert_eq!("sha-256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha256);
        assert!("md5".parse::<HashAlgorithm>().is_err());
        assert_eq!(
            serde_json::to_string(&HashAlgorithm::Sha256).unwrap(),
            "\"sha256\""
        );
    }
}
