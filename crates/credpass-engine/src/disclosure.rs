//! # Disclosure Proof Generator
//!
//! Builds a [`ProofBundle`] that reveals the attributes selected by a
//! [`DisclosurePolicy`] and binds them to the credential's commitment.
//!
//! ## Proof hash layout
//!
//! ```text
//! frame(credpass/disclosure/v1)
//!   [type]        if showType
//!   [institution] if showInstitution
//!   [issueDate]   if showIssueDate
//!   [expiryDate]  if showExpiryDate
//!   commitment ‖ nonce ‖ issuer ‖ holder
//! ```
//!
//! Every field is tagged, so a withheld attribute cannot be confused with a
//! disclosed neighbour. Issuer and holder are always bound; `showIssuer` and
//! `showHolder` only control what a verifier displays.

use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use credpass_core::{
    Address, Commitment, Credential, CredentialId, Expiry, FieldTag, FramedFields,
    HashAlgorithm, HashDomain, ProofHash, ValidationError,
};

use crate::error::EngineError;

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Which attributes a disclosure reveals.
///
/// Missing fields in a serialized policy take the default, which reveals
/// the credential type only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DisclosurePolicy {
    pub show_type: bool,
    pub show_institution: bool,
    pub show_issue_date: bool,
    pub show_expiry_date: bool,
    pub show_holder: bool,
    pub show_issuer: bool,
}

impl Default for DisclosurePolicy {
    fn default() -> Self {
        Self {
            show_type: true,
            show_institution: false,
            show_issue_date: false,
            show_expiry_date: false,
            show_holder: false,
            show_issuer: false,
        }
    }
}

impl DisclosurePolicy {
    /// Reveal nothing beyond the bound issuer and holder.
    pub fn none() -> Self {
        Self {
            show_type: false,
            ..Self::default()
        }
    }

    /// Reveal every attribute.
    pub fn all() -> Self {
        Self {
            show_type: true,
            show_institution: true,
            show_issue_date: true,
            show_expiry_date: true,
            show_holder: true,
            show_issuer: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Nonce
// ---------------------------------------------------------------------------

/// Per-proof random value. Two proofs of the same credential under the same
/// policy differ only by nonce.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Nonce([u8; 32]);

impl Nonce {
    /// Nonce length in bytes.
    pub const LEN: usize = 32;

    /// Draw a fresh nonce from a cryptographic RNG.
    pub fn random<R: RngCore + CryptoRng + ?Sized>(rng: &mut R) -> Self {
        let mut bytes = [0u8; Self::LEN];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Wrap raw bytes.
    pub fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        Self(bytes)
    }

    /// Parse `0x` + 64 hex digits.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let digits = s
            .trim()
            .strip_prefix("0x")
            .ok_or_else(|| ValidationError::InvalidDigest(s.to_string()))?;
        let mut bytes = [0u8; Self::LEN];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|_| ValidationError::InvalidDigest(s.to_string()))?;
        Ok(Self(bytes))
    }

    /// Access the raw bytes.
    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }

    /// `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl std::fmt::Debug for Nonce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Nonce({})", self.to_hex())
    }
}

impl std::fmt::Display for Nonce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for Nonce {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Nonce> for String {
    fn from(n: Nonce) -> Self {
        n.to_hex()
    }
}

// ---------------------------------------------------------------------------
// Disclosed values and bundle
// ---------------------------------------------------------------------------

/// Attribute values carried in the clear by a proof bundle.
///
/// The optional attributes are present exactly when the policy shows them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisclosedValues {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_type: Option<String>,
    #[serde(default, rename = "institutionName", skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<Expiry>,
    pub issuer: Address,
    pub holder: Address,
}

impl DisclosedValues {
    /// Select the values `policy` reveals from a credential record.
    pub fn from_credential(credential: &Credential, policy: &DisclosurePolicy) -> Self {
        Self {
            credential_type: policy
                .show_type
                .then(|| credential.credential_type.clone()),
            institution: policy.show_institution.then(|| credential.institution.clone()),
            issue_date: policy.show_issue_date.then_some(credential.issue_date),
            expiry_date: policy.show_expiry_date.then_some(credential.expiry),
            issuer: credential.issuer,
            holder: credential.holder,
        }
    }

    /// Whether exactly the attributes `policy` shows are present.
    pub fn conforms_to(&self, policy: &DisclosurePolicy) -> bool {
        self.credential_type.is_some() == policy.show_type
            && self.institution.is_some() == policy.show_institution
            && self.issue_date.is_some() == policy.show_issue_date
            && self.expiry_date.is_some() == policy.show_expiry_date
    }

    /// Whether every present value equals the credential record.
    pub fn agrees_with(&self, credential: &Credential) -> bool {
        self.issuer == credential.issuer
            && self.holder == credential.holder
            && self
                .credential_type
                .as_ref()
                .map_or(true, |t| *t == credential.credential_type)
            && self
                .institution
                .as_ref()
                .map_or(true, |i| *i == credential.institution)
            && self.issue_date.map_or(true, |d| d == credential.issue_date)
            && self.expiry_date.map_or(true, |e| e == credential.expiry)
    }
}

/// A portable selective-disclosure proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofBundle {
    /// Advisory id of the credential. Verification never trusts it alone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_id: Option<CredentialId>,
    pub commitment: Commitment,
    pub nonce: Nonce,
    pub proof_hash: ProofHash,
    #[serde(default)]
    pub algorithm: HashAlgorithm,
    #[serde(rename = "disclosedFields")]
    pub policy: DisclosurePolicy,
    #[serde(rename = "disclosedValues")]
    pub disclosed: DisclosedValues,
}

impl ProofBundle {
    /// Plain-text summary for copy/paste sharing.
    pub fn share_text(&self) -> String {
        format!(
            "Commitment: {}\nProof Hash: {}\nNonce: {}",
            self.commitment, self.proof_hash, self.nonce
        )
    }

    /// Recompute the proof hash from the bundle's own contents.
    pub fn recompute_hash(&self) -> ProofHash {
        proof_hash(
            self.algorithm,
            &self.commitment,
            &self.nonce,
            &self.policy,
            &self.disclosed,
        )
    }
}

// ---------------------------------------------------------------------------
// Hashing and generation
// ---------------------------------------------------------------------------

/// Compute the proof hash over the values `policy` shows, the commitment,
/// the nonce, and the bound issuer and holder.
pub fn proof_hash(
    algorithm: HashAlgorithm,
    commitment: &Commitment,
    nonce: &Nonce,
    policy: &DisclosurePolicy,
    values: &DisclosedValues,
) -> ProofHash {
    let mut frame = FramedFields::new(HashDomain::Disclosure);
    if policy.show_type {
        if let Some(t) = &values.credential_type {
            frame.push_str(FieldTag::CredentialType, t);
        }
    }
    if policy.show_institution {
        if let Some(i) = &values.institution {
            frame.push_str(FieldTag::Institution, i);
        }
    }
    if policy.show_issue_date {
        if let Some(d) = values.issue_date {
            frame.push_u64(FieldTag::IssueDate, d);
        }
    }
    if policy.show_expiry_date {
        if let Some(e) = values.expiry_date {
            frame.push_u64(FieldTag::ExpiryDate, e.as_secs());
        }
    }
    frame
        .push_digest(FieldTag::Commitment, commitment.digest())
        .push(FieldTag::Nonce, nonce.as_bytes())
        .push_address(FieldTag::Issuer, &values.issuer)
        .push_address(FieldTag::Holder, &values.holder);
    ProofHash::new(algorithm.digest(&frame))
}

/// Build a disclosure proof with a fresh nonce.
pub fn disclose<R: RngCore + CryptoRng + ?Sized>(
    credential: &Credential,
    policy: DisclosurePolicy,
    algorithm: HashAlgorithm,
    rng: &mut R,
) -> Result<ProofBundle, EngineError> {
    disclose_with_nonce(credential, policy, algorithm, Nonce::random(rng))
}

/// Build a disclosure proof with a caller-chosen nonce.
pub fn disclose_with_nonce(
    credential: &Credential,
    policy: DisclosurePolicy,
    algorithm: HashAlgorithm,
    nonce: Nonce,
) -> Result<ProofBundle, EngineError> {
    let commitment = credential
        .commitment
        .ok_or(EngineError::NoCommitment(credential.id))?;
    let disclosed = DisclosedValues::from_credential(credential, &policy);
    let proof_hash = proof_hash(algorithm, &commitment, &nonce, &policy, &disclosed);

    Ok(ProofBundle {
        credential_id: Some(credential.id),
        commitment,
        nonce,
        proof_hash,
        algorithm,
        policy,
        disclosed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use credpass_core::Digest32;

    struct CountingRng(u8);

    impl RngCore for CountingRng {
        fn next_u32(&mut self) -> u32 {
            self.next_u64() as u32
        }
        fn next_u64(&mut self) -> u64 {
            let mut b = [0u8; 8];
            self.fill_bytes(&mut b);
            u64::from_le_bytes(b)
        }
        fn fill_bytes(&mut self, dest: &mut [u8]) {
            for b in dest {
                self.0 = self.0.wrapping_add(1);
                *b = self.0;
            }
        }
        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    impl CryptoRng for CountingRng {}

    fn credential() -> Credential {
        Credential {
            id: CredentialId::new(7),
            issuer: Address::from_bytes([0x11; 20]),
            holder: Address::from_bytes([0x22; 20]),
            credential_type: "BSc".into(),
            institution: "Acme U".into(),
            issue_date: 1_700_000_000,
            expiry: Expiry::from_secs(1_900_000_000),
            revoked: false,
            metadata_uri: None,
            commitment: Some(Commitment::new(Digest32::from_bytes([0x0c; 32]))),
        }
    }

    #[test]
    fn default_policy_reveals_type_only() {
        let bundle = disclose_with_nonce(
            &credential(),
            DisclosurePolicy::default(),
            HashAlgorithm::default(),
            Nonce::from_bytes([1; 32]),
        )
        .unwrap();
        assert_eq!(bundle.disclosed.credential_type.as_deref(), Some("BSc"));
        assert!(bundle.disclosed.institution.is_none());
        assert!(bundle.disclosed.issue_date.is_none());
        assert!(bundle.disclosed.expiry_date.is_none());
        assert!(bundle.disclosed.conforms_to(&bundle.policy));
        assert_eq!(bundle.recompute_hash(), bundle.proof_hash);
    }

    #[test]
    fn missing_commitment_is_an_error() {
        let mut c = credential();
        c.commitment = None;
        let err = disclose_with_nonce(
            &c,
            DisclosurePolicy::default(),
            HashAlgorithm::default(),
            Nonce::from_bytes([1; 32]),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::NoCommitment(id) if id == CredentialId::new(7)));
    }

    #[test]
    fn fresh_nonces_give_distinct_hashes() {
        let mut rng = CountingRng(0);
        let a = disclose(&credential(), DisclosurePolicy::all(), HashAlgorithm::default(), &mut rng)
            .unwrap();
        let b = disclose(&credential(), DisclosurePolicy::all(), HashAlgorithm::default(), &mut rng)
            .unwrap();
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.proof_hash, b.proof_hash);
        assert_eq!(a.commitment, b.commitment);
    }

    #[test]
    fn display_only_flags_do_not_change_the_hash() {
        let nonce = Nonce::from_bytes([5; 32]);
        let plain = disclose_with_nonce(
            &credential(),
            DisclosurePolicy::default(),
            HashAlgorithm::default(),
            nonce,
        )
        .unwrap();
        let showing = disclose_with_nonce(
            &credential(),
            DisclosurePolicy {
                show_holder: true,
                show_issuer: true,
                ..DisclosurePolicy::default()
            },
            HashAlgorithm::default(),
            nonce,
        )
        .unwrap();
        assert_eq!(plain.proof_hash, showing.proof_hash);
    }

    #[test]
    fn withheld_value_cannot_be_relabelled() {
        let nonce = Nonce::from_bytes([5; 32]);
        let mut c = credential();
        c.institution = "BSc".into();
        let type_only = disclose_with_nonce(
            &c,
            DisclosurePolicy::default(),
            HashAlgorithm::default(),
            nonce,
        )
        .unwrap();
        let institution_only = disclose_with_nonce(
            &c,
            DisclosurePolicy {
                show_type: false,
                show_institution: true,
                ..DisclosurePolicy::default()
            },
            HashAlgorithm::default(),
            nonce,
        )
        .unwrap();
        assert_ne!(type_only.proof_hash, institution_only.proof_hash);
    }

    #[test]
    fn bundle_wire_format() {
        let bundle = disclose_with_nonce(
            &credential(),
            DisclosurePolicy {
                show_expiry_date: true,
                ..DisclosurePolicy::default()
            },
            HashAlgorithm::Sha256,
            Nonce::from_bytes([0xab; 32]),
        )
        .unwrap();
        let json = serde_json::to_value(&bundle).unwrap();
        assert_eq!(json["credentialId"], 7);
        assert_eq!(json["algorithm"], "sha256");
        assert_eq!(json["nonce"], format!("0x{}", "ab".repeat(32)));
        assert_eq!(json["disclosedFields"]["showType"], true);
        assert_eq!(json["disclosedFields"]["showExpiryDate"], true);
        assert_eq!(json["disclosedValues"]["credentialType"], "BSc");
        assert_eq!(json["disclosedValues"]["expiryDate"], 1_900_000_000u64);
        assert!(json["disclosedValues"].get("institutionName").is_none());

        let back: ProofBundle = serde_json::from_value(json).unwrap();
        assert_eq!(back, bundle);
    }

    #[test]
    fn policy_fields_default_when_omitted() {
        let policy: DisclosurePolicy =
            serde_json::from_str(r#"{"showInstitution": true}"#).unwrap();
        assert!(policy.show_type);
        assert!(policy.show_institution);
        assert!(!policy.show_issue_date);
    }

    #[test]
    fn share_text_lists_hex_values() {
        let bundle = disclose_with_nonce(
            &credential(),
            DisclosurePolicy::default(),
            HashAlgorithm::default(),
            Nonce::from_bytes([0; 32]),
        )
        .unwrap();
        let text = bundle.share_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Commitment: 0x0c0c"));
        assert!(lines[1].starts_with("Proof Hash: 0x"));
        assert_eq!(lines[2], format!("Nonce: 0x{}", "00".repeat(32)));
    }

    #[test]
    fn nonce_requires_prefix_and_length() {
        assert!(Nonce::parse(&format!("0x{}", "11".repeat(32))).is_ok());
        assert!(Nonce::parse(&"11".repeat(32)).is_err());
        assert!(Nonce::parse("0x1234").is_err());
    }
}
