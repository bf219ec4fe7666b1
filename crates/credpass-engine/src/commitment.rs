//! # Commitment Generator
//!
//! Derives the 32-byte commitment anchored on the ledger at issuance.
//!
//! ## Schemes
//!
//! - [`CommitmentScheme::Framed`]: domain-separated, tagged, length-prefixed
//!   framing over `type, institution, issueDate, holder, issuer`. Every new
//!   commitment uses this scheme.
//! - [`CommitmentScheme::LegacyDelimited`]: Keccak-256 over
//!   `type|institution|issueDate|holder|issuer` with checksummed addresses.
//!   Ambiguous when a field contains `|`, so it exists only to audit
//!   commitments anchored by older clients. Those clients hashed the holder
//!   address as typed, so a legacy audit also accepts the all-lowercase and
//!   all-uppercase spellings of the holder.
//!
//! The expiry date is deliberately outside the commitment: the ledger record
//! is authoritative for expiry, and a proof discloses it separately.

use serde::{Deserialize, Serialize};

use credpass_core::{
    keccak256_legacy_text, Address, Commitment, Credential, CredentialFields, FieldTag, FramedFields,
    HashAlgorithm, HashDomain,
};

use crate::error::EngineError;

/// How a commitment is derived from credential fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scheme", content = "algorithm", rename_all = "snake_case")]
pub enum CommitmentScheme {
    /// Framed fields hashed with the given algorithm.
    Framed(HashAlgorithm),
    /// Pipe-delimited text hashed with Keccak-256. Audit only.
    LegacyDelimited,
}

impl Default for CommitmentScheme {
    fn default() -> Self {
        Self::Framed(HashAlgorithm::default())
    }
}

/// Compute the commitment for a set of credential fields.
///
/// Deterministic and side-effect free. Fields are validated first so that
/// a blank attribute can never be committed to.
pub fn commit(
    fields: &CredentialFields,
    scheme: CommitmentScheme,
) -> Result<Commitment, EngineError> {
    fields.validate()?;
    Ok(commit_validated(fields, scheme))
}

fn commit_validated(fields: &CredentialFields, scheme: CommitmentScheme) -> Commitment {
    match scheme {
        CommitmentScheme::Framed(algorithm) => {
            let mut frame = FramedFields::new(HashDomain::Commitment);
            frame
                .push_str(FieldTag::CredentialType, &fields.credential_type)
                .push_str(FieldTag::Institution, &fields.institution)
                .push_u64(FieldTag::IssueDate, fields.issue_date)
                .push_address(FieldTag::Holder, &fields.holder)
                .push_address(FieldTag::Issuer, &fields.issuer);
            Commitment::new(algorithm.digest(&frame))
        }
        CommitmentScheme::LegacyDelimited => legacy_commit(fields, &fields.holder.to_checksum()),
    }
}

fn legacy_commit(fields: &CredentialFields, holder: &str) -> Commitment {
    let text = format!(
        "{}|{}|{}|{}|{}",
        fields.credential_type,
        fields.institution,
        fields.issue_date,
        holder,
        fields.issuer.to_checksum(),
    );
    Commitment::new(keccak256_legacy_text(&text))
}

/// Holder spellings a legacy client may have hashed: checksummed first.
fn legacy_holder_spellings(holder: &Address) -> [String; 3] {
    let lower = holder.to_hex();
    let upper = format!("0x{}", lower[2..].to_ascii_uppercase());
    [holder.to_checksum(), lower, upper]
}

/// Outcome of re-deriving a credential's recorded commitment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitmentAudit {
    /// The recorded commitment matches the recomputed one.
    Matches,
    /// The recorded commitment differs from the recomputed one.
    Mismatch {
        /// Value recomputed from the record's fields.
        expected: Commitment,
        /// Value anchored on the ledger.
        recorded: Commitment,
    },
    /// The credential carries no commitment.
    Absent,
}

impl CommitmentAudit {
    /// Whether the audit found the commitment consistent.
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Matches)
    }
}

/// Recompute a credential's commitment from its recorded fields under
/// `scheme` and compare it with the anchored value.
pub fn audit_commitment(
    credential: &Credential,
    scheme: CommitmentScheme,
) -> Result<CommitmentAudit, EngineError> {
    let Some(recorded) = credential.commitment else {
        return Ok(CommitmentAudit::Absent);
    };
    let fields = credential.fields();
    let expected = commit(&fields, scheme)?;
    let matches = match scheme {
        CommitmentScheme::Framed(_) => expected == recorded,
        CommitmentScheme::LegacyDelimited => legacy_holder_spellings(&fields.holder)
            .iter()
            .any(|holder| legacy_commit(&fields, holder) == recorded),
    };
    if matches {
        Ok(CommitmentAudit::Matches)
    } else {
        Ok(CommitmentAudit::Mismatch { expected, recorded })
    }
}
