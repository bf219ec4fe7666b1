//! # Credential Records
//!
//! The ledger's view of an issued credential, its commitment, and issuer
//! registrations.
//!
//! ## Invariants
//!
//! - `id`, `issuer`, `holder`, the text attributes, both dates, and the
//!   commitment are fixed at issuance.
//! - `revoked` only moves from `false` to `true` ([`Credential::mark_revoked`]
//!   has no inverse).
//! - An expiry of `0` on the wire is the "never expires" sentinel and is
//!   modelled as [`Expiry::Never`], not as a date in 1970.
//! - A zero commitment on the wire means "no commitment was requested" and
//!   deserializes to `None`.

use std::num::NonZeroU64;

use serde::{Deserialize, Deserializer, Serialize};

use crate::digest::Digest32;
use crate::error::ValidationError;
use crate::identity::{Address, CredentialId};
use crate::temporal::Timestamp;

/// Maximum byte length of a free-text credential attribute.
pub const MAX_TEXT_FIELD_LEN: usize = 256;

/// Check that a free-text attribute is non-empty and within bounds.
pub fn validate_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    if value.len() > MAX_TEXT_FIELD_LEN {
        return Err(ValidationError::FieldTooLong {
            field,
            len: value.len(),
            max: MAX_TEXT_FIELD_LEN,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Commitment
// ---------------------------------------------------------------------------

/// A credential commitment bound at issuance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Commitment(Digest32);

impl Commitment {
    /// Wrap a digest.
    pub fn new(digest: Digest32) -> Self {
        Self(digest)
    }

    /// Parse a `0x`-prefixed hex commitment.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        Digest32::parse(s).map(Self)
    }

    /// The underlying digest.
    pub fn digest(&self) -> &Digest32 {
        &self.0
    }

    /// Whether this is the zero "no commitment" value.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl std::fmt::Display for Commitment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl std::str::FromStr for Commitment {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn deserialize_commitment<'de, D>(deserializer: D) -> Result<Option<Commitment>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Commitment>::deserialize(deserializer)?;
    Ok(value.filter(|c| !c.is_zero()))
}

// ---------------------------------------------------------------------------
// Expiry
// ---------------------------------------------------------------------------

/// Credential expiry. Serialized as seconds since the epoch, `0` for never.
///
/// The dated variant holds a [`NonZeroU64`], so the sentinel has exactly
/// one representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "u64", into = "u64")]
pub enum Expiry {
    /// The credential never expires.
    #[default]
    Never,
    /// The credential expires at this many seconds since the epoch.
    At(NonZeroU64),
}

impl Expiry {
    /// Interpret a raw ledger value, where `0` means never.
    pub fn from_secs(secs: u64) -> Self {
        NonZeroU64::new(secs).map_or(Self::Never, Self::At)
    }

    /// Raw ledger value, `0` for never.
    pub fn as_secs(&self) -> u64 {
        match self {
            Self::Never => 0,
            Self::At(secs) => secs.get(),
        }
    }

    /// Whether this is the permanent sentinel.
    pub fn is_never(&self) -> bool {
        matches!(self, Self::Never)
    }

    /// Whether the expiry instant lies strictly before `now`.
    ///
    /// Compares at millisecond precision: a credential expiring at second
    /// `s` is still valid at exactly `s * 1000` ms.
    pub fn has_passed(&self, now: &Timestamp) -> bool {
        match self {
            Self::Never => false,
            Self::At(secs) => i128::from(secs.get()) * 1000 < i128::from(now.epoch_millis()),
        }
    }
}

impl From<u64> for Expiry {
    fn from(secs: u64) -> Self {
        Self::from_secs(secs)
    }
}

impl From<Expiry> for u64 {
    fn from(e: Expiry) -> Self {
        e.as_secs()
    }
}

impl std::fmt::Display for Expiry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Never => f.write_str("Permanent"),
            Self::At(secs) => match Timestamp::from_epoch_secs(secs.get()) {
                Ok(ts) => f.write_str(&ts.to_date_string()),
                Err(_) => write!(f, "{secs}"),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Credential
// ---------------------------------------------------------------------------

/// The attributes a commitment binds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialFields {
    /// Credential type, e.g. "BSc Computer Science".
    pub credential_type: String,
    /// Issuing institution name.
    #[serde(rename = "institutionName")]
    pub institution: String,
    /// Issue date, seconds since epoch.
    pub issue_date: u64,
    /// Holder address.
    pub holder: Address,
    /// Issuer address.
    pub issuer: Address,
}

impl CredentialFields {
    /// Validate text attributes and reject the zero address.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_text("credentialType", &self.credential_type)?;
        validate_text("institutionName", &self.institution)?;
        for address in [&self.holder, &self.issuer] {
            if address.is_zero() {
                return Err(ValidationError::InvalidAddress(address.to_hex()));
            }
        }
        Ok(())
    }
}

/// An issued credential as recorded on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    /// Ledger-assigned identifier.
    pub id: CredentialId,
    /// Issuing principal.
    pub issuer: Address,
    /// Holding principal.
    pub holder: Address,
    /// Credential type.
    pub credential_type: String,
    /// Issuing institution name.
    #[serde(rename = "institutionName")]
    pub institution: String,
    /// Issue date, seconds since epoch.
    pub issue_date: u64,
    /// Expiry, `0` on the wire for never.
    #[serde(rename = "expiryDate", default)]
    pub expiry: Expiry,
    /// Revocation flag. Monotonic.
    #[serde(default)]
    pub revoked: bool,
    /// Opaque external metadata reference.
    #[serde(default, rename = "metadataURI", skip_serializing_if = "Option::is_none")]
    pub metadata_uri: Option<String>,
    /// Issuance commitment, `None` when none was requested.
    #[serde(default, deserialize_with = "deserialize_commitment")]
    pub commitment: Option<Commitment>,
}

impl Credential {
    /// The attributes bound by this credential's commitment.
    pub fn fields(&self) -> CredentialFields {
        CredentialFields {
            credential_type: self.credential_type.clone(),
            institution: self.institution.clone(),
            issue_date: self.issue_date,
            holder: self.holder,
            issuer: self.issuer,
        }
    }

    /// Whether `address` holds this credential.
    pub fn is_held_by(&self, address: &Address) -> bool {
        self.holder == *address
    }

    /// Whether `address` issued this credential.
    pub fn is_issued_by(&self, address: &Address) -> bool {
        self.issuer == *address
    }

    /// Set the revocation flag. There is no way to clear it.
    pub fn mark_revoked(&mut self) {
        self.revoked = true;
    }
}

/// A recognised issuer in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuerRegistration {
    /// Issuer address.
    pub address: Address,
    /// Display name, usually the institution.
    pub name: String,
    /// Whether the issuer is currently recognised.
    pub registered: bool,
}

/// Tri-state credential validity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialStatus {
    /// Neither revoked nor expired.
    Valid,
    /// Past its expiry date.
    Expired,
    /// Revoked by its issuer.
    Revoked,
}

impl CredentialStatus {
    /// Return the string representation of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Expired => "expired",
            Self::Revoked => "revoked",
        }
    }

    /// Whether this is [`CredentialStatus::Valid`].
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

impl std::fmt::Display for CredentialStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    fn sample() -> Credential {
        Credential {
            id: CredentialId::new(1),
            issuer: addr(0x11),
            holder: addr(0x22),
            credential_type: "BSc".into(),
            institution: "Acme U".into(),
            issue_date: 1_700_000_000,
            expiry: Expiry::Never,
            revoked: false,
            metadata_uri: None,
            commitment: Some(Commitment::new(Digest32::from_bytes([7; 32]))),
        }
    }

    #[test]
    fn wire_format_uses_ledger_field_names() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["credentialType"], "BSc");
        assert_eq!(json["institutionName"], "Acme U");
        assert_eq!(json["issueDate"], 1_700_000_000u64);
        assert_eq!(json["expiryDate"], 0);
        assert!(json.get("metadataURI").is_none());
        let back: Credential = serde_json::from_value(json).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn zero_commitment_deserializes_as_none() {
        let mut json = serde_json::to_value(sample()).unwrap();
        json["commitment"] = serde_json::Value::String(Digest32::ZERO.to_hex());
        let cred: Credential = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(cred.commitment, None);

        json["commitment"] = serde_json::Value::Null;
        let cred: Credential = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(cred.commitment, None);

        json.as_object_mut().unwrap().remove("commitment");
        let cred: Credential = serde_json::from_value(json).unwrap();
        assert_eq!(cred.commitment, None);
    }

    #[test]
    fn expiry_zero_is_never() {
        assert_eq!(Expiry::from_secs(0), Expiry::Never);
        assert_eq!(Expiry::from_secs(5).as_secs(), 5);
        assert_eq!(Expiry::Never.to_string(), "Permanent");
        assert_eq!(Expiry::from_secs(1_700_000_000).to_string(), "2023-11-14");
    }

    #[test]
    fn zero_expiry_never_passes_and_survives_reload() {
        let now = Timestamp::from_epoch_secs(1_700_000_000).unwrap();
        let expiry = Expiry::from_secs(0);
        assert!(expiry.is_never());
        assert!(!expiry.has_passed(&now));

        let mut cred = sample();
        cred.expiry = expiry;
        let json = serde_json::to_value(&cred).unwrap();
        assert_eq!(json["expiryDate"], 0);
        let back: Credential = serde_json::from_value(json).unwrap();
        assert_eq!(back.expiry, Expiry::Never);
        assert!(!back.expiry.has_passed(&now));
    }

    #[test]
    fn expiry_comparison_is_strict_at_millisecond_precision() {
        let expiry = Expiry::from_secs(1_000);
        let at = Timestamp::from_epoch_millis(1_000_000).unwrap();
        let after = Timestamp::from_epoch_millis(1_000_001).unwrap();
        assert!(!expiry.has_passed(&at));
        assert!(expiry.has_passed(&after));
        assert!(!Expiry::Never.has_passed(&after));
    }

    #[test]
    fn revocation_is_one_way() {
        let mut cred = sample();
        cred.mark_revoked();
        cred.mark_revoked();
        assert!(cred.revoked);
    }

    #[test]
    fn fields_validation() {
        let fields = sample().fields();
        assert!(fields.validate().is_ok());

        let mut blank = fields.clone();
        blank.credential_type = "   ".into();
        assert!(matches!(
            blank.validate(),
            Err(ValidationError::EmptyField { field: "credentialType" })
        ));

        let mut long = fields.clone();
        long.institution = "x".repeat(MAX_TEXT_FIELD_LEN + 1);
        assert!(matches!(
            long.validate(),
            Err(ValidationError::FieldTooLong { .. })
        ));

        let mut zero = fields;
        zero.holder = Address::from_bytes([0; 20]);
        assert!(matches!(
            zero.validate(),
            Err(ValidationError::InvalidAddress(_))
        ));
    }

    #[test]
    fn status_strings() {
        assert_eq!(CredentialStatus::Revoked.to_string(), "revoked");
        assert!(CredentialStatus::Valid.is_valid());
        assert_eq!(
            serde_json::to_string(&CredentialStatus::Expired).unwrap(),
            "\"expired\""
        );
    }
}
