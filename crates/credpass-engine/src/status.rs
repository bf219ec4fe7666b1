//! Status Resolver.

use credpass_core::{Credential, CredentialStatus, Timestamp};

/// Resolve a credential's validity at `now`.
///
/// Revocation dominates expiry. A never-expiring credential is valid
/// until revoked; a dated one is expired strictly after its expiry
/// instant, compared at millisecond precision.
pub fn resolve_status(credential: &Credential, now: &Timestamp) -> CredentialStatus {
    if credential.revoked {
        CredentialStatus::Revoked
    } else if credential.expiry.has_passed(now) {
        CredentialStatus::Expired
    } else {
        CredentialStatus::Valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use credpass_core::{Address, CredentialId, Expiry};

    fn credential(expiry: Expiry, revoked: bool) -> Credential {
        Credential {
            id: CredentialId::new(1),
            issuer: Address::from_bytes([1; 20]),
            holder: Address::from_bytes([2; 20]),
            credential_type: "MSc".into(),
            institution: "Acme".into(),
            issue_date: 1_000,
            expiry,
            revoked,
            metadata_uri: None,
            commitment: None,
        }
    }

    fn at_millis(ms: i64) -> Timestamp {
        Timestamp::from_epoch_millis(ms).unwrap()
    }

    #[test]
    fn permanent_credential_is_valid_forever() {
        let c = credential(Expiry::Never, false);
        assert_eq!(resolve_status(&c, &at_millis(4_102_444_800_000)), CredentialStatus::Valid);
    }

    #[test]
    fn expiry_boundary() {
        let c = credential(Expiry::from_secs(2_000), false);
        assert_eq!(resolve_status(&c, &at_millis(1_999_999)), CredentialStatus::Valid);
        assert_eq!(resolve_status(&c, &at_millis(2_000_000)), CredentialStatus::Valid);
        assert_eq!(resolve_status(&c, &at_millis(2_000_001)), CredentialStatus::Expired);
    }

    #[test]
    fn revoked_dominates_expired() {
        let c = credential(Expiry::from_secs(2_000), true);
        assert_eq!(resolve_status(&c, &at_millis(1_000)), CredentialStatus::Revoked);
        assert_eq!(resolve_status(&c, &at_millis(9_000_000)), CredentialStatus::Revoked);
    }

    #[test]
    fn zero_expiry_resolves_valid() {
        let c = credential(Expiry::from_secs(0), false);
        assert_eq!(c.expiry, Expiry::Never);
        assert_eq!(
            resolve_status(&c, &at_millis(1_700_000_000_000)),
            CredentialStatus::Valid
        );
    }
}
