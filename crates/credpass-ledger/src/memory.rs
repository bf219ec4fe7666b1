//! # In-Memory Ledger
//!
//! A process-local [`Ledger`] that enforces the same write rules as the
//! on-chain contract:
//!
//! - issuance requires a registered issuer;
//! - ids are assigned sequentially from 1 and never reused;
//! - a commitment binds at most one credential (a second issuance with the
//!   same commitment is rejected, not overwritten);
//! - revocation is issuer-only and monotonic.
//!
//! State can be seeded from, and written back to, a JSON [`LedgerSnapshot`].

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use credpass_core::{Address, Commitment, Credential, CredentialId, IssuerRegistration};

use crate::error::LedgerError;
use crate::{IssuanceRequest, Ledger};

/// Serialized ledger contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Issuer registry entries.
    #[serde(default)]
    pub issuers: Vec<IssuerRegistration>,
    /// Credential records.
    #[serde(default)]
    pub credentials: Vec<Credential>,
}

#[derive(Debug, Default)]
struct LedgerState {
    credentials: BTreeMap<CredentialId, Credential>,
    by_commitment: HashMap<Commitment, CredentialId>,
    issuers: BTreeMap<Address, IssuerRegistration>,
    next_id: u64,
}

impl LedgerState {
    fn insert(&mut self, credential: Credential) -> Result<(), LedgerError> {
        let following = credential
            .id
            .value()
            .checked_add(1)
            .ok_or(LedgerError::IdSpaceExhausted)?;
        if let Some(commitment) = credential.commitment {
            if self.by_commitment.contains_key(&commitment) {
                return Err(LedgerError::DuplicateCommitment(commitment));
            }
            self.by_commitment.insert(commitment, credential.id);
        }
        self.next_id = self.next_id.max(following);
        self.credentials.insert(credential.id, credential);
        Ok(())
    }
}

/// Thread-safe in-memory ledger. Cloning shares the underlying state.
#[derive(Debug, Clone)]
pub struct InMemoryLedger {
    state: Arc<RwLock<LedgerState>>,
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(LedgerState {
                next_id: 1,
                ..LedgerState::default()
            })),
        }
    }

    /// Build a ledger from a snapshot, rejecting duplicate ids or commitments.
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Result<Self, LedgerError> {
        let ledger = Self::new();
        {
            let mut state = ledger.state.write();
            for reg in snapshot.issuers {
                state.issuers.insert(reg.address, reg);
            }
            for credential in snapshot.credentials {
                if state.credentials.contains_key(&credential.id) {
                    return Err(LedgerError::Snapshot {
                        path: "<snapshot>".into(),
                        reason: format!("duplicate credential id {}", credential.id),
                    });
                }
                state.insert(credential).map_err(|e| match e {
                    LedgerError::IdSpaceExhausted => LedgerError::Snapshot {
                        path: "<snapshot>".into(),
                        reason: "credential id exhausts id space".into(),
                    },
                    other => other,
                })?;
            }
        }
        Ok(ledger)
    }

    /// Capture the current contents.
    pub fn snapshot(&self) -> LedgerSnapshot {
        let state = self.state.read();
        LedgerSnapshot {
            issuers: state.issuers.values().cloned().collect(),
            credentials: state.credentials.values().cloned().collect(),
        }
    }

    /// Load a ledger from a JSON snapshot file.
    pub fn load(path: &Path) -> Result<Self, LedgerError> {
        let snapshot_err = |reason: String| LedgerError::Snapshot {
            path: path.display().to_string(),
            reason,
        };
        let raw = std::fs::read_to_string(path).map_err(|e| snapshot_err(e.to_string()))?;
        let snapshot: LedgerSnapshot =
            serde_json::from_str(&raw).map_err(|e| snapshot_err(e.to_string()))?;
        Self::from_snapshot(snapshot)
    }

    /// Write the current contents to a JSON snapshot file.
    pub fn save(&self, path: &Path) -> Result<(), LedgerError> {
        let snapshot_err = |reason: String| LedgerError::Snapshot {
            path: path.display().to_string(),
            reason,
        };
        let json = serde_json::to_string_pretty(&self.snapshot())
            .map_err(|e| snapshot_err(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| snapshot_err(e.to_string()))
    }

    /// Replace a stored credential's revocation flag without issuer checks.
    ///
    /// Fixture helper for exercising status transitions in tests.
    pub fn force_revoke(&self, id: CredentialId) -> Result<(), LedgerError> {
        let mut state = self.state.write();
        let credential = state
            .credentials
            .get_mut(&id)
            .ok_or(LedgerError::CredentialNotFound(id))?;
        credential.mark_revoked();
        Ok(())
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn credential(&self, id: CredentialId) -> Result<Option<Credential>, LedgerError> {
        Ok(self.state.read().credentials.get(&id).cloned())
    }

    async fn credential_by_commitment(
        &self,
        commitment: &Commitment,
    ) -> Result<Option<Credential>, LedgerError> {
        let state = self.state.read();
        Ok(state
            .by_commitment
            .get(commitment)
            .and_then(|id| state.credentials.get(id))
            .cloned())
    }

    async fn holder_credentials(
        &self,
        holder: &Address,
    ) -> Result<Vec<CredentialId>, LedgerError> {
        Ok(self
            .state
            .read()
            .credentials
            .values()
            .filter(|c| c.is_held_by(holder))
            .map(|c| c.id)
            .collect())
    }

    async fn issuer_credentials(
        &self,
        issuer: &Address,
    ) -> Result<Vec<CredentialId>, LedgerError> {
        Ok(self
            .state
            .read()
            .credentials
            .values()
            .filter(|c| c.is_issued_by(issuer))
            .map(|c| c.id)
            .collect())
    }

    async fn issuer_registration(
        &self,
        issuer: &Address,
    ) -> Result<Option<IssuerRegistration>, LedgerError> {
        Ok(self.state.read().issuers.get(issuer).cloned())
    }

    async fn issuers(&self) -> Result<Vec<IssuerRegistration>, LedgerError> {
        Ok(self.state.read().issuers.values().cloned().collect())
    }

    async fn issue_credential(
        &self,
        request: IssuanceRequest,
    ) -> Result<CredentialId, LedgerError> {
        let mut state = self.state.write();

        let registered = state
            .issuers
            .get(&request.issuer)
            .is_some_and(|r| r.registered);
        if !registered {
            return Err(LedgerError::IssuerNotRegistered(request.issuer));
        }

        let id = CredentialId::new(state.next_id);
        state.insert(Credential {
            id,
            issuer: request.issuer,
            holder: request.holder,
            credential_type: request.credential_type,
            institution: request.institution,
            issue_date: request.issue_date,
            expiry: request.expiry,
            revoked: false,
            metadata_uri: request.metadata_uri,
            commitment: request.commitment.filter(|c| !c.is_zero()),
        })?;

        tracing::debug!(credential_id = %id, "in-memory ledger recorded credential");
        Ok(id)
    }

    async fn revoke_credential(
        &self,
        issuer: &Address,
        id: CredentialId,
    ) -> Result<(), LedgerError> {
        let mut state = self.state.write();
        let credential = state
            .credentials
            .get_mut(&id)
            .ok_or(LedgerError::CredentialNotFound(id))?;
        if !credential.is_issued_by(issuer) {
            return Err(LedgerError::NotCredentialIssuer {
                id,
                caller: *issuer,
            });
        }
        credential.mark_revoked();
        Ok(())
    }

    async fn register_issuer(&self, issuer: &Address, name: &str) -> Result<(), LedgerError> {
        self.state.write().issuers.insert(
            *issuer,
            IssuerRegistration {
                address: *issuer,
                name: name.to_string(),
                registered: true,
            },
        );
        Ok(())
    }

    async fn deregister_issuer(&self, issuer: &Address) -> Result<(), LedgerError> {
        if let Some(reg) = self.state.write().issuers.get_mut(issuer) {
            reg.registered = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use credpass_core::{Digest32, Expiry};

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    fn commitment(byte: u8) -> Commitment {
        Commitment::new(Digest32::from_bytes([byte; 32]))
    }

    fn request(issuer: Address, commitment: Option<Commitment>) -> IssuanceRequest {
        IssuanceRequest {
            issuer,
            holder: addr(0x22),
            credential_type: "BSc".into(),
            institution: "Acme U".into(),
            issue_date: 1_700_000_000,
            expiry: Expiry::Never,
            metadata_uri: None,
            commitment,
        }
    }

    async fn ledger_with_issuer() -> InMemoryLedger {
        let ledger = InMemoryLedger::new();
        ledger.register_issuer(&addr(0x11), "Acme U").await.unwrap();
        ledger
    }

    #[tokio::test]
    async fn issuance_assigns_sequential_ids() {
        let ledger = ledger_with_issuer().await;
        let a = ledger
            .issue_credential(request(addr(0x11), Some(commitment(1))))
            .await
            .unwrap();
        let b = ledger
            .issue_credential(request(addr(0x11), Some(commitment(2))))
            .await
            .unwrap();
        assert_eq!(a, CredentialId::new(1));
        assert_eq!(b, CredentialId::new(2));

        let by_commitment = ledger
            .credential_by_commitment(&commitment(2))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_commitment.id, b);
    }

    #[tokio::test]
    async fn unregistered_issuer_cannot_issue() {
        let ledger = InMemoryLedger::new();
        let err = ledger
            .issue_credential(request(addr(0x11), None))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::IssuerNotRegistered(_)));
        assert!(ledger.snapshot().credentials.is_empty());
    }

    #[tokio::test]
    async fn duplicate_commitment_rejected() {
        let ledger = ledger_with_issuer().await;
        ledger
            .issue_credential(request(addr(0x11), Some(commitment(9))))
            .await
            .unwrap();
        let err = ledger
            .issue_credential(request(addr(0x11), Some(commitment(9))))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateCommitment(_)));
        assert_eq!(ledger.snapshot().credentials.len(), 1);
    }

    #[tokio::test]
    async fn zero_commitment_is_not_indexed() {
        let ledger = ledger_with_issuer().await;
        let id = ledger
            .issue_credential(request(addr(0x11), Some(Commitment::new(Digest32::ZERO))))
            .await
            .unwrap();
        let stored = ledger.credential(id).await.unwrap().unwrap();
        assert_eq!(stored.commitment, None);
        // A second zero commitment is not a collision.
        ledger
            .issue_credential(request(addr(0x11), Some(Commitment::new(Digest32::ZERO))))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn revocation_is_issuer_only_and_idempotent() {
        let ledger = ledger_with_issuer().await;
        let id = ledger
            .issue_credential(request(addr(0x11), None))
            .await
            .unwrap();

        let err = ledger.revoke_credential(&addr(0x33), id).await.unwrap_err();
        assert!(matches!(err, LedgerError::NotCredentialIssuer { .. }));

        ledger.revoke_credential(&addr(0x11), id).await.unwrap();
        ledger.revoke_credential(&addr(0x11), id).await.unwrap();
        assert!(ledger.credential(id).await.unwrap().unwrap().revoked);

        let missing = ledger
            .revoke_credential(&addr(0x11), CredentialId::new(99))
            .await
            .unwrap_err();
        assert!(matches!(missing, LedgerError::CredentialNotFound(_)));
    }

    #[tokio::test]
    async fn deregistration_keeps_entry() {
        let ledger = ledger_with_issuer().await;
        assert!(ledger.is_registered_issuer(&addr(0x11)).await.unwrap());
        ledger.deregister_issuer(&addr(0x11)).await.unwrap();
        assert!(!ledger.is_registered_issuer(&addr(0x11)).await.unwrap());
        let reg = ledger.issuer_registration(&addr(0x11)).await.unwrap().unwrap();
        assert_eq!(reg.name, "Acme U");
        assert!(!reg.registered);
    }

    #[tokio::test]
    async fn holder_and_issuer_indexes() {
        let ledger = ledger_with_issuer().await;
        ledger.register_issuer(&addr(0x12), "Other U").await.unwrap();
        let a = ledger.issue_credential(request(addr(0x11), None)).await.unwrap();
        let b = ledger.issue_credential(request(addr(0x12), None)).await.unwrap();

        assert_eq!(ledger.holder_credentials(&addr(0x22)).await.unwrap(), vec![a, b]);
        assert_eq!(ledger.issuer_credentials(&addr(0x12)).await.unwrap(), vec![b]);
        assert!(ledger.holder_credentials(&addr(0x44)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn snapshot_round_trip_through_file() {
        let ledger = ledger_with_issuer().await;
        ledger
            .issue_credential(request(addr(0x11), Some(commitment(4))))
            .await
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        ledger.save(&path).unwrap();

        let restored = InMemoryLedger::load(&path).unwrap();
        assert_eq!(restored.snapshot(), ledger.snapshot());

        // Ids continue after the highest restored id.
        let next = restored
            .issue_credential(request(addr(0x11), Some(commitment(5))))
            .await
            .unwrap();
        assert_eq!(next, CredentialId::new(2));
    }

    fn stored(id: u64, commitment: Commitment) -> Credential {
        Credential {
            id: CredentialId::new(id),
            issuer: addr(0x11),
            holder: addr(0x22),
            credential_type: "BSc".into(),
            institution: "Acme U".into(),
            issue_date: 1,
            expiry: Expiry::Never,
            revoked: false,
            metadata_uri: None,
            commitment: Some(commitment),
        }
    }

    #[test]
    fn snapshot_with_colliding_commitments_rejected() {
        let snapshot = LedgerSnapshot {
            issuers: vec![],
            credentials: vec![stored(1, commitment(7)), stored(2, commitment(7))],
        };
        assert!(matches!(
            InMemoryLedger::from_snapshot(snapshot),
            Err(LedgerError::DuplicateCommitment(_))
        ));
    }

    #[test]
    fn missing_snapshot_file_reports_path() {
        let err = InMemoryLedger::load(Path::new("/nonexistent/ledger.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/ledger.json"));
    }

    #[test]
    fn snapshot_with_largest_id_is_rejected() {
        let snapshot = LedgerSnapshot {
            issuers: vec![],
            credentials: vec![stored(u64::MAX, commitment(7))],
        };
        match InMemoryLedger::from_snapshot(snapshot) {
            Err(LedgerError::Snapshot { reason, .. }) => {
                assert_eq!(reason, "credential id exhausts id space");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn issuance_stops_at_end_of_id_space() {
        let ledger = InMemoryLedger::from_snapshot(LedgerSnapshot {
            issuers: vec![],
            credentials: vec![stored(u64::MAX - 1, commitment(7))],
        })
        .unwrap();
        ledger.register_issuer(&addr(0x11), "Acme U").await.unwrap();

        let err = ledger
            .issue_credential(request(addr(0x11), Some(commitment(8))))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::IdSpaceExhausted));
        assert_eq!(ledger.snapshot().credentials.len(), 1);
        assert!(ledger
            .credential_by_commitment(&commitment(8))
            .await
            .unwrap()
            .is_none());
    }
}
