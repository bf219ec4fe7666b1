//! # Credential Service
//!
//! The entry point every surface (HTTP, CLI) goes through. Each operation:
//!
//! 1. checks the principal's role against the permission table,
//! 2. validates its input,
//! 3. touches the ledger,
//! 4. checks ownership where the operation is scoped to own records.
//!
//! Steps 1 and 2 never hash or call the ledger, so a denied or malformed
//! request has no side effects.
//!
//! The service holds no credential state of its own. It is `Clone` and
//! shares the ledger and clock behind `Arc`s, so request handlers can hold
//! a copy each.

use std::sync::Arc;

use rand_core::OsRng;
use serde::{Deserialize, Serialize};

use credpass_core::{
    validate_text, Address, Commitment, Credential, CredentialFields, CredentialId,
    CredentialStatus, Expiry, HashAlgorithm, IssuerRegistration, ValidationError,
};
use credpass_ledger::{IssuanceRequest, Ledger};

use crate::access::{authorize, Operation, Principal, Role};
use crate::clock::{Clock, SystemClock};
use crate::commitment::{self, CommitmentAudit, CommitmentScheme};
use crate::disclosure::{self, DisclosurePolicy, ProofBundle};
use crate::error::EngineError;
use crate::status;
use crate::verifier::{self, VerificationResult};

/// Engine tunables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Hash used for new commitments and proof hashes.
    #[serde(default)]
    pub algorithm: HashAlgorithm,
}

/// Issuance input. The issuer is the calling principal and the issue date
/// is the service clock's current second.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueCredential {
    pub holder: Address,
    pub credential_type: String,
    #[serde(rename = "institutionName")]
    pub institution: String,
    #[serde(rename = "expiryDate", default)]
    pub expiry: Expiry,
    #[serde(default, rename = "metadataURI", skip_serializing_if = "Option::is_none")]
    pub metadata_uri: Option<String>,
}

impl IssueCredential {
    fn fields(&self, issuer: Address, issue_date: u64) -> CredentialFields {
        CredentialFields {
            credential_type: self.credential_type.clone(),
            institution: self.institution.clone(),
            issue_date,
            holder: self.holder,
            issuer,
        }
    }
}

/// Facade over the ledger gating every engine operation.
#[derive(Clone)]
pub struct CredentialService {
    ledger: Arc<dyn Ledger>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
}

impl std::fmt::Debug for CredentialService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CredentialService {
    /// Service over `ledger` with the system clock and default config.
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self {
            ledger,
            clock: Arc::new(SystemClock),
            config: EngineConfig::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Arc<dyn Ledger> {
        &self.ledger
    }

    async fn fetch(&self, id: CredentialId) -> Result<Credential, EngineError> {
        self.ledger
            .credential(id)
            .await?
            .ok_or(EngineError::CredentialNotFound(id))
    }

    // -- Commitments ---------------------------------------------------------

    /// Compute a commitment without touching the ledger.
    pub fn compute_commitment(
        &self,
        principal: &Principal,
        fields: &CredentialFields,
        scheme: CommitmentScheme,
    ) -> Result<Commitment, EngineError> {
        authorize(principal, Operation::ComputeCommitment)?;
        commitment::commit(fields, scheme)
    }

    /// Re-derive a recorded commitment and compare it with the ledger.
    pub async fn audit_commitment(
        &self,
        principal: &Principal,
        id: CredentialId,
        scheme: CommitmentScheme,
    ) -> Result<CommitmentAudit, EngineError> {
        authorize(principal, Operation::VerifyCredential)?;
        let credential = self.fetch(id).await?;
        commitment::audit_commitment(&credential, scheme)
    }

    // -- Issuance & revocation -----------------------------------------------

    /// Issue a credential with a framed commitment.
    ///
    /// The issuer's registration is checked before the write, so an
    /// unregistered issuer never reaches the ledger's issuance path.
    pub async fn issue_credential(
        &self,
        principal: &Principal,
        request: IssueCredential,
    ) -> Result<Credential, EngineError> {
        authorize(principal, Operation::IssueCredential)?;
        let issuer = *principal.require_address()?;

        let issue_date = self.clock.now().epoch_secs();
        let fields = request.fields(issuer, issue_date);
        fields.validate()?;
        if let Expiry::At(expiry) = request.expiry {
            let expiry = expiry.get();
            if expiry <= issue_date {
                return Err(ValidationError::ExpiryBeforeIssue {
                    issue: issue_date,
                    expiry,
                }
                .into());
            }
        }
        let metadata_uri = match request.metadata_uri {
            Some(uri) if uri.trim().is_empty() => None,
            Some(uri) => {
                validate_text("metadataURI", &uri)?;
                Some(uri)
            }
            None => None,
        };

        if !self.ledger.is_registered_issuer(&issuer).await? {
            tracing::warn!(issuer = %issuer, "issuance refused: issuer not registered");
            return Err(EngineError::IssuerNotRegistered(issuer));
        }

        let commitment =
            commitment::commit(&fields, CommitmentScheme::Framed(self.config.algorithm))?;
        let id = self
            .ledger
            .issue_credential(IssuanceRequest {
                issuer,
                holder: fields.holder,
                credential_type: fields.credential_type.clone(),
                institution: fields.institution.clone(),
                issue_date,
                expiry: request.expiry,
                metadata_uri: metadata_uri.clone(),
                commitment: Some(commitment),
            })
            .await?;

        tracing::info!(
            credential_id = id.value(),
            issuer = %issuer,
            holder = %fields.holder,
            commitment = %commitment,
            "credential issued"
        );

        Ok(Credential {
            id,
            issuer,
            holder: fields.holder,
            credential_type: fields.credential_type,
            institution: fields.institution,
            issue_date,
            expiry: request.expiry,
            revoked: false,
            metadata_uri,
            commitment: Some(commitment),
        })
    }

    /// Revoke a credential the principal issued. Idempotent.
    pub async fn revoke_credential(
        &self,
        principal: &Principal,
        id: CredentialId,
    ) -> Result<Credential, EngineError> {
        authorize(principal, Operation::RevokeCredential)?;
        let issuer = *principal.require_address()?;

        let mut credential = self.fetch(id).await?;
        if !credential.is_issued_by(&issuer) {
            return Err(EngineError::NotOwner(format!(
                "{issuer} did not issue credential {id}"
            )));
        }
        self.ledger.revoke_credential(&issuer, id).await?;
        credential.mark_revoked();

        tracing::info!(credential_id = id.value(), issuer = %issuer, "credential revoked");
        Ok(credential)
    }

    // -- Disclosure & verification -------------------------------------------

    /// Build a disclosure proof for one of the holder's credentials.
    pub async fn generate_disclosure_proof(
        &self,
        principal: &Principal,
        id: CredentialId,
        policy: DisclosurePolicy,
    ) -> Result<ProofBundle, EngineError> {
        authorize(principal, Operation::GenerateDisclosure)?;
        let holder = *principal.require_address()?;

        let credential = self.fetch(id).await?;
        if !credential.is_held_by(&holder) {
            return Err(EngineError::NotOwner(format!(
                "{holder} does not hold credential {id}"
            )));
        }
        let bundle = disclosure::disclose(&credential, policy, self.config.algorithm, &mut OsRng)?;

        tracing::debug!(
            credential_id = id.value(),
            proof_hash = %bundle.proof_hash,
            "disclosure proof generated"
        );
        Ok(bundle)
    }

    /// Verify a disclosure proof against current ledger state.
    pub async fn verify_proof(
        &self,
        principal: &Principal,
        bundle: &ProofBundle,
    ) -> Result<VerificationResult, EngineError> {
        authorize(principal, Operation::VerifyProof)?;
        verifier::verify_proof(self.ledger.as_ref(), bundle, &self.clock.now()).await
    }

    /// Verify a credential by id in full-disclosure mode.
    pub async fn verify_credential_by_id(
        &self,
        principal: &Principal,
        id: CredentialId,
    ) -> Result<VerificationResult, EngineError> {
        authorize(principal, Operation::VerifyCredential)?;
        verifier::verify_credential_by_id(self.ledger.as_ref(), id, &self.clock.now()).await
    }

    /// Resolve a credential's status. Holders may only query their own.
    pub async fn resolve_status(
        &self,
        principal: &Principal,
        id: CredentialId,
    ) -> Result<CredentialStatus, EngineError> {
        authorize(principal, Operation::ResolveStatus)?;
        let credential = self.fetch(id).await?;
        if principal.role() == Role::Holder {
            let holder = principal.require_address()?;
            if !credential.is_held_by(holder) {
                return Err(EngineError::NotOwner(format!(
                    "{holder} does not hold credential {id}"
                )));
            }
        }
        Ok(status::resolve_status(&credential, &self.clock.now()))
    }

    /// Credentials held (holder) or issued (issuer) by the principal.
    pub async fn list_credentials(
        &self,
        principal: &Principal,
    ) -> Result<Vec<Credential>, EngineError> {
        authorize(principal, Operation::ReadOwnCredentials)?;
        let address = principal.require_address()?;
        let ids = match principal.role() {
            Role::Holder => self.ledger.holder_credentials(address).await?,
            _ => self.ledger.issuer_credentials(address).await?,
        };

        let mut credentials = Vec::with_capacity(ids.len());
        for id in ids {
            match self.ledger.credential(id).await? {
                Some(credential) => credentials.push(credential),
                None => tracing::warn!(credential_id = id.value(), "indexed credential missing"),
            }
        }
        Ok(credentials)
    }

    // -- Issuer registry -----------------------------------------------------

    pub async fn list_issuers(
        &self,
        principal: &Principal,
    ) -> Result<Vec<IssuerRegistration>, EngineError> {
        authorize(principal, Operation::ListIssuers)?;
        Ok(self.ledger.issuers().await?)
    }

    /// Register or re-register an issuer.
    pub async fn register_issuer(
        &self,
        principal: &Principal,
        issuer: Address,
        name: &str,
    ) -> Result<IssuerRegistration, EngineError> {
        authorize(principal, Operation::ManageIssuers)?;
        validate_text("name", name)?;
        if issuer.is_zero() {
            return Err(ValidationError::InvalidAddress(issuer.to_hex()).into());
        }
        self.ledger.register_issuer(&issuer, name).await?;

        tracing::info!(issuer = %issuer, name, "issuer registered");
        Ok(IssuerRegistration {
            address: issuer,
            name: name.to_string(),
            registered: true,
        })
    }

    /// Withdraw an issuer's recognition. Its credentials stop verifying.
    pub async fn deregister_issuer(
        &self,
        principal: &Principal,
        issuer: Address,
    ) -> Result<(), EngineError> {
        authorize(principal, Operation::ManageIssuers)?;
        self.ledger.deregister_issuer(&issuer).await?;
        tracing::info!(issuer = %issuer, "issuer deregistered");
        Ok(())
    }
}
