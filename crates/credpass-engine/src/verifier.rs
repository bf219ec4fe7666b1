//! # Proof Verifier
//!
//! Checks a [`ProofBundle`] against ledger state, or a credential id in
//! full-disclosure mode. Both produce a [`VerificationResult`]; only ledger
//! unavailability surfaces as an error.
//!
//! ## Proof check order
//!
//! 1. Recompute the proof hash from the bundle. Mismatch → `PROOF_MISMATCH`.
//! 2. Look the commitment up. Absent → `UNKNOWN_COMMITMENT`.
//! 3. Compare presented issuer, holder, and disclosed values with the
//!    record. Any difference → `BINDING_MISMATCH`.
//! 4. Resolve status. `REVOKED` takes precedence over `EXPIRED`.
//! 5. Check the issuer registry. Unregistered → `ISSUER_NOT_REGISTERED`.
//!
//! The first failing step determines the reason.

use serde::{Deserialize, Serialize};

use credpass_core::{
    Address, Credential, CredentialId, CredentialStatus, Expiry, Timestamp,
};
use credpass_ledger::Ledger;

use crate::disclosure::{DisclosurePolicy, DisclosedValues, ProofBundle};
use crate::error::{EngineError, FailureReason};
use crate::status::resolve_status;

/// Attributes shown to a verifier, filtered by the bundle's policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisclosedAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_type: Option<String>,
    #[serde(default, rename = "institutionName", skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<Expiry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holder: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<Address>,
}

impl DisclosedAttributes {
    fn shown(values: &DisclosedValues, policy: &DisclosurePolicy) -> Self {
        Self {
            credential_type: values.credential_type.clone(),
            institution: values.institution.clone(),
            issue_date: values.issue_date,
            expiry_date: values.expiry_date,
            holder: policy.show_holder.then_some(values.holder),
            issuer: policy.show_issuer.then_some(values.issuer),
        }
    }
}

/// Outcome of a verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_id: Option<CredentialId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<FailureReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CredentialStatus>,
    /// Present on a valid proof verification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disclosed: Option<DisclosedAttributes>,
    /// Present on a valid full-disclosure verification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<Credential>,
}

impl VerificationResult {
    fn failed(reason: FailureReason, credential_id: Option<CredentialId>) -> Self {
        tracing::info!(
            reason = reason.as_str(),
            credential_id = credential_id.map(|id| id.value()),
            "verification failed"
        );
        Self {
            valid: false,
            credential_id,
            reason: Some(reason),
            status: None,
            disclosed: None,
            credential: None,
        }
    }

    fn with_status(mut self, status: CredentialStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Human-readable explanation of a failure, if any.
    pub fn explanation(&self) -> Option<&'static str> {
        self.reason.map(|r| r.description())
    }
}

/// Evaluate status and issuer registration for a fetched credential.
async fn check_standing(
    ledger: &dyn Ledger,
    credential: &Credential,
    now: &Timestamp,
) -> Result<Option<VerificationResult>, EngineError> {
    let status = resolve_status(credential, now);
    let reason = match status {
        CredentialStatus::Revoked => Some(FailureReason::Revoked),
        CredentialStatus::Expired => Some(FailureReason::Expired),
        CredentialStatus::Valid => None,
    };
    if let Some(reason) = reason {
        return Ok(Some(
            VerificationResult::failed(reason, Some(credential.id)).with_status(status),
        ));
    }
    if !ledger.is_registered_issuer(&credential.issuer).await? {
        return Ok(Some(
            VerificationResult::failed(FailureReason::IssuerNotRegistered, Some(credential.id))
                .with_status(status),
        ));
    }
    Ok(None)
}

/// Verify a disclosure proof against the ledger at `now`.
pub async fn verify_proof(
    ledger: &dyn Ledger,
    bundle: &ProofBundle,
    now: &Timestamp,
) -> Result<VerificationResult, EngineError> {
    if !bundle.disclosed.conforms_to(&bundle.policy)
        || bundle.recompute_hash() != bundle.proof_hash
    {
        return Ok(VerificationResult::failed(FailureReason::ProofMismatch, None));
    }

    let Some(credential) = ledger.credential_by_commitment(&bundle.commitment).await? else {
        return Ok(VerificationResult::failed(FailureReason::UnknownCommitment, None));
    };

    let id_agrees = bundle.credential_id.map_or(true, |id| id == credential.id);
    if !id_agrees || !bundle.disclosed.agrees_with(&credential) {
        return Ok(VerificationResult::failed(
            FailureReason::BindingMismatch,
            Some(credential.id),
        ));
    }

    if let Some(failure) = check_standing(ledger, &credential, now).await? {
        return Ok(failure);
    }

    tracing::info!(credential_id = credential.id.value(), "proof verified");
    Ok(VerificationResult {
        valid: true,
        credential_id: Some(credential.id),
        reason: None,
        status: Some(CredentialStatus::Valid),
        disclosed: Some(DisclosedAttributes::shown(&bundle.disclosed, &bundle.policy)),
        credential: None,
    })
}

/// Verify a credential by id, disclosing its full record when valid.
pub async fn verify_credential_by_id(
    ledger: &dyn Ledger,
    id: CredentialId,
    now: &Timestamp,
) -> Result<VerificationResult, EngineError> {
    let Some(credential) = ledger.credential(id).await? else {
        return Ok(VerificationResult::failed(FailureReason::UnknownCredential, Some(id)));
    };

    if let Some(failure) = check_standing(ledger, &credential, now).await? {
        return Ok(failure);
    }

    tracing::info!(credential_id = id.value(), "credential verified");
    Ok(VerificationResult {
        valid: true,
        credential_id: Some(id),
        reason: None,
        status: Some(CredentialStatus::Valid),
        disclosed: None,
        credential: Some(credential),
    })
}
