//! # Credential Lifecycle
//!
//! ## Endpoints
//!
//! - `POST /v1/credentials` — Issue a credential (registered issuers).
//! - `GET  /v1/credentials` — Credentials held or issued by the caller.
//! - `GET  /v1/credentials/:id/status` — Resolve status.
//! - `GET  /v1/credentials/:id/commitment` — Audit the anchored commitment.
//! - `POST /v1/credentials/:id/verify` — Full-disclosure verification.
//! - `POST /v1/credentials/:id/revoke` — Revoke (issuing issuer only).
//! - `POST /v1/credentials/:id/disclosures` — Generate a disclosure proof.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use credpass_core::{Commitment, Credential, CredentialId, CredentialStatus};
use credpass_engine::{
    CommitmentAudit, CommitmentScheme, DisclosurePolicy, IssueCredential, ProofBundle,
    VerificationResult,
};

use crate::auth::Caller;
use crate::error::AppError;
use crate::extractors::{extract_json, parse_credential_id};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub credential_id: CredentialId,
    pub status: CredentialStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct AuditQuery {
    #[serde(default)]
    pub legacy: bool,
}

/// Outcome of re-deriving a credential's commitment.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditResponse {
    pub credential_id: CredentialId,
    pub scheme: CommitmentScheme,
    pub matches: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<Commitment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded: Option<Commitment>,
}

/// A freshly generated proof plus its copy/paste rendering.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisclosureResponse {
    pub bundle: ProofBundle,
    pub share_text: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/credentials",
            post(issue_credential).get(list_credentials),
        )
        .route("/v1/credentials/:id/status", get(credential_status))
        .route("/v1/credentials/:id/commitment", get(audit_commitment))
        .route("/v1/credentials/:id/verify", post(verify_credential))
        .route("/v1/credentials/:id/revoke", post(revoke_credential))
        .route("/v1/credentials/:id/disclosures", post(generate_disclosure))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn issue_credential(
    State(state): State<AppState>,
    Caller(principal): Caller,
    body: Result<Json<IssueCredential>, JsonRejection>,
) -> Result<(StatusCode, Json<Credential>), AppError> {
    let req = extract_json(body)?;
    let credential = state.service.issue_credential(&principal, req).await?;
    Ok((StatusCode::CREATED, Json(credential)))
}

async fn list_credentials(
    State(state): State<AppState>,
    Caller(principal): Caller,
) -> Result<Json<Vec<Credential>>, AppError> {
    Ok(Json(state.service.list_credentials(&principal).await?))
}

async fn credential_status(
    State(state): State<AppState>,
    Caller(principal): Caller,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, AppError> {
    let id = parse_credential_id(&id)?;
    let status = state.service.resolve_status(&principal, id).await?;
    Ok(Json(StatusResponse {
        credential_id: id,
        status,
    }))
}

async fn audit_commitment(
    State(state): State<AppState>,
    Caller(principal): Caller,
    Path(id): Path<String>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<AuditResponse>, AppError> {
    let id = parse_credential_id(&id)?;
    let scheme = if query.legacy {
        CommitmentScheme::LegacyDelimited
    } else {
        CommitmentScheme::Framed(state.service.config().algorithm)
    };
    let audit = state.service.audit_commitment(&principal, id, scheme).await?;
    let (expected, recorded) = match audit {
        CommitmentAudit::Mismatch { expected, recorded } => (Some(expected), Some(recorded)),
        CommitmentAudit::Matches | CommitmentAudit::Absent => (None, None),
    };
    Ok(Json(AuditResponse {
        credential_id: id,
        scheme,
        matches: audit.is_match(),
        expected,
        recorded,
    }))
}

async fn verify_credential(
    State(state): State<AppState>,
    Caller(principal): Caller,
    Path(id): Path<String>,
) -> Result<Json<VerificationResult>, AppError> {
    let id = parse_credential_id(&id)?;
    Ok(Json(
        state.service.verify_credential_by_id(&principal, id).await?,
    ))
}

async fn revoke_credential(
    State(state): State<AppState>,
    Caller(principal): Caller,
    Path(id): Path<String>,
) -> Result<Json<Credential>, AppError> {
    let id = parse_credential_id(&id)?;
    Ok(Json(state.service.revoke_credential(&principal, id).await?))
}

/// The body is the disclosure policy; `{}` selects the default (type only).
async fn generate_disclosure(
    State(state): State<AppState>,
    Caller(principal): Caller,
    Path(id): Path<String>,
    body: Result<Json<DisclosurePolicy>, JsonRejection>,
) -> Result<(StatusCode, Json<DisclosureResponse>), AppError> {
    let id = parse_credential_id(&id)?;
    let policy = extract_json(body)?;
    let bundle = state
        .service
        .generate_disclosure_proof(&principal, id, policy)
        .await?;
    let share_text = bundle.share_text();
    Ok((
        StatusCode::CREATED,
        Json(DisclosureResponse { bundle, share_text }),
    ))
}
