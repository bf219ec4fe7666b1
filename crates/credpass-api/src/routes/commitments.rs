//! # Commitment Computation
//!
//! `POST /v1/commitments` hashes a set of credential fields without
//! touching the ledger. Issuers use it to preview the value a credential
//! will be anchored under; auditors use the `legacy` flag to reproduce
//! commitments anchored by the earlier delimited scheme.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use credpass_core::{Commitment, CredentialFields, HashAlgorithm};
use credpass_engine::CommitmentScheme;

use crate::auth::Caller;
use crate::error::AppError;
use crate::extractors::extract_json;
use crate::state::AppState;

/// Request body: the five committed fields plus scheme selection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitmentRequest {
    #[serde(flatten)]
    pub fields: CredentialFields,
    /// Use the legacy pipe-delimited scheme.
    #[serde(default)]
    pub legacy: bool,
    /// Hash for the framed scheme. Defaults to the service's configured hash.
    #[serde(default)]
    pub algorithm: Option<HashAlgorithm>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommitmentResponse {
    pub commitment: Commitment,
    pub scheme: CommitmentScheme,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/commitments", post(compute_commitment))
}

async fn compute_commitment(
    State(state): State<AppState>,
    Caller(principal): Caller,
    body: Result<Json<CommitmentRequest>, JsonRejection>,
) -> Result<Json<CommitmentResponse>, AppError> {
    let req = extract_json(body)?;
    let scheme = if req.legacy {
        CommitmentScheme::LegacyDelimited
    } else {
        CommitmentScheme::Framed(
            req.algorithm
                .unwrap_or(state.service.config().algorithm),
        )
    };
    let commitment = state
        .service
        .compute_commitment(&principal, &req.fields, scheme)?;
    Ok(Json(CommitmentResponse { commitment, scheme }))
}
