//! # Proof Verification
//!
//! `POST /v1/proofs/verify` takes a disclosure bundle exactly as the
//! holder shared it and checks it against current ledger state. A proof
//! that fails verification is still a `200` with `valid: false` and a
//! reason; only malformed bundles, permission failures and ledger outages
//! are errors.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};

use credpass_engine::{ProofBundle, VerificationResult};

use crate::auth::Caller;
use crate::error::AppError;
use crate::extractors::extract_json;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/proofs/verify", post(verify_proof))
}

async fn verify_proof(
    State(state): State<AppState>,
    Caller(principal): Caller,
    body: Result<Json<ProofBundle>, JsonRejection>,
) -> Result<Json<VerificationResult>, AppError> {
    let bundle = extract_json(body)?;
    Ok(Json(state.service.verify_proof(&principal, &bundle).await?))
}
