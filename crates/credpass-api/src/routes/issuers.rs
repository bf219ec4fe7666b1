//! # Issuer Registry
//!
//! - `GET    /v1/issuers` — Registered and deregistered issuers.
//! - `PUT    /v1/issuers/:address` — Register or rename (governor).
//! - `DELETE /v1/issuers/:address` — Deregister (governor).

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Deserialize;

use credpass_core::IssuerRegistration;

use crate::auth::Caller;
use crate::error::AppError;
use crate::extractors::{extract_json, parse_address};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterIssuerRequest {
    pub name: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/issuers", get(list_issuers))
        .route(
            "/v1/issuers/:address",
            put(register_issuer).delete(deregister_issuer),
        )
}

async fn list_issuers(
    State(state): State<AppState>,
    Caller(principal): Caller,
) -> Result<Json<Vec<IssuerRegistration>>, AppError> {
    Ok(Json(state.service.list_issuers(&principal).await?))
}

async fn register_issuer(
    State(state): State<AppState>,
    Caller(principal): Caller,
    Path(address): Path<String>,
    body: Result<Json<RegisterIssuerRequest>, JsonRejection>,
) -> Result<Json<IssuerRegistration>, AppError> {
    let address = parse_address(&address)?;
    let req = extract_json(body)?;
    Ok(Json(
        state
            .service
            .register_issuer(&principal, address, &req.name)
            .await?,
    ))
}

async fn deregister_issuer(
    State(state): State<AppState>,
    Caller(principal): Caller,
    Path(address): Path<String>,
) -> Result<StatusCode, AppError> {
    let address = parse_address(&address)?;
    state.service.deregister_issuer(&principal, address).await?;
    Ok(StatusCode::NO_CONTENT)
}
