//! # credpass-api — HTTP Service
//!
//! Axum service exposing credential commitment, issuance, selective
//! disclosure and verification to remote callers.
//!
//! Every `/v1` route runs behind [`auth::auth_middleware`], which turns the
//! bearer token into a [`credpass_engine::Principal`]. Handlers pass that
//! principal straight to [`credpass_engine::CredentialService`]; role and
//! ownership checks live in the engine, not here.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`auth`] | Bearer token parsing and the `Caller` extractor |
//! | [`error`] | `AppError` and the JSON error body |
//! | [`extractors`] | JSON body and path segment helpers |
//! | [`routes`] | Route handlers |
//! | [`state`] | `AppState` and `AppConfig` |

pub mod auth;
pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;

use axum::middleware::from_fn;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes (`/health/*`) are mounted outside the auth middleware
/// so they remain accessible without credentials.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };

    let api = Router::new()
        .merge(routes::commitments::router())
        .merge(routes::credentials::router())
        .merge(routes::proofs::router())
        .merge(routes::issuers::router())
        .layer(from_fn(auth::auth_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(auth_config))
        .with_state(state);

    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    Router::new().merge(health).merge(api)
}

/// Liveness probe. Returns 200 while the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe. Returns 200 once the router is serving.
async fn readiness() -> &'static str {
    "ready"
}
