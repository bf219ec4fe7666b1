//! # REST Ledger Gateway Client
//!
//! Typed client for the HTTP gateway that fronts the credential contract.
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET    | `/v1/credentials/{id}` | credential by id |
//! | GET    | `/v1/credentials?commitment={hex}` | credential by commitment |
//! | GET    | `/v1/holders/{address}/credentials` | ids held by an address |
//! | GET    | `/v1/issuers/{address}/credentials` | ids issued by an address |
//! | GET    | `/v1/issuers` | registry entries |
//! | GET    | `/v1/issuers/{address}` | one registry entry |
//! | POST   | `/v1/credentials` | issue |
//! | POST   | `/v1/credentials/{id}/revoke` | revoke |
//! | PUT    | `/v1/issuers/{address}` | register issuer |
//! | DELETE | `/v1/issuers/{address}` | deregister issuer |
//!
//! Reads map 404 to `Ok(None)`. Writes map 404 and 409 to the matching
//! [`LedgerError`] variant using the gateway's `code` field. 5xx responses
//! are reported as unavailable.
//!
//! Reads, revocation and registry writes are idempotent and are resent on
//! any transport failure. Issuance is resent only when the connection could
//! not be opened; a timed-out issuance surfaces as unavailable, since the
//! gateway may have recorded it.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use credpass_core::{Address, Commitment, Credential, CredentialId, IssuerRegistration};

use crate::config::{ConfigError, HttpLedgerConfig};
use crate::error::LedgerError;
use crate::retry::{send_with_resend, Resend};
use crate::{IssuanceRequest, Ledger};

/// Rejection body returned by the gateway on 4xx responses.
#[derive(Debug, Default, Deserialize)]
struct GatewayRejection {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct IssuedResponse {
    id: CredentialId,
}

#[derive(Debug, Serialize)]
struct RevokeRequest<'a> {
    issuer: &'a Address,
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    name: &'a str,
}

/// Client for the REST ledger gateway.
#[derive(Debug, Clone)]
pub struct HttpLedger {
    http: reqwest::Client,
    base_url: url::Url,
}

impl HttpLedger {
    /// Build a client from configuration.
    pub fn new(config: &HttpLedgerConfig) -> Result<Self, LedgerError> {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(token) = &config.api_token {
            let value = reqwest::header::HeaderValue::from_str(&format!("Bearer {}", token.as_str()))
                .map_err(|e| ConfigError::InvalidToken(e.to_string()))?;
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| LedgerError::Unavailable {
                endpoint: "client_init".into(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    /// GET returning `None` on 404.
    async fn get_optional<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>, LedgerError> {
        let resp = send_with_resend(Resend::AnyFailure, || {
            self.http.get(url).query(query).send()
        })
        .await
        .map_err(|e| unavailable(endpoint, e))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        decode(endpoint, resp).await.map(Some)
    }

    /// GET where 404 is an error.
    async fn get_required<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        url: &str,
    ) -> Result<T, LedgerError> {
        let resp = send_with_resend(Resend::AnyFailure, || self.http.get(url).send())
            .await
            .map_err(|e| unavailable(endpoint, e))?;
        decode(endpoint, resp).await
    }
}

fn unavailable(endpoint: &str, err: reqwest::Error) -> LedgerError {
    LedgerError::Unavailable {
        endpoint: endpoint.to_string(),
        reason: err.to_string(),
    }
}

/// Decode a success body, or classify the failure status.
async fn decode<T: DeserializeOwned>(
    endpoint: &str,
    resp: reqwest::Response,
) -> Result<T, LedgerError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(classify_failure(endpoint, status.as_u16(), &body));
    }
    resp.json().await.map_err(|e| LedgerError::Malformed {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    })
}

/// Check a write response for success, discarding its body.
async fn expect_success(endpoint: &str, resp: reqwest::Response) -> Result<(), LedgerError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }
    let body = resp.text().await.unwrap_or_default();
    Err(classify_failure(endpoint, status.as_u16(), &body))
}

fn classify_failure(endpoint: &str, status: u16, body: &str) -> LedgerError {
    if status >= 500 {
        return LedgerError::Unavailable {
            endpoint: endpoint.to_string(),
            reason: format!("HTTP {status}: {body}"),
        };
    }
    let rejection: GatewayRejection = serde_json::from_str(body).unwrap_or_default();
    let message = if rejection.message.is_empty() {
        body.to_string()
    } else {
        rejection.message
    };
    LedgerError::Rejected {
        endpoint: endpoint.to_string(),
        status,
        message: if rejection.code.is_empty() {
            message
        } else {
            format!("{}: {message}", rejection.code)
        },
    }
}

/// Extract the gateway rejection code from a `Rejected` error, if any.
fn rejection_code(err: &LedgerError) -> Option<&str> {
    match err {
        LedgerError::Rejected { message, .. } => message.split(':').next(),
        _ => None,
    }
}

#[async_trait]
impl Ledger for HttpLedger {
    async fn credential(&self, id: CredentialId) -> Result<Option<Credential>, LedgerError> {
        let endpoint = format!("GET /v1/credentials/{id}");
        let url = self.url(&format!("v1/credentials/{id}"));
        self.get_optional(&endpoint, &url, &[]).await
    }

    async fn credential_by_commitment(
        &self,
        commitment: &Commitment,
    ) -> Result<Option<Credential>, LedgerError> {
        let endpoint = "GET /v1/credentials?commitment";
        let url = self.url("v1/credentials");
        self.get_optional(endpoint, &url, &[("commitment", commitment.to_string())])
            .await
    }

    async fn holder_credentials(
        &self,
        holder: &Address,
    ) -> Result<Vec<CredentialId>, LedgerError> {
        let endpoint = format!("GET /v1/holders/{holder}/credentials");
        let url = self.url(&format!("v1/holders/{holder}/credentials"));
        self.get_required(&endpoint, &url).await
    }

    async fn issuer_credentials(
        &self,
        issuer: &Address,
    ) -> Result<Vec<CredentialId>, LedgerError> {
        let endpoint = format!("GET /v1/issuers/{issuer}/credentials");
        let url = self.url(&format!("v1/issuers/{issuer}/credentials"));
        self.get_required(&endpoint, &url).await
    }

    async fn issuer_registration(
        &self,
        issuer: &Address,
    ) -> Result<Option<IssuerRegistration>, LedgerError> {
        let endpoint = format!("GET /v1/issuers/{issuer}");
        let url = self.url(&format!("v1/issuers/{issuer}"));
        self.get_optional(&endpoint, &url, &[]).await
    }

    async fn issuers(&self) -> Result<Vec<IssuerRegistration>, LedgerError> {
        let endpoint = "GET /v1/issuers";
        let url = self.url("v1/issuers");
        self.get_required(endpoint, &url).await
    }

    async fn issue_credential(
        &self,
        request: IssuanceRequest,
    ) -> Result<CredentialId, LedgerError> {
        let endpoint = "POST /v1/credentials";
        let url = self.url("v1/credentials");

        let resp = send_with_resend(Resend::ConnectFailure, || {
            self.http.post(&url).json(&request).send()
        })
        .await
        .map_err(|e| unavailable(endpoint, e))?;

        match decode::<IssuedResponse>(endpoint, resp).await {
            Ok(issued) => Ok(issued.id),
            Err(err) => Err(match rejection_code(&err) {
                Some("ISSUER_NOT_REGISTERED") => LedgerError::IssuerNotRegistered(request.issuer),
                Some("DUPLICATE_COMMITMENT") => match request.commitment {
                    Some(c) => LedgerError::DuplicateCommitment(c),
                    None => err,
                },
                _ => err,
            }),
        }
    }

    async fn revoke_credential(
        &self,
        issuer: &Address,
        id: CredentialId,
    ) -> Result<(), LedgerError> {
        let endpoint = format!("POST /v1/credentials/{id}/revoke");
        let url = self.url(&format!("v1/credentials/{id}/revoke"));
        let body = RevokeRequest { issuer };

        let resp = send_with_resend(Resend::AnyFailure, || {
            self.http.post(&url).json(&body).send()
        })
        .await
        .map_err(|e| unavailable(&endpoint, e))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(LedgerError::CredentialNotFound(id));
        }
        expect_success(&endpoint, resp).await.map_err(|err| {
            match rejection_code(&err) {
                Some("NOT_CREDENTIAL_ISSUER") => LedgerError::NotCredentialIssuer {
                    id,
                    caller: *issuer,
                },
                _ => err,
            }
        })
    }

    async fn register_issuer(&self, issuer: &Address, name: &str) -> Result<(), LedgerError> {
        let endpoint = format!("PUT /v1/issuers/{issuer}");
        let url = self.url(&format!("v1/issuers/{issuer}"));
        let body = RegisterRequest { name };

        let resp = send_with_resend(Resend::AnyFailure, || {
            self.http.put(&url).json(&body).send()
        })
        .await
        .map_err(|e| unavailable(&endpoint, e))?;
        expect_success(&endpoint, resp).await
    }

    async fn deregister_issuer(&self, issuer: &Address) -> Result<(), LedgerError> {
        let endpoint = format!("DELETE /v1/issuers/{issuer}");
        let url = self.url(&format!("v1/issuers/{issuer}"));

        let resp = send_with_resend(Resend::AnyFailure, || {
            self.http.delete(&url).send()
        })
        .await
        .map_err(|e| unavailable(&endpoint, e))?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        expect_success(&endpoint, resp).await
    }
}
