//! Contract tests for `HttpLedger` against a mocked REST gateway.
//!
//! | Method | Path | Test |
//! |--------|------|------|
//! | GET    | `/v1/credentials/{id}` | `credential_*` |
//! | GET    | `/v1/credentials?commitment=` | `credential_by_commitment_*` |
//! | GET    | `/v1/holders/{address}/credentials` | `holder_credentials_*` |
//! | GET    | `/v1/issuers/{address}` | `issuer_registration_*` |
//! | POST   | `/v1/credentials` | `issue_*` |
//! | POST   | `/v1/credentials/{id}/revoke` | `revoke_*` |
//! | PUT    | `/v1/issuers/{address}` | `register_issuer_*` |

use std::time::Duration;

use credpass_core::{Address, Commitment, CredentialId, Digest32, Expiry};
use credpass_ledger::{HttpLedger, HttpLedgerConfig, IssuanceRequest, Ledger, LedgerError};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ISSUER: &str = "0x1111111111111111111111111111111111111111";
const HOLDER: &str = "0x2222222222222222222222222222222222222222";
const COMMITMENT: &str = "0x0707070707070707070707070707070707070707070707070707070707070707";

fn issuer() -> Address {
    ISSUER.parse().unwrap()
}

fn holder() -> Address {
    HOLDER.parse().unwrap()
}

fn commitment() -> Commitment {
    COMMITMENT.parse().unwrap()
}

fn credential_json(id: u64) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "issuer": ISSUER,
        "holder": HOLDER,
        "credentialType": "BSc",
        "institutionName": "Acme U",
        "issueDate": 1_700_000_000u64,
        "expiryDate": 0,
        "revoked": false,
        "commitment": COMMITMENT
    })
}

fn test_ledger(mock_server: &MockServer) -> HttpLedger {
    let mut config = HttpLedgerConfig::new(mock_server.uri().parse().unwrap());
    config.api_token = Some(zeroize::Zeroizing::new("gateway-token".into()));
    config.timeout_secs = 5;
    HttpLedger::new(&config).unwrap()
}

fn issuance() -> IssuanceRequest {
    IssuanceRequest {
        issuer: issuer(),
        holder: holder(),
        credential_type: "BSc".into(),
        institution: "Acme U".into(),
        issue_date: 1_700_000_000,
        expiry: Expiry::Never,
        metadata_uri: None,
        commitment: Some(commitment()),
    }
}

// ── GET /v1/credentials/{id} ─────────────────────────────────────────

#[tokio::test]
async fn credential_decodes_record_and_sends_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/credentials/1"))
        .and(header("authorization", "Bearer gateway-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(credential_json(1)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let ledger = test_ledger(&mock_server);
    let credential = ledger
        .credential(CredentialId::new(1))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(credential.id, CredentialId::new(1));
    assert_eq!(credential.institution, "Acme U");
    assert_eq!(credential.expiry, Expiry::Never);
    assert_eq!(credential.commitment, Some(commitment()));
}

#[tokio::test]
async fn credential_returns_none_on_404() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/credentials/42"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let ledger = test_ledger(&mock_server);
    assert!(ledger
        .credential(CredentialId::new(42))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn credential_server_error_is_unavailable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/credentials/1"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&mock_server)
        .await;

    let ledger = test_ledger(&mock_server);
    let err = ledger.credential(CredentialId::new(1)).await.unwrap_err();
    assert!(err.is_unavailable(), "got {err:?}");
}

#[tokio::test]
async fn credential_malformed_body_is_reported() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/credentials/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let ledger = test_ledger(&mock_server);
    let err = ledger.credential(CredentialId::new(1)).await.unwrap_err();
    assert!(matches!(err, LedgerError::Malformed { .. }));
}

// ── GET /v1/credentials?commitment= ──────────────────────────────────

#[tokio::test]
async fn credential_by_commitment_sends_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/credentials"))
        .and(query_param("commitment", COMMITMENT))
        .respond_with(ResponseTemplate::new(200).set_body_json(credential_json(3)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let ledger = test_ledger(&mock_server);
    let credential = ledger
        .credential_by_commitment(&commitment())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(credential.id, CredentialId::new(3));
}

#[tokio::test]
async fn credential_by_commitment_unknown_is_none() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/credentials"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let ledger = test_ledger(&mock_server);
    let other = Commitment::new(Digest32::from_bytes([9; 32]));
    assert!(ledger
        .credential_by_commitment(&other)
        .await
        .unwrap()
        .is_none());
}

// ── GET /v1/holders/{address}/credentials ────────────────────────────

#[tokio::test]
async fn holder_credentials_decodes_ids() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/v1/holders/{HOLDER}/credentials")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([1, 4, 9])))
        .mount(&mock_server)
        .await;

    let ledger = test_ledger(&mock_server);
    let ids = ledger.holder_credentials(&holder()).await.unwrap();
    assert_eq!(
        ids,
        vec![CredentialId::new(1), CredentialId::new(4), CredentialId::new(9)]
    );
}

// ── GET /v1/issuers/{address} ────────────────────────────────────────

#[tokio::test]
async fn issuer_registration_drives_is_registered() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/v1/issuers/{ISSUER}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "address": ISSUER,
            "name": "Acme U",
            "registered": false
        })))
        .mount(&mock_server)
        .await;

    let ledger = test_ledger(&mock_server);
    let reg = ledger.issuer_registration(&issuer()).await.unwrap().unwrap();
    assert_eq!(reg.name, "Acme U");
    assert!(!ledger.is_registered_issuer(&issuer()).await.unwrap());
    assert!(!ledger.is_registered_issuer(&holder()).await.unwrap());
}

// ── POST /v1/credentials ─────────────────────────────────────────────

#[tokio::test]
async fn issue_posts_request_and_returns_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/credentials"))
        .and(body_json(serde_json::json!({
            "issuer": ISSUER,
            "holder": HOLDER,
            "credentialType": "BSc",
            "institutionName": "Acme U",
            "issueDate": 1_700_000_000u64,
            "expiryDate": 0,
            "commitment": COMMITMENT
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({ "id": 12 })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let ledger = test_ledger(&mock_server);
    let id = ledger.issue_credential(issuance()).await.unwrap();
    assert_eq!(id, CredentialId::new(12));
}

#[tokio::test]
async fn issue_maps_gateway_rejection_codes() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/credentials"))
        .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
            "code": "DUPLICATE_COMMITMENT",
            "message": "commitment already bound"
        })))
        .mount(&mock_server)
        .await;

    let ledger = test_ledger(&mock_server);
    let err = ledger.issue_credential(issuance()).await.unwrap_err();
    assert!(matches!(err, LedgerError::DuplicateCommitment(c) if c == commitment()));
}

#[tokio::test]
async fn issue_by_unregistered_issuer_is_typed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/credentials"))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "code": "ISSUER_NOT_REGISTERED",
            "message": "issuer not registered"
        })))
        .mount(&mock_server)
        .await;

    let ledger = test_ledger(&mock_server);
    let err = ledger.issue_credential(issuance()).await.unwrap_err();
    assert!(matches!(err, LedgerError::IssuerNotRegistered(a) if a == issuer()));
}

#[tokio::test]
async fn slow_issue_is_not_resent() {
    let mock_server = MockServer::start().await;

    // The gateway records the credential but answers after the client gave up.
    Mock::given(method("POST"))
        .and(path("/v1/credentials"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(serde_json::json!({ "id": 12 }))
                .set_delay(Duration::from_secs(3)),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/credentials"))
        .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
            "code": "DUPLICATE_COMMITMENT",
            "message": "commitment already bound"
        })))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut config = HttpLedgerConfig::new(mock_server.uri().parse().unwrap());
    config.timeout_secs = 1;
    let ledger = HttpLedger::new(&config).unwrap();

    let err = ledger.issue_credential(issuance()).await.unwrap_err();
    assert!(err.is_unavailable(), "unexpected error: {err:?}");
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 1);
}

// ── POST /v1/credentials/{id}/revoke ─────────────────────────────────

#[tokio::test]
async fn revoke_posts_issuer() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/credentials/5/revoke"))
        .and(body_json(serde_json::json!({ "issuer": ISSUER })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let ledger = test_ledger(&mock_server);
    ledger
        .revoke_credential(&issuer(), CredentialId::new(5))
        .await
        .unwrap();
}

#[tokio::test]
async fn revoke_unknown_credential() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/credentials/5/revoke"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let ledger = test_ledger(&mock_server);
    let err = ledger
        .revoke_credential(&issuer(), CredentialId::new(5))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::CredentialNotFound(id) if id == CredentialId::new(5)));
}

#[tokio::test]
async fn revoke_by_wrong_issuer_is_typed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/credentials/5/revoke"))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "code": "NOT_CREDENTIAL_ISSUER",
            "message": "caller did not issue this credential"
        })))
        .mount(&mock_server)
        .await;

    let ledger = test_ledger(&mock_server);
    let err = ledger
        .revoke_credential(&holder(), CredentialId::new(5))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotCredentialIssuer { .. }));
}

// ── PUT /v1/issuers/{address} ────────────────────────────────────────

#[tokio::test]
async fn register_issuer_puts_name() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path(format!("/v1/issuers/{ISSUER}")))
        .and(body_json(serde_json::json!({ "name": "Acme U" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let ledger = test_ledger(&mock_server);
    ledger.register_issuer(&issuer(), "Acme U").await.unwrap();
}
