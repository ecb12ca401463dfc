//! Integration tests for the HTTP token exchanger
//!
//! Runs `HttpTokenExchanger` against a wiremock token endpoint and checks the
//! request form and the mapping of each response shape.

use std::time::Duration;

use grantflow_core::TokenExchanger;
use grantflow_domain::{AppIdentity, ExchangeErrorKind};
use grantflow_infra::{HttpClient, HttpTokenExchanger};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn exchanger_for(server: &MockServer) -> HttpTokenExchanger {
    let client = HttpClient::builder().timeout(Duration::from_secs(2)).build().expect("client");
    HttpTokenExchanger::new(client, format!("{}/oauth/token", server.uri()))
}

fn identity() -> AppIdentity {
    AppIdentity::new("demo").expect("identity")
}

/// Validates `HttpTokenExchanger::exchange` for the authorization code
/// scenario.
///
/// Assertions:
/// - Confirms the form carries the grant type, code, client id and redirect.
/// - Confirms the issued token has both credentials.
#[tokio::test]
async fn test_code_exchange_posts_form_and_parses_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=abc"))
        .and(body_string_contains("client_id=demo"))
        .and(body_string_contains("redirect_uri=grantflowdemo%3A%2F%2Foauth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "access-1",
            "expires_in": 3600,
            "refresh_token": "refresh-1",
            "refresh_token_expires_in": 86400
        })))
        .expect(1)
        .mount(&server)
        .await;

    let token = exchanger_for(&server).exchange_with_code(identity(), "abc").await.expect("token");

    assert_eq!(token.access_token(), "access-1");
    assert_eq!(token.refresh_token(), "refresh-1");
    assert!(token.is_valid());
    assert!(token.has_refresh_token());
}

/// Validates `HttpTokenExchanger::exchange` for the refresh without
/// rotation scenario.
///
/// Assertions:
/// - Confirms the refresh grant is sent with the integrity hash.
/// - Confirms a response without a refresh token yields none.
#[tokio::test]
async fn test_refresh_exchange_without_rotation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh-0"))
        .and(body_string_contains("client_integrity_hash=h4sh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"access_token": "access-2", "expires_in": 60})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let identity = identity().with_client_integrity_hash("h4sh");
    let token = exchanger_for(&server)
        .exchange_with_refresh_token(identity, "refresh-0")
        .await
        .expect("token");

    assert_eq!(token.access_token(), "access-2");
    assert!(!token.has_refresh_token());
}

/// Validates `HttpTokenExchanger::exchange` for the rejected refresh
/// scenario.
///
/// Assertions:
/// - Confirms the `{code, msg}` body becomes a rejection.
/// - Confirms the error is marked as a refresh.
#[tokio::test]
async fn test_rejected_refresh_keeps_provider_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "code": -401,
            "msg": "expired refresh token"
        })))
        .mount(&server)
        .await;

    let err = exchanger_for(&server)
        .exchange_with_refresh_token(identity(), "stale")
        .await
        .unwrap_err();

    assert_eq!(err.kind, ExchangeErrorKind::Rejected { code: -401 });
    assert_eq!(err.message, "expired refresh token");
    assert!(err.refresh);
}

/// Validates `HttpTokenExchanger::exchange` for the slow server scenario.
///
/// Assertions:
/// - Ensures a timeout is reported as a transport failure.
#[tokio::test]
async fn test_timeout_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let client = HttpClient::builder().timeout(Duration::from_millis(100)).build().expect("client");
    let exchanger = HttpTokenExchanger::new(client, format!("{}/oauth/token", server.uri()));

    let err = exchanger.exchange_with_code(identity(), "abc").await.unwrap_err();

    assert_eq!(err.kind, ExchangeErrorKind::Transport);
    assert!(!err.refresh);
}
