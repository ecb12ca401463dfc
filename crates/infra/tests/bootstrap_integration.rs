//! Integration tests for session bootstrap
//!
//! Builds sessions from a `Config` with real infrastructure (HTTP exchanger
//! against wiremock, file token cache on a temp directory) and fake platform
//! bindings, then drives a login and a restart.

use std::sync::Arc;
use std::time::Duration;

use grantflow_core::acquisition::CompanionMode;
use grantflow_core::testing::{
    identity, redirect_with_code, trusted_companion_config, FakeBrowser, FakeCompanionApp,
    RecordingListener, SessionEvent,
};
use grantflow_domain::{CacheBackend, Config, SessionState};
use grantflow_infra::{build_session, PlatformBindings};
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WAIT: Duration = Duration::from_secs(3);

fn file_backed_config(server: &MockServer, dir: &TempDir) -> Config {
    let mut config = Config::new(identity().app_key(), server.uri());
    config.cache.backend = CacheBackend::File;
    config.cache.directory = Some(dir.path().to_path_buf());
    config
}

async fn mount_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("code=web-code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "access-1",
            "expires_in": 3600,
            "refresh_token": "refresh-1"
        })))
        .expect(1)
        .mount(server)
        .await;
}

/// Validates `build_session` for the browser login then restart scenario.
///
/// Assertions:
/// - Confirms the browser is pointed at the configured authorize endpoint.
/// - Confirms the redirect code is exchanged over HTTP and the session opens.
/// - Confirms a second session built from the same config starts open from
///   the file cache.
#[tokio::test]
async fn test_login_persists_across_sessions() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    let dir = TempDir::new().expect("tempdir");
    let config = file_backed_config(&server, &dir);

    let browser = Arc::new(FakeBrowser::new());
    let session =
        build_session(&config, PlatformBindings::browser_only(browser.clone())).expect("session");
    let listener = RecordingListener::new();

    assert!(!session.initialize(None));
    session.open(Some(listener.clone()));

    grantflow_common::assert_eventually!(WAIT, browser.is_open());
    let opened = browser.opened_urls();
    let authorize = format!("{}/oauth/authorize?client_id=test-app", server.uri());
    assert!(opened[0].as_str().starts_with(&authorize));
    assert!(browser.redirect(redirect_with_code("web-code")));

    grantflow_common::assert_eventually!(WAIT, listener.count() == 1);
    assert_eq!(listener.events(), vec![SessionEvent::Opened]);
    assert_eq!(session.access_token().as_deref(), Some("access-1"));

    let fresh_browser = PlatformBindings::browser_only(Arc::new(FakeBrowser::new()));
    let restarted = build_session(&config, fresh_browser).expect("session");
    assert!(restarted.initialize(None));
    assert_eq!(restarted.state(), SessionState::Open);
    assert_eq!(restarted.access_token().as_deref(), Some("access-1"));
}

/// Validates `build_session` for the disabled companion scenario.
///
/// Assertions:
/// - Ensures a bound companion app is never launched when disabled.
/// - Confirms the browser flow is used instead.
#[tokio::test]
async fn test_disabled_companion_goes_straight_to_browser() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("tempdir");
    let mut config = file_backed_config(&server, &dir);
    config.companion = trusted_companion_config();
    config.companion.enabled = false;

    let companion = Arc::new(
        FakeCompanionApp::new()
            .with_package(CompanionMode::SignedIn, FakeCompanionApp::trusted_package(200))
            .with_package(CompanionMode::SignedOut, FakeCompanionApp::trusted_package(200)),
    );
    let browser = Arc::new(FakeBrowser::new());
    let bindings =
        PlatformBindings::browser_only(browser.clone()).with_companion(companion.clone());
    let session = build_session(&config, bindings).expect("session");

    session.open(None);

    grantflow_common::assert_eventually!(WAIT, browser.is_open());
    assert!(companion.launches().is_empty());
    assert_eq!(session.state(), SessionState::Acquiring);
}
