//! Interactive authorization-code flow through the callback listener.

use super::common::Harness;
use playforce::ErrorKind;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, ResponseTemplate};

async fn interactive() -> Harness {
    let harness = Harness::new(&[(
        "web",
        json!({ "client_secret": "s", "grant_type": "authorization_code" }),
    )])
    .await;
    assert!(harness.session.select_config("web"));
    harness
}

#[tokio::test]
async fn test_authorization_code_profile_goes_interactive_without_network() {
    let harness = interactive().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&harness.server)
        .await;

    let attempt = harness.session.try_authenticate().await;
    assert!(!attempt.success);
    assert!(attempt.needs_oauth);
}

#[tokio::test]
async fn test_browser_callback_completes_flow() {
    let harness = interactive().await;
    let flow = harness.session.start_oauth_flow().await.unwrap();
    let port = harness.session.callback_port().unwrap();

    let redirect = format!("http://127.0.0.1:{port}/oauth/callback");
    assert_eq!(flow.redirect_uri, redirect);
    assert_eq!(
        flow.authorization_url,
        format!(
            "{}/services/oauth2/authorize?response_type=code&client_id=test-client&redirect_uri={}&prompt=login",
            harness.server.uri(),
            urlencoding::encode(&redirect)
        )
    );

    Mock::given(method("POST"))
        .and(path("/services/oauth2/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "interactive-token",
            "instance_url": harness.server.uri()
        })))
        .expect(1)
        .mount(&harness.server)
        .await;

    let response = reqwest::get(format!("{redirect}?code=abc123")).await.unwrap();
    assert_eq!(response.status(), 200);

    harness.session.complete_oauth_flow(flow).await.unwrap();
    assert!(harness.session.has_valid_token());

    // The listener stays on the same port for later flows.
    let again = harness.session.start_oauth_flow().await.unwrap();
    assert_eq!(again.redirect_uri, redirect);
    assert_eq!(harness.session.callback_port(), Some(port));
}

#[tokio::test]
async fn test_provider_error_fails_flow() {
    let harness = interactive().await;
    let flow = harness.session.start_oauth_flow().await.unwrap();

    let response = reqwest::get(format!(
        "{}?error=access_denied&error_description=end-user+denied+authorization",
        flow.redirect_uri
    ))
    .await
    .unwrap();
    assert_eq!(response.status(), 200);
    assert!(response.text().await.unwrap().contains("access_denied"));

    let err = harness.session.complete_oauth_flow(flow).await.unwrap_err();
    match err.kind {
        ErrorKind::Auth(playforce::auth::ErrorKind::OAuth { error, description }) => {
            assert_eq!(error, "access_denied");
            assert_eq!(description, "end-user denied authorization");
        }
        other => panic!("expected OAuth error, got {other:?}"),
    }
    assert!(!harness.session.has_valid_token());
}

#[tokio::test]
async fn test_malformed_and_unknown_callbacks() {
    let harness = interactive().await;
    let flow = harness.session.start_oauth_flow().await.unwrap();

    let response = reqwest::get(flow.redirect_uri.clone()).await.unwrap();
    assert_eq!(response.status(), 400);

    let port = harness.session.callback_port().unwrap();
    let response = reqwest::get(format!("http://127.0.0.1:{port}/favicon.ico"))
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_superseded_flow_is_interrupted() {
    let harness = interactive().await;
    let first = harness.session.start_oauth_flow().await.unwrap();
    let _second = harness.session.start_oauth_flow().await.unwrap();

    let err = harness.session.complete_oauth_flow(first).await.unwrap_err();
    assert!(matches!(err.kind, ErrorKind::OAuthFlow(_)), "{err:?}");
}

#[tokio::test]
async fn test_exchange_requires_started_flow() {
    let harness = interactive().await;
    let err = harness.session.exchange_auth_code("abc").await.unwrap_err();
    assert!(matches!(err.kind, ErrorKind::OAuthFlow(_)));
}

#[tokio::test]
async fn test_shutdown_stops_listener() {
    let harness = interactive().await;
    let flow = harness.session.start_oauth_flow().await.unwrap();
    harness.session.shutdown();

    let err = harness.session.complete_oauth_flow(flow).await.unwrap_err();
    assert!(matches!(err.kind, ErrorKind::OAuthFlow(_)), "{err:?}");
}
