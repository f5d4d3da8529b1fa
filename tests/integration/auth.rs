//! Profile selection and non-interactive authentication.

use std::time::Duration;

use super::common::{mount_token, Harness};
use playforce::ClientConfig;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_profiles_are_listed_and_defaulted() {
    let harness = Harness::new(&[
        ("zeta", json!({ "client_secret": "s" })),
        ("alpha", json!({ "username": "u@x.test", "password": "pw", "client_secret": "s" })),
        ("explicit", json!({ "username": "u@x.test", "password": "pw", "grant_type": "client_credentials" })),
    ])
    .await;
    let session = &harness.session;

    assert_eq!(session.list_configs(), vec!["alpha", "explicit", "zeta"]);
    assert!(session.current_config().is_none());
    assert!(!session.select_config("missing"));
    assert!(!session.select_config("../alpha"));

    assert!(session.select_config("alpha"));
    let profile = serde_json::to_value(session.current_config().unwrap()).unwrap();
    assert_eq!(profile["grant_type"], "password");
    assert_eq!(profile["apiVersion"], "57.0");
    assert_eq!(profile["password"], "[REDACTED]");
    assert_eq!(profile["client_secret"], "[REDACTED]");

    assert!(session.select_config("zeta"));
    assert_eq!(
        serde_json::to_value(session.current_config().unwrap()).unwrap()["grant_type"],
        "client_credentials"
    );

    assert!(session.select_config("explicit"));
    assert_eq!(
        serde_json::to_value(session.current_config().unwrap()).unwrap()["grant_type"],
        "client_credentials"
    );
    assert!(!session.requires_oauth());
}

#[tokio::test]
async fn test_client_credentials_success_caches_token() {
    let harness = Harness::client_credentials().await;
    Mock::given(method("POST"))
        .and(path("/services/oauth2/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_secret=s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok",
            "instance_url": harness.server.uri()
        })))
        .expect(1)
        .mount(&harness.server)
        .await;

    assert!(!harness.session.has_valid_token());
    let attempt = harness.session.try_authenticate().await;
    assert!(attempt.success, "{attempt:?}");
    assert!(!attempt.needs_oauth);
    assert!(harness.session.has_valid_token());
}

#[tokio::test]
async fn test_rejected_client_credentials_needs_oauth() {
    let harness = Harness::client_credentials().await;
    Mock::given(method("POST"))
        .and(path("/services/oauth2/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_client",
            "error_description": "client credentials flow is not enabled"
        })))
        .mount(&harness.server)
        .await;

    let attempt = harness.session.try_authenticate().await;
    assert!(!attempt.success);
    assert!(attempt.needs_oauth);
    assert!(!harness.session.has_valid_token());
}

#[tokio::test]
async fn test_rejected_password_reports_provider_body() {
    let harness = Harness::new(&[(
        "dev",
        json!({ "username": "u@x.test", "password": "wrong", "client_secret": "s" }),
    )])
    .await;
    assert!(harness.session.select_config("dev"));
    Mock::given(method("POST"))
        .and(path("/services/oauth2/token"))
        .and(body_string_contains("grant_type=password"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_string(r#"{"error":"invalid_grant","error_description":"authentication failure"}"#),
        )
        .mount(&harness.server)
        .await;

    let attempt = harness.session.try_authenticate().await;
    assert!(!attempt.success);
    assert!(!attempt.needs_oauth);
    let error = attempt.error.unwrap();
    assert!(error.contains("400"), "{error}");
    assert!(error.contains("authentication failure"), "{error}");
}

#[tokio::test]
async fn test_tokens_are_kept_per_profile() {
    let harness = Harness::new(&[
        ("dev", json!({ "client_secret": "s" })),
        ("qa", json!({ "client_secret": "s" })),
    ])
    .await;
    mount_token(&harness.server, "dev-token").await;
    let session = &harness.session;

    assert!(session.select_config("dev"));
    assert!(session.try_authenticate().await.success);
    assert!(session.has_valid_token());

    assert!(session.select_config("qa"));
    assert!(!session.has_valid_token());

    assert!(session.select_config("dev"));
    assert!(session.has_valid_token());
}

#[tokio::test]
async fn test_stalled_login_fails_within_client_timeout() {
    let client = ClientConfig::builder()
        .with_timeout(Duration::from_millis(200))
        .build();
    let harness = Harness::with_client_config(
        &[("dev", json!({ "username": "u@x.com", "password": "pw" }))],
        client,
    )
    .await;
    assert!(harness.session.select_config("dev"));

    Mock::given(method("POST"))
        .and(path("/services/oauth2/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access_token": "tok", "instance_url": harness.server.uri() }))
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&harness.server)
        .await;

    let attempt = tokio::time::timeout(Duration::from_secs(10), harness.session.try_authenticate())
        .await
        .expect("login should give up on its own");
    assert!(!attempt.success);
    assert!(!attempt.needs_oauth);
    assert!(
        attempt.error.as_deref().unwrap().starts_with("Network error: "),
        "{attempt:?}"
    );
    assert!(!harness.session.has_valid_token());
}
