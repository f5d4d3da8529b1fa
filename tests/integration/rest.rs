//! sObjects REST, describe, license gating and session retry.

use super::common::{active_license, mount_token, page, Harness, QUERY_PATH};
use playforce::{ErrorKind, RequestMethod};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SOBJECTS: &str = "/services/data/v57.0/sobjects";

async fn mount_token_sequence(server: &MockServer, tokens: &[&str]) {
    for (i, token) in tokens.iter().enumerate() {
        Mock::given(method("POST"))
            .and(path("/services/oauth2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": token,
                "instance_url": server.uri()
            })))
            .up_to_n_times(1)
            .with_priority(u8::try_from(i + 1).unwrap())
            .expect(1)
            .mount(server)
            .await;
    }
}

fn session_expired() -> ResponseTemplate {
    ResponseTemplate::new(401).set_body_json(json!([
        {"message": "Session expired or invalid", "errorCode": "INVALID_SESSION_ID"}
    ]))
}

#[tokio::test]
async fn test_expired_session_is_refreshed_once() {
    let harness = Harness::client_credentials().await;
    mount_token_sequence(&harness.server, &["old", "new"]).await;

    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .and(header("Authorization", "Bearer old"))
        .respond_with(session_expired())
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .and(header("Authorization", "Bearer new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(1, &["001"], None)))
        .expect(1)
        .mount(&harness.server)
        .await;

    let outcome = harness
        .session
        .execute_soql("SELECT Id FROM Account")
        .await
        .unwrap();
    assert_eq!(outcome.records().unwrap().records.len(), 1);
    assert!(harness.session.has_valid_token());
}

#[tokio::test]
async fn test_second_expiry_propagates() {
    let harness = Harness::client_credentials().await;
    mount_token_sequence(&harness.server, &["old", "still-old"]).await;

    Mock::given(method("GET"))
        .and(path(format!("{SOBJECTS}/Account/001")))
        .respond_with(session_expired())
        .expect(2)
        .mount(&harness.server)
        .await;

    let err = harness
        .session
        .execute_rest(RequestMethod::Get, "Account/001", None)
        .await
        .unwrap_err();
    match err.kind {
        ErrorKind::Rest(playforce::rest::ErrorKind::Auth(playforce::auth::ErrorKind::Auth {
            status,
            ..
        })) => assert_eq!(status, 401),
        other => panic!("expected auth error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_write_without_license_never_reaches_server() {
    let harness = Harness::client_credentials().await;
    mount_token(&harness.server, "tok").await;

    Mock::given(method("POST"))
        .and(path(format!("{SOBJECTS}/Account")))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&harness.server)
        .await;

    let check = harness.session.license_info();
    assert!(!check.licensed);
    assert!(check.message.contains("PLAYFORCE_LICENSE"), "{}", check.message);

    let err = harness
        .session
        .execute_rest(RequestMethod::Post, "Account", Some(&json!({ "Name": "Acme" })))
        .await
        .unwrap_err();
    assert!(
        matches!(err.kind, ErrorKind::Rest(playforce::rest::ErrorKind::License(_))),
        "{err:?}"
    );
    assert!(err.to_string().starts_with("License required: "), "{err}");
}

#[tokio::test]
async fn test_licensed_writes_go_through() {
    let harness = Harness::client_credentials().await;
    mount_token(&harness.server, "tok").await;
    harness.write_license(&active_license());

    let check = harness.session.license_info();
    assert!(check.licensed, "{}", check.message);
    let info = check.info.unwrap();
    assert_eq!(info.organization, "Acme Corp");
    assert!(info.is_paid);

    Mock::given(method("POST"))
        .and(path(format!("{SOBJECTS}/Account")))
        .and(body_json(json!({ "Name": "Acme" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "001NEW", "success": true, "errors": []
        })))
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(format!("{SOBJECTS}/Account/001NEW")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&harness.server)
        .await;

    let created = harness
        .session
        .execute_rest(RequestMethod::Post, "Account", Some(&json!({ "Name": "Acme" })))
        .await
        .unwrap();
    assert_eq!(created["id"], "001NEW");

    let updated = harness
        .session
        .execute_rest(
            RequestMethod::Patch,
            "Account/001NEW",
            Some(&json!({ "Name": "Acme Corp" })),
        )
        .await
        .unwrap();
    assert!(updated.is_null());
}

#[tokio::test]
async fn test_read_errors_name_the_url() {
    let harness = Harness::client_credentials().await;
    mount_token(&harness.server, "tok").await;

    Mock::given(method("GET"))
        .and(path(format!("{SOBJECTS}/Account/001MISSING")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!([
            {"errorCode": "NOT_FOUND", "message": "The requested resource does not exist"}
        ])))
        .expect(1)
        .mount(&harness.server)
        .await;

    let err = harness
        .session
        .execute_rest(RequestMethod::Get, "Account/001MISSING", None)
        .await
        .unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("REST API error: "), "{message}");
    assert!(
        message.ends_with(&format!(
            "\nURL: {}{SOBJECTS}/Account/001MISSING",
            harness.server.uri()
        )),
        "{message}"
    );
}

#[tokio::test]
async fn test_describe_and_field_summaries() {
    let harness = Harness::client_credentials().await;
    mount_token(&harness.server, "tok").await;

    Mock::given(method("GET"))
        .and(path(format!("{SOBJECTS}/")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "encoding": "UTF-8",
            "maxBatchSize": 200,
            "sobjects": [
                {"name": "Account", "label": "Account", "queryable": true},
                {"name": "Contact", "label": "Contact", "queryable": true}
            ]
        })))
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{SOBJECTS}/Contact/describe")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Contact",
            "label": "Contact",
            "fields": [
                {"name": "Id", "label": "Contact ID", "type": "id"},
                {"name": "AccountId", "label": "Account ID", "type": "reference",
                 "referenceTo": ["Account"], "relationshipName": "Account"}
            ]
        })))
        .mount(&harness.server)
        .await;

    let global = harness.session.describe_global().await.unwrap();
    let names: Vec<_> = global.sobjects.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Account", "Contact"]);

    let describe = harness.session.describe_object("Contact").await.unwrap();
    assert_eq!(describe.field_names(), vec!["Id", "AccountId"]);

    let fields = harness.session.object_fields("Contact").await.unwrap();
    assert!(!fields[0].is_relationship);
    assert!(fields[1].is_relationship);
    assert_eq!(fields[1].relationship_name.as_deref(), Some("Account"));

    let err = harness
        .session
        .describe_object("Contact/../User")
        .await
        .unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::Rest(playforce::rest::ErrorKind::InvalidInput(_))
    ));
}
