//! SOQL execution through the session: expansion, paging, abort.

use super::common::{mount_token, page, Harness, QUERY_PATH};
use futures::StreamExt;
use playforce::{QueryEvent, QueryOutcome, QueryProgress};
use serde_json::json;
use tokio::sync::mpsc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_page(server: &MockServer, cursor: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("{QUERY_PATH}{cursor}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_three_pages_with_progress() {
    let harness = Harness::client_credentials().await;
    mount_token(&harness.server, "tok").await;

    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .and(query_param("q", "SELECT Id FROM Contact"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            5,
            &["c1", "c2"],
            Some("/services/data/v57.0/query/01g-2000"),
        )))
        .expect(1)
        .mount(&harness.server)
        .await;
    mount_page(
        &harness.server,
        "01g-2000",
        page(5, &["c3", "c4"], Some("/services/data/v57.0/query/01g-4000")),
    )
    .await;
    mount_page(&harness.server, "01g-4000", page(5, &["c5"], None)).await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let outcome = harness
        .session
        .execute_tracked("contacts", "SELECT Id FROM Contact", Some(tx))
        .await
        .unwrap();

    let mut progress = Vec::new();
    while let Some(p) = rx.recv().await {
        progress.push(p);
    }
    assert_eq!(
        progress,
        vec![
            QueryProgress { fetched: 2, total_size: 5, page: 1, done: false },
            QueryProgress { fetched: 4, total_size: 5, page: 2, done: false },
            QueryProgress { fetched: 5, total_size: 5, page: 3, done: true },
        ]
    );

    let records = outcome.records().unwrap();
    assert!(records.done);
    let ids: Vec<_> = records.records.iter().map(|r| r["Id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["c1", "c2", "c3", "c4", "c5"]);

    // Finished queries are no longer tracked.
    assert!(!harness.session.abort_query("contacts"));
    assert!(harness.session.running_queries().is_empty());
}

#[tokio::test]
async fn test_abort_after_first_page_returns_snapshot() {
    let harness = Harness::client_credentials().await;
    mount_token(&harness.server, "tok").await;

    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            4,
            &["a1", "a2"],
            Some("/services/data/v57.0/query/01g-2000"),
        )))
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{QUERY_PATH}01g-2000")))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(4, &["a3", "a4"], None)))
        .expect(0)
        .mount(&harness.server)
        .await;

    let mut events = harness.session.query_stream("accounts", "SELECT Id FROM Account");
    let first = events.next().await.unwrap().unwrap();
    assert!(matches!(first, QueryEvent::Progress(ref p) if p.page == 1 && !p.done));
    assert_eq!(
        harness.session.query_progress("accounts").map(|p| p.fetched),
        Some(2)
    );

    assert!(harness.session.abort_query("accounts"));

    let QueryEvent::Completed(outcome) = events.next().await.unwrap().unwrap() else {
        panic!("expected completion after abort");
    };
    assert_eq!(
        outcome,
        QueryOutcome::Aborted { aborted: true, total_size: 4, fetched_count: 2 }
    );
    assert_eq!(
        serde_json::to_value(&outcome).unwrap(),
        json!({ "aborted": true, "totalSize": 4, "fetchedCount": 2 })
    );
    assert!(events.next().await.is_none());

    assert!(!harness.session.abort_query("accounts"));
    assert!(harness.session.query_progress("accounts").is_none());
}

#[tokio::test]
async fn test_page_failure_keeps_accumulated_records() {
    let harness = Harness::client_credentials().await;
    mount_token(&harness.server, "tok").await;

    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            6,
            &["r1", "r2", "r3"],
            Some("/services/data/v57.0/query/01g-3000"),
        )))
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{QUERY_PATH}01g-3000")))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!([
            {"errorCode": "INVALID_QUERY_LOCATOR", "message": "invalid query locator"}
        ])))
        .mount(&harness.server)
        .await;

    let outcome = harness
        .session
        .execute_soql("SELECT Id FROM Lead")
        .await
        .unwrap();
    let records = outcome.records().unwrap();
    assert!(!records.done);
    assert_eq!(records.records.len(), 3);
    assert!(records
        .page_error
        .as_deref()
        .unwrap()
        .contains("INVALID_QUERY_LOCATOR"));
}

#[tokio::test]
async fn test_select_star_sends_field_list() {
    let harness = Harness::client_credentials().await;
    mount_token(&harness.server, "tok").await;

    Mock::given(method("GET"))
        .and(path("/services/data/v57.0/sobjects/Account/describe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Account",
            "label": "Account",
            "fields": [
                {"name": "A", "label": "A", "type": "string"},
                {"name": "B", "label": "B", "type": "string"},
                {"name": "C", "label": "C", "type": "string"}
            ]
        })))
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .and(query_param("q", "SeLeCt A, B, C FROM Account WHERE Name != null"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(1, &["001"], None)))
        .expect(1)
        .mount(&harness.server)
        .await;

    let outcome = harness
        .session
        .execute_soql("SeLeCt * FROM Account WHERE Name != null")
        .await
        .unwrap();
    assert_eq!(outcome.records().unwrap().records.len(), 1);
}

#[tokio::test]
async fn test_explicit_projection_is_sent_unmodified() {
    let harness = Harness::client_credentials().await;
    mount_token(&harness.server, "tok").await;

    Mock::given(method("GET"))
        .and(path("/services/data/v57.0/sobjects/Account/describe"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .and(query_param("q", "SELECT Id, Name FROM Account"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(0, &[], None)))
        .expect(1)
        .mount(&harness.server)
        .await;

    let outcome = harness
        .session
        .execute_soql("SELECT Id, Name FROM Account")
        .await
        .unwrap();
    assert!(outcome.records().unwrap().records.is_empty());
}

#[tokio::test]
async fn test_rejected_query_is_soql_error() {
    let harness = Harness::client_credentials().await;
    mount_token(&harness.server, "tok").await;

    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!([
            {"errorCode": "MALFORMED_QUERY", "message": "unexpected token: FORM"}
        ])))
        .mount(&harness.server)
        .await;

    let err = harness
        .session
        .execute_soql("SELECT Id FORM Account")
        .await
        .unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("Salesforce SOQL error: "), "{message}");
    assert!(message.contains("MALFORMED_QUERY"), "{message}");
}
