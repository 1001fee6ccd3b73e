//! Mock remote tests for the REST backend.
//!
//! These tests use wiremock to simulate the work-item service and drive the
//! whole enumerate-then-fetch path over real HTTP.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{basic_auth, body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use workmirror_core::error::TransportError;
use workmirror_core::{
    AccessToken, ApiBase, Credential, Error, ExternalId, IdEnumerator, SourceAdapter, SourceQuery,
    WorkItemApi, Wiql,
};
use workmirror_remote::{RemoteApi, RetryPolicy, RetryingTransport};

const WIQL_PATH: &str = "/contoso/Fabrikam/_apis/wit/wiql";
const ITEMS_PATH: &str = "/contoso/Fabrikam/_apis/wit/workitems";

/// Helper to build an API client pointed at a mock server, with fast retries.
fn mock_api(server: &MockServer) -> RemoteApi {
    let base = ApiBase::new(format!("http://127.0.0.1:{}", server.address().port())).unwrap();
    let credential = Credential::new("contoso", "Fabrikam", AccessToken::new("test-pat"));
    let policy = RetryPolicy {
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
        ..RetryPolicy::default()
    };
    let transport = RetryingTransport::new(Duration::from_secs(5), policy).unwrap();
    RemoteApi::with_transport(base, credential, transport)
}

fn item(id: u64, title: &str, state: &str) -> serde_json::Value {
    json!({"id": id, "rev": 1, "fields": {"System.Title": title, "System.State": state}})
}

// ============================================================================
// Query Tests
// ============================================================================

#[tokio::test]
async fn test_query_sends_wiql_with_auth() {
    let server = MockServer::start().await;
    let api = mock_api(&server);
    let query = SourceQuery::new("Feature Request").with_states(["New", "Active"]);
    let wiql = Wiql::select_ids(api.project(), &query);

    Mock::given(method("POST"))
        .and(path(WIQL_PATH))
        .and(query_param("api-version", "7.1"))
        .and(query_param("$top", "2000"))
        .and(basic_auth("", "test-pat"))
        .and(header("accept", "application/json"))
        .and(body_json(json!({"query": wiql.to_string()})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "queryType": "flat",
            "workItems": [{"id": 101}, {"id": 102}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = api.query_ids(&wiql, 2000, None).await.unwrap();

    assert_eq!(page.ids, vec![ExternalId::new(101), ExternalId::new(102)]);
    assert!(page.continuation.is_none());
}

#[tokio::test]
async fn test_enumeration_follows_continuation_tokens() {
    let server = MockServer::start().await;
    let api = mock_api(&server);

    Mock::given(method("POST"))
        .and(path(WIQL_PATH))
        .and(query_param("continuationToken", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "workItems": [{"id": 103}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(WIQL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "workItems": [{"id": 101}, {"id": 102}],
            "continuationToken": "abc"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ids = IdEnumerator::new(&api, &SourceQuery::new("Epic"))
        .collect_all()
        .await
        .unwrap();

    assert_eq!(
        ids,
        vec![ExternalId::new(101), ExternalId::new(102), ExternalId::new(103)]
    );
}

#[tokio::test]
async fn test_undecodable_query_response_is_protocol_error() {
    let server = MockServer::start().await;
    let api = mock_api(&server);

    Mock::given(method("POST"))
        .and(path(WIQL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>sign in</html>"))
        .mount(&server)
        .await;

    let wiql = Wiql::select_ids(api.project(), &SourceQuery::new("Epic"));
    let err = api.query_ids(&wiql, 10, None).await.unwrap_err();

    assert!(matches!(err, Error::Protocol(_)));
}

// ============================================================================
// Fetch Tests
// ============================================================================

#[tokio::test]
async fn test_fetch_sends_comma_joined_ids() {
    let server = MockServer::start().await;
    let api = mock_api(&server);

    Mock::given(method("GET"))
        .and(path(ITEMS_PATH))
        .and(query_param("ids", "101,102,103"))
        .and(query_param("$expand", "all"))
        .and(query_param("api-version", "7.1"))
        .and(basic_auth("", "test-pat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 3,
            "value": [
                item(101, "Export to CSV", "New"),
                item(102, "Dark mode", "Active"),
                item(103, "SSO", "Under Consideration")
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ids = [101, 102, 103].map(ExternalId::new);
    let records = api.fetch_work_items(&ids).await.unwrap();

    assert_eq!(records.len(), 3);
    assert_eq!(records[1].project().unwrap().title, "Dark mode");
    assert_eq!(records[2].state(), Some("Under Consideration"));
}

#[tokio::test]
async fn test_fetch_of_no_ids_makes_no_call() {
    let server = MockServer::start().await;
    let api = mock_api(&server);

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    assert!(api.fetch_work_items(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_fetch_rejects_oversized_chunk() {
    let server = MockServer::start().await;
    let api = mock_api(&server);

    let ids: Vec<ExternalId> = (1..=201).map(ExternalId::new).collect();
    let err = api.fetch_work_items(&ids).await.unwrap_err();

    assert!(matches!(err, Error::InvalidInput(_)));
}

// ============================================================================
// Retry Tests
// ============================================================================

#[tokio::test]
async fn test_fetch_recovers_from_transient_failures() {
    let server = MockServer::start().await;
    let api = mock_api(&server);

    Mock::given(method("GET"))
        .and(path(ITEMS_PATH))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(ITEMS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [item(7, "Retry me", "New")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let records = api.fetch_work_items(&[ExternalId::new(7)]).await.unwrap();
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn test_unauthorized_fails_without_retry() {
    let server = MockServer::start().await;
    let api = mock_api(&server);

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let wiql = Wiql::select_ids(api.project(), &SourceQuery::new("Epic"));
    let err = api.query_ids(&wiql, 10, None).await.unwrap_err();

    match err {
        Error::Transport(TransportError::Status {
            status, attempts, ..
        }) => {
            assert_eq!(status, 401);
            assert_eq!(attempts, 1);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

// ============================================================================
// Adapter Tests
// ============================================================================

#[tokio::test]
async fn test_adapter_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(WIQL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "workItems": [{"id": 1}, {"id": 2}, {"id": 3}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(ITEMS_PATH))
        .and(query_param("ids", "1,2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [item(2, "two", "New"), item(1, "one", "New")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(ITEMS_PATH))
        .and(query_param("ids", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [item(3, "three", "Active")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = SourceAdapter::new("mk", mock_api(&server), "Feature Request").with_chunk_size(2);
    let records = adapter.fetch(None).await.unwrap();

    assert_eq!(
        records.iter().map(|r| r.id.get()).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
}

#[tokio::test]
async fn test_adapter_enumeration_failure_skips_fetch() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(5)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let adapter = SourceAdapter::new("tm", mock_api(&server), "Epic");
    let err = adapter.fetch(None).await.unwrap_err();

    assert!(matches!(err, Error::Enumeration { pages: 0, .. }));
}
