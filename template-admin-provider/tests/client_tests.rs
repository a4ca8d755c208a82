use serde_json::json;
use template_admin_provider::{ApiClient, ApiConfig, ApiFailure, GraphqlRequest, HttpApiClient};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, api_key: Option<&str>) -> HttpApiClient {
    HttpApiClient::new(ApiConfig {
        endpoint: format!("{}/graphql", server.uri()),
        api_key: api_key.map(str::to_string),
        timeout_secs: 5,
    })
    .unwrap()
}

fn list_request() -> GraphqlRequest {
    GraphqlRequest {
        query: "query ListTemplates { listTemplates { items { id } } }".to_string(),
        operation_name: "ListTemplates".to_string(),
        variables: json!({"limit": 10}),
    }
}

// ── Config defaults ─────────────────────────────────────────────

#[test]
fn api_config_default() {
    let cfg = ApiConfig::default();
    assert_eq!(cfg.endpoint, "http://localhost:20002/graphql");
    assert!(cfg.api_key.is_none());
    assert_eq!(cfg.timeout_secs, 30);
}

#[test]
fn api_config_skips_absent_key() {
    let json = serde_json::to_value(ApiConfig::default()).unwrap();
    assert!(json.get("api_key").is_none());
}

// ── Requests ────────────────────────────────────────────────────

#[tokio::test]
async fn posts_request_with_api_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("x-api-key", "da2-secret"))
        .and(body_partial_json(json!({
            "operationName": "ListTemplates",
            "variables": {"limit": 10},
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"listTemplates": {"items": [{"id": "a"}], "nextToken": null}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let data = client_for(&server, Some("da2-secret"))
        .request(list_request())
        .await
        .unwrap();
    assert_eq!(data["listTemplates"]["items"][0]["id"], json!("a"));
}

#[tokio::test]
async fn missing_data_is_null() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let data = client_for(&server, None).request(list_request()).await.unwrap();
    assert!(data.is_null());
}

#[tokio::test]
async fn error_list_is_rejected_even_with_ok_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"updateTemplate": null},
            "errors": [{
                "errorType": "ConflictUnhandled",
                "message": "Conflict resolver rejects mutation.",
                "data": {"id": "a", "_version": 4},
            }],
        })))
        .mount(&server)
        .await;

    let failure = client_for(&server, None)
        .request(list_request())
        .await
        .unwrap_err();
    match failure {
        ApiFailure::Rejected(errors) => {
            assert_eq!(errors.len(), 1);
            assert!(errors[0].is_conflict());
            assert_eq!(errors[0].data.as_ref().unwrap()["_version"], json!(4));
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn error_list_on_unauthorized_status_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "errors": [{"errorType": "UnauthorizedException", "message": "You are not authorized"}],
        })))
        .mount(&server)
        .await;

    let failure = client_for(&server, None)
        .request(list_request())
        .await
        .unwrap_err();
    assert!(matches!(failure, ApiFailure::Rejected(ref e) if e[0].message == "You are not authorized"));
}

#[tokio::test]
async fn server_error_without_body_is_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let failure = client_for(&server, None)
        .request(list_request())
        .await
        .unwrap_err();
    match failure {
        ApiFailure::Transport(message) => {
            assert!(message.contains("500"));
            assert!(message.contains("upstream exploded"));
        }
        other => panic!("expected Transport, got {other:?}"),
    }
}

#[tokio::test]
async fn undecodable_body_is_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let failure = client_for(&server, None)
        .request(list_request())
        .await
        .unwrap_err();
    assert!(matches!(failure, ApiFailure::Transport(_)));
}

#[tokio::test]
async fn unreachable_endpoint_is_transport_failure() {
    let client = HttpApiClient::new(ApiConfig {
        endpoint: "http://127.0.0.1:1/graphql".to_string(),
        api_key: None,
        timeout_secs: 2,
    })
    .unwrap();

    let failure = client.request(list_request()).await.unwrap_err();
    assert!(matches!(failure, ApiFailure::Transport(_)));
}
