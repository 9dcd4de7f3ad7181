//! End-to-end tests for the inventory client over real HTTP
//!
//! These tests run the client's `reqwest` transport against a local
//! `wiremock` server to check:
//! - the wire contract (endpoint, headers, body)
//! - error classification of real responses
//! - configuration updates between calls

use inventory_client::signer::{self, KEY_ID_HEADER, PUBLIC_KEY_HEADER, SIGNATURE_HEADER};
use inventory_client::*;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::new("key-live", "secret-live", "pub-live").with_base_url(server.uri())
}

/// A base URL nothing is listening on
fn closed_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

// ============================================================================
// Wire contract
// ============================================================================

#[tokio::test]
async fn test_find_posts_signed_command_tuple() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .and(header("content-type", "application/json"))
        .and(header(KEY_ID_HEADER, "key-live"))
        .and(header(PUBLIC_KEY_HEADER, "pub-live"))
        .and(header_exists(SIGNATURE_HEADER))
        .and(body_json(json!(["find", {"category": "widgets"}, {"limit": 5}])))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"sku": "W-1", "quantity": 3},
            {"sku": "W-2", "quantity": 0}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = InventoryClient::new(config_for(&server)).unwrap();
    let items: Vec<Value> = client
        .find(
            &Filter::new().eq("category", "widgets"),
            Some(&FindOptions::default().with_limit(5)),
        )
        .await
        .unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["sku"], "W-1");
}

#[tokio::test]
async fn test_signature_header_matches_sent_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sku": "N-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let client = InventoryClient::new(config.clone()).unwrap();
    let created: Value = client
        .create(&json!({"sku": "N-1", "quantity": 12}), None)
        .await
        .unwrap();
    assert_eq!(created["sku"], "N-1");

    let requests = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    let signature = request
        .headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .expect("signature header");

    assert!(signer::verify(&config.credentials(), &request.body, signature));
    assert_eq!(
        serde_json::from_slice::<Value>(&request.body).unwrap(),
        json!(["insertOne", {"sku": "N-1", "quantity": 12}])
    );
}

#[tokio::test]
async fn test_aggregate_preserves_stage_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"_id": "tools", "total": 40}])),
        )
        .mount(&server)
        .await;

    let client = InventoryClient::new(config_for(&server)).unwrap();
    let pipeline = vec![
        Stage::matching(&Filter::new().eq("active", true)),
        Stage::Group(json!({"_id": "$category", "total": {"$sum": "$quantity"}})),
        Stage::Sort(SortSpec::new().descending("total")),
        Stage::Limit(3),
    ];
    let groups: Vec<Value> = client.aggregate(&pipeline, None).await.unwrap();
    assert_eq!(groups[0]["total"], 40);

    let requests = server.received_requests().await.unwrap();
    let body = std::str::from_utf8(&requests[0].body).unwrap();
    let match_at = body.find("$match").unwrap();
    let group_at = body.find("$group").unwrap();
    let sort_at = body.find("$sort").unwrap();
    let limit_at = body.find("$limit").unwrap();
    assert!(match_at < group_at && group_at < sort_at && sort_at < limit_at);
}

#[tokio::test]
async fn test_set_config_redirects_next_call() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;
    for server in [&first, &second] {
        Mock::given(method("POST"))
            .and(path("/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"deletedCount": 1})))
            .mount(server)
            .await;
    }

    let client = InventoryClient::new(config_for(&first)).unwrap();
    client.delete_one(&json!({"sku": "A"}), None).await.unwrap();

    client
        .set_config(ClientConfig::new("key-2", "secret-2", "pub-2").with_base_url(second.uri()))
        .await
        .unwrap();
    client.delete_one(&json!({"sku": "B"}), None).await.unwrap();

    assert_eq!(first.received_requests().await.unwrap().len(), 1);
    let second_requests = second.received_requests().await.unwrap();
    assert_eq!(second_requests.len(), 1);
    assert_eq!(
        second_requests[0]
            .headers
            .get(KEY_ID_HEADER)
            .and_then(|v| v.to_str().ok()),
        Some("key-2")
    );
}

// ============================================================================
// Error classification
// ============================================================================

#[tokio::test]
async fn test_validation_exception_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "success": false,
            "error": {
                "name": "ValidationException",
                "errors": [{
                    "property": "brandDetails",
                    "constraints": ["brandDetails should not be null or undefined"],
                    "children": []
                }]
            }
        })))
        .mount(&server)
        .await;

    let client = InventoryClient::new(config_for(&server)).unwrap();
    let err = client
        .create(&json!({"sku": "NEW"}), None)
        .await
        .unwrap_err();

    let failure = err.as_validation().expect("validation error");
    assert_eq!(failure.details.status_code, Some(400));
    assert_eq!(
        failure.all_messages(),
        vec!["brandDetails should not be null or undefined".to_string()]
    );
    assert!(failure.errors_for_property("factoryDetails").is_empty());
}

#[tokio::test]
async fn test_invalid_credentials_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"error": {"message": "Invalid API credentials"}})),
        )
        .mount(&server)
        .await;

    let client = InventoryClient::new(config_for(&server)).unwrap();
    let err = client
        .find::<Value>(&Filter::new(), None)
        .await
        .unwrap_err();

    assert!(matches!(err, InventoryError::Authentication(_)));
    assert_eq!(err.status_code(), Some(401));
    assert!(err.message().contains("Invalid API credentials"));
}

#[tokio::test]
async fn test_server_error_keeps_request_id_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(
            ResponseTemplate::new(500)
                .insert_header("x-request-id", "req-500")
                .set_body_string("internal error"),
        )
        .mount(&server)
        .await;

    let client = InventoryClient::new(config_for(&server)).unwrap();
    let err = client
        .update_many(&json!({}), &json!({"$set": {"audited": true}}), None)
        .await
        .unwrap_err();

    assert!(matches!(err, InventoryError::Network(_)));
    assert_eq!(err.status_code(), Some(500));
    assert_eq!(err.request_id(), Some("req-500"));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let client =
        InventoryClient::new(ClientConfig::new("k", "s", "p").with_base_url(closed_base_url()))
            .unwrap();

    let err = client
        .bulk_write(&[BulkOperation::insert_one(json!({"sku": "Q"}))], None)
        .await
        .unwrap_err();

    assert!(matches!(err, InventoryError::Network(_)));
    assert!(err.status_code().is_none());
    let original = err
        .details()
        .context
        .get("originalError")
        .and_then(Value::as_str)
        .expect("originalError in context");
    assert_eq!(Some(original), err.details().original_error.as_deref());
}

// ============================================================================
// Registry
// ============================================================================

#[tokio::test]
async fn test_registry_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .and(body_json(json!(["find", {"sku": "R-1"}, {"limit": 1}])))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"sku": "R-1"}])))
        .expect(1)
        .mount(&server)
        .await;

    let registry: ClientRegistry = ClientRegistry::new();
    let before = registry
        .find_one::<Value>(&Filter::new().eq("sku", "R-1"), None)
        .await;
    assert!(matches!(before, Err(InventoryError::Configuration(_))));

    registry.initialize(config_for(&server)).await.unwrap();
    let item: Option<Value> = registry
        .find_one(&Filter::new().eq("sku", "R-1"), None)
        .await
        .unwrap();
    assert_eq!(item, Some(json!({"sku": "R-1"})));

    let again = registry.initialize(config_for(&server)).await;
    assert!(matches!(again, Err(InventoryError::Configuration(_))));
}
