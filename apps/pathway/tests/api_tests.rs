//! Integration tests for the Pathway HTTP storage API.
//!
//! Uses axum-test to drive the router without starting a real server.

use axum::http::{HeaderValue, header};
use axum_test::TestServer;
use pathway::api::{
    AppState, ErrorResponse, HashResponse, HealthResponse, KindsResponse, SaveResponse,
    ValidateResponse, WorkflowListResponse, create_router,
};
use pathway::config::ServerConfig;
use pathway_core::{
    Editor, GraphDocument, NodeId, Position, Rule, Store, checksum, formats::serialize,
    from_json_str,
};
use serde_json::json;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn open_settings() -> ServerConfig {
    ServerConfig {
        rate_limit: 0,
        ..ServerConfig::default()
    }
}

fn create_test_server_with(settings: ServerConfig) -> TestServer {
    let state = AppState::new(Store::default(), settings);
    TestServer::new(create_router(state)).expect("test server")
}

/// Server over an empty memory store, no key, no rate limit.
fn create_test_server() -> TestServer {
    create_test_server_with(open_settings())
}

/// Entry -> listening exercise -> Exit.
fn linear_workflow() -> GraphDocument {
    let doc = GraphDocument::create_empty();
    let (doc, listening) =
        Editor::insert_exercise_node(&doc, "listening", "Listen", Position::new(250.0, 120.0))
            .expect("insert");
    Editor::wire(&doc, &NodeId::new("entry-1"), &listening, None)
        .and_then(|d| Editor::wire(&d, &listening, &NodeId::new("exit-1"), None))
        .expect("wire")
}

/// Entry -> condition with only a pass branch.
fn gate_missing_fail() -> GraphDocument {
    let doc = GraphDocument::create_empty();
    let (doc, gate) = Editor::insert_condition_node(
        &doc,
        "score-threshold",
        "score >= 70",
        "Passed?",
        Position::default(),
    )
    .expect("insert");
    Editor::wire(&doc, &NodeId::new("entry-1"), &gate, None)
        .and_then(|d| Editor::wire(&d, &gate, &NodeId::new("exit-1"), Some("pass")))
        .expect("wire")
}

// =============================================================================
// HEALTH & KINDS
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let server = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_kinds_lists_registry() {
    let server = create_test_server();

    let response = server.get("/kinds").await;

    response.assert_status_ok();
    let kinds: KindsResponse = response.json();
    assert_eq!(kinds.node_types.len(), 4);
    assert_eq!(kinds.exercise_kinds.len(), 11);
    assert_eq!(kinds.condition_kinds.len(), 5);
    assert!(kinds.exercise_kinds.iter().any(|k| k == "listening"));

    let condition = kinds
        .node_types
        .iter()
        .find(|t| t.name == "condition")
        .expect("condition type");
    assert_eq!(condition.outgoing, "branches");
    assert_eq!(condition.max_outgoing, 2);
    assert!(
        condition
            .fields
            .iter()
            .any(|f| f.name == "expression" && f.required)
    );
}

// =============================================================================
// WORKFLOW STORAGE
// =============================================================================

#[tokio::test]
async fn test_put_then_get_returns_stored_document() {
    let server = create_test_server();
    let doc = linear_workflow();

    let response = server
        .put("/workflows/listening-a1")
        .json(&serialize(&doc))
        .await;

    response.assert_status_ok();
    let saved: SaveResponse = response.json();
    assert!(saved.saved);
    assert_eq!(saved.id, "listening-a1");
    assert!(saved.issues.is_empty());

    let response = server.get("/workflows/listening-a1").await;
    response.assert_status_ok();
    let loaded = from_json_str(&response.text()).expect("stored document");
    assert_eq!(loaded, doc);
}

#[tokio::test]
async fn test_put_invalid_document_is_blocked() {
    let server = create_test_server();

    let response = server
        .put("/workflows/gate")
        .json(&serialize(&gate_missing_fail()))
        .await;

    assert_eq!(response.status_code().as_u16(), 422);
    let blocked: SaveResponse = response.json();
    assert!(!blocked.saved);
    assert_eq!(blocked.issues.len(), 1);
    assert_eq!(blocked.issues[0].rule_violated, Rule::MissingBranch);

    // Nothing was stored
    server.get("/workflows/gate").await.assert_status_not_found();
}

#[tokio::test]
async fn test_put_malformed_document_is_bad_request() {
    let server = create_test_server();

    let response = server
        .put("/workflows/broken")
        .json(&json!({
            "nodes": {},
            "edges": [],
            "entryNodeId": "entry-1"
        }))
        .await;

    response.assert_status_bad_request();
    let error: ErrorResponse = response.json();
    assert!(!error.error.is_empty());
}

#[tokio::test]
async fn test_put_unknown_exercise_kind_is_bad_request() {
    let server = create_test_server();
    let mut body = serde_json::to_value(serialize(&linear_workflow())).expect("value");
    body["nodes"]["exercise-1"]["data"]["exerciseKind"] = json!("interpretive-dance");

    let response = server.put("/workflows/odd").json(&body).await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_put_duplicate_node_key_is_bad_request() {
    let server = create_test_server();
    let body = r#"{
        "nodes": {
            "entry-1": { "id": "entry-1", "type": "entry", "position": { "x": 0.0, "y": 0.0 }, "data": { "label": "Start" } },
            "exit-1": { "id": "exit-1", "type": "exit", "position": { "x": 0.0, "y": 100.0 }, "data": { "label": "End" } },
            "exit-1": { "id": "exit-1", "type": "exit", "position": { "x": 0.0, "y": 200.0 }, "data": { "label": "Finish" } }
        },
        "edges": [],
        "entryNodeId": "entry-1"
    }"#;

    let response = server.put("/workflows/twice").text(body).await;

    response.assert_status_bad_request();
    let error: ErrorResponse = response.json();
    assert!(error.error.contains("duplicate node key"));
    server.get("/workflows/twice").await.assert_status_not_found();
}

#[tokio::test]
async fn test_validate_unknown_top_level_key_is_bad_request() {
    let server = create_test_server();
    let mut body = serde_json::to_value(serialize(&linear_workflow())).expect("value");
    body["viewport"] = json!({ "zoom": 1 });

    let response = server.post("/validate").json(&body).await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_get_unknown_workflow_is_not_found() {
    let server = create_test_server();

    let response = server.get("/workflows/nope").await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn test_invalid_workflow_id_is_bad_request() {
    let server = create_test_server();

    let response = server.get("/workflows/bad.id").await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_last_write_wins() {
    let server = create_test_server();
    let first = linear_workflow();
    let second = Editor::retitle(&first, &NodeId::new("exercise-1"), "Listen again")
        .expect("retitle");

    server
        .put("/workflows/flow")
        .json(&serialize(&first))
        .await
        .assert_status_ok();
    server
        .put("/workflows/flow")
        .json(&serialize(&second))
        .await
        .assert_status_ok();

    let loaded = from_json_str(&server.get("/workflows/flow").await.text()).expect("load");
    assert_eq!(loaded, second);
}

#[tokio::test]
async fn test_list_workflows_sorted() {
    let server = create_test_server();
    let doc = serialize(&linear_workflow());

    for id in ["beta", "alpha"] {
        server
            .put(&format!("/workflows/{}", id))
            .json(&doc)
            .await
            .assert_status_ok();
    }

    let response = server.get("/workflows").await;

    response.assert_status_ok();
    let list: WorkflowListResponse = response.json();
    assert_eq!(list.workflows, vec!["alpha", "beta"]);
}

#[tokio::test]
async fn test_hash_matches_checksum() {
    let server = create_test_server();
    let doc = linear_workflow();
    server
        .put("/workflows/flow")
        .json(&serialize(&doc))
        .await
        .assert_status_ok();

    let response = server.get("/workflows/flow/hash").await;

    response.assert_status_ok();
    let hash: HashResponse = response.json();
    assert_eq!(hash.id, "flow");
    assert_eq!(
        hash.checksum,
        format!("{:016x}", checksum(&doc).expect("checksum"))
    );
    assert_eq!(hash.blake3.len(), 64);
}

// =============================================================================
// VALIDATE ENDPOINT
// =============================================================================

#[tokio::test]
async fn test_validate_reports_issues_as_data() {
    let server = create_test_server();

    let response = server
        .post("/validate")
        .json(&serialize(&GraphDocument::create_empty()))
        .await;

    response.assert_status_ok();
    let result: ValidateResponse = response.json();
    assert!(!result.valid);
    assert!(
        result
            .issues
            .iter()
            .any(|i| i.rule_violated == Rule::NoReachableExit)
    );
}

#[tokio::test]
async fn test_validate_valid_document() {
    let server = create_test_server();

    let response = server
        .post("/validate")
        .json(&serialize(&linear_workflow()))
        .await;

    response.assert_status_ok();
    let result: ValidateResponse = response.json();
    assert!(result.valid);
    assert!(result.issues.is_empty());
}

#[tokio::test]
async fn test_wrong_method_not_allowed() {
    let server = create_test_server();

    let response = server.post("/health").await;

    assert_eq!(response.status_code().as_u16(), 405);
}

// =============================================================================
// AUTHENTICATION
// =============================================================================

fn keyed_server() -> TestServer {
    create_test_server_with(ServerConfig {
        api_key: Some("s3cret".to_string()),
        ..open_settings()
    })
}

#[tokio::test]
async fn test_auth_missing_header_rejected() {
    let server = keyed_server();

    let response = server.get("/workflows").await;

    assert_eq!(response.status_code().as_u16(), 401);
}

#[tokio::test]
async fn test_auth_bearer_key_accepted() {
    let server = keyed_server();

    let response = server
        .get("/workflows")
        .add_header(
            header::AUTHORIZATION,
            "Bearer s3cret".parse::<HeaderValue>().expect("header"),
        )
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_auth_wrong_key_rejected() {
    let server = keyed_server();

    let response = server
        .get("/workflows")
        .add_header(
            header::AUTHORIZATION,
            "Bearer wrong-key".parse::<HeaderValue>().expect("header"),
        )
        .await;

    assert_eq!(response.status_code().as_u16(), 401);
}

#[tokio::test]
async fn test_auth_health_exempt() {
    let server = keyed_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_empty_api_key_disables_auth() {
    let server = create_test_server_with(ServerConfig {
        api_key: Some(String::new()),
        ..open_settings()
    });

    let response = server.get("/workflows").await;

    response.assert_status_ok();
}
