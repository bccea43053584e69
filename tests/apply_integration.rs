//! Integration tests for the apply engines against a thin Data Plane server
//!
//! These tests emulate the transaction and version endpoints with a small
//! axum app, then drive real reconciliation passes through the reqwest
//! client to verify ordering, all-or-nothing semantics and conflict retry
//! end to end.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use dpsync::apply::change::ParentRef;
use dpsync::apply::{catalog, order, ChangeOp, RuntimeApplier, TransactionalApplier};
use dpsync::client::{ConfigurationClient, DataplaneClient};
use dpsync::models;

/// Shared state of the emulated Data Plane API
#[derive(Clone)]
struct DataplaneState {
    version: Arc<AtomicI64>,
    /// "METHOD collection" per mutating configuration call, in order
    calls: Arc<Mutex<Vec<String>>>,
    commits: Arc<AtomicUsize>,
    discards: Arc<AtomicUsize>,
    /// Collection whose calls fail with 400
    fail_collection: Option<&'static str>,
    /// 409 the first N versioned configuration calls
    conflicts: Arc<AtomicUsize>,
}

impl DataplaneState {
    fn new() -> Self {
        Self {
            version: Arc::new(AtomicI64::new(7)),
            calls: Arc::new(Mutex::new(Vec::new())),
            commits: Arc::new(AtomicUsize::new(0)),
            discards: Arc::new(AtomicUsize::new(0)),
            fail_collection: None,
            conflicts: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn with_failing_collection(mut self, collection: &'static str) -> Self {
        self.fail_collection = Some(collection);
        self
    }

    fn with_conflicts(self, n: usize) -> Self {
        self.conflicts.store(n, Ordering::SeqCst);
        self
    }

    fn recorded_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn handle_mutation(
        &self,
        method: &str,
        collection: &str,
        params: &HashMap<String, String>,
    ) -> StatusCode {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{} {}", method, collection));

        if self.fail_collection == Some(collection) {
            return StatusCode::BAD_REQUEST;
        }

        if params.contains_key("version") {
            let remaining = self.conflicts.load(Ordering::SeqCst);
            if remaining > 0 {
                self.conflicts.store(remaining - 1, Ordering::SeqCst);
                return StatusCode::CONFLICT;
            }
            // A successful immediate apply bumps the version counter
            self.version.fetch_add(1, Ordering::SeqCst);
        }

        StatusCode::ACCEPTED
    }
}

async fn version_handler(State(state): State<DataplaneState>) -> Json<i64> {
    Json(state.version.load(Ordering::SeqCst))
}

async fn info_handler() -> Json<Value> {
    Json(json!({"api": {"version": "2.9.1"}}))
}

async fn start_transaction_handler(
    State(state): State<DataplaneState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let requested: i64 = params
        .get("version")
        .and_then(|v| v.parse().ok())
        .unwrap_or(-1);
    if requested != state.version.load(Ordering::SeqCst) {
        return (StatusCode::CONFLICT, Json(json!({"message": "stale version"})));
    }
    (
        StatusCode::CREATED,
        Json(json!({"id": "tx-0001", "status": "in_progress", "_version": requested})),
    )
}

async fn commit_transaction_handler(
    State(state): State<DataplaneState>,
    Path(_id): Path<String>,
) -> StatusCode {
    state.commits.fetch_add(1, Ordering::SeqCst);
    state.version.fetch_add(1, Ordering::SeqCst);
    StatusCode::ACCEPTED
}

async fn delete_transaction_handler(
    State(state): State<DataplaneState>,
    Path(_id): Path<String>,
) -> StatusCode {
    state.discards.fetch_add(1, Ordering::SeqCst);
    StatusCode::NO_CONTENT
}

async fn create_resource_handler(
    State(state): State<DataplaneState>,
    Path(collection): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    Json(_body): Json<Value>,
) -> StatusCode {
    state.handle_mutation("POST", &collection, &params)
}

async fn replace_resource_handler(
    State(state): State<DataplaneState>,
    Path((collection, _id)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
    Json(_body): Json<Value>,
) -> StatusCode {
    state.handle_mutation("PUT", &collection, &params)
}

async fn delete_resource_handler(
    State(state): State<DataplaneState>,
    Path((collection, _id)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
) -> StatusCode {
    state.handle_mutation("DELETE", &collection, &params)
}

/// Start the emulated Data Plane API and return its base URL
async fn start_dataplane(state: DataplaneState) -> String {
    let app = Router::new()
        .route(
            "/v2/services/haproxy/configuration/version",
            get(version_handler),
        )
        .route("/v2/info", get(info_handler))
        .route(
            "/v2/services/haproxy/transactions",
            post(start_transaction_handler),
        )
        .route(
            "/v2/services/haproxy/transactions/{id}",
            put(commit_transaction_handler).delete(delete_transaction_handler),
        )
        .route(
            "/v2/services/haproxy/configuration/{collection}",
            post(create_resource_handler),
        )
        .route(
            "/v2/services/haproxy/configuration/{collection}/{id}",
            put(replace_resource_handler).delete(delete_resource_handler),
        )
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test server");
    let addr = listener.local_addr().expect("Failed to get local address");

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    sleep(Duration::from_millis(50)).await;
    format!("http://{}", addr)
}

fn client_for(url: &str) -> DataplaneClient {
    DataplaneClient::new(url, "admin", Some("adminpwd".to_string()))
}

fn create_backend(name: &str) -> Box<dyn dpsync::apply::Change> {
    catalog::backend(
        ChangeOp::Create,
        name,
        Some(models::Backend {
            name: name.to_string(),
            ..Default::default()
        }),
    )
}

fn create_server(backend: &str, name: &str) -> Box<dyn dpsync::apply::Change> {
    catalog::server(
        ChangeOp::Create,
        backend,
        name,
        Some(models::Server {
            name: name.to_string(),
            address: "10.0.0.1".to_string(),
            port: Some(8080),
            ..Default::default()
        }),
    )
}

fn create_acl(backend: &str, name: &str, index: usize) -> Box<dyn dpsync::apply::Change> {
    catalog::acl(
        ChangeOp::Create,
        ParentRef::backend(backend),
        index,
        Some(models::Acl {
            acl_name: name.to_string(),
            criterion: "method".to_string(),
            value: Some("GET".to_string()),
        }),
    )
}

fn create_rule(backend: &str, index: usize) -> Box<dyn dpsync::apply::Change> {
    catalog::http_request_rule(
        ChangeOp::Create,
        ParentRef::backend(backend),
        index,
        Some(models::HttpRequestRule {
            rule_type: "deny".to_string(),
            cond: Some("if".to_string()),
            cond_test: Some("is_get".to_string()),
            ..Default::default()
        }),
    )
}

// ============================================================================
// Transactional passes
// ============================================================================

#[tokio::test]
async fn test_transactional_pass_commits_dependency_ordered_batch() {
    let state = DataplaneState::new();
    let url = start_dataplane(state.clone()).await;
    let client = client_for(&url);

    // Emitted in the worst possible order on purpose
    let mut batch = vec![
        create_acl("api", "is_get", 0),
        create_server("api", "web1"),
        create_backend("api"),
    ];
    order(&mut batch);

    let outcome = TransactionalApplier::new(&client)
        .apply(&batch, &CancellationToken::new())
        .await
        .expect("pass should commit");

    assert_eq!(outcome.applied, 3);
    assert_eq!(outcome.transaction, "tx-0001");
    assert_eq!(
        state.recorded_calls(),
        vec!["POST backends", "POST servers", "POST acls"]
    );
    assert_eq!(state.commits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_aborted_pass_stops_and_leaves_transaction_for_cleanup() {
    // The acl call (3rd of 5 in priority order) fails server-side
    let state = DataplaneState::new().with_failing_collection("acls");
    let url = start_dataplane(state.clone()).await;
    let client = client_for(&url);

    let mut batch = vec![
        create_rule("api", 0),
        create_backend("api"),
        create_acl("api", "is_get", 0),
        create_server("api", "web1"),
        create_rule("api", 1),
    ];
    order(&mut batch);

    let err = TransactionalApplier::new(&client)
        .apply(&batch, &CancellationToken::new())
        .await
        .expect_err("pass should abort");

    // Calls 4 and 5 were never issued, nothing was committed
    assert_eq!(
        state.recorded_calls(),
        vec!["POST backends", "POST servers", "POST acls"]
    );
    assert_eq!(state.commits.load(Ordering::SeqCst), 0);
    assert_eq!(err.applied, 2);
    assert!(err.to_string().contains("is_get"));

    // Caller-side cleanup discards the orphaned transaction
    let tx = err.transaction.expect("transaction id should be reported");
    client.delete_transaction(&tx).await.unwrap();
    assert_eq!(state.discards.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_delete_batch_runs_children_before_parents() {
    let state = DataplaneState::new();
    let url = start_dataplane(state.clone()).await;
    let client = client_for(&url);

    let mut batch = vec![
        catalog::backend(ChangeOp::Delete, "api", None),
        catalog::server(ChangeOp::Delete, "api", "web1", None),
        catalog::acl(ChangeOp::Delete, ParentRef::backend("api"), 0, None),
    ];
    order(&mut batch);

    TransactionalApplier::new(&client)
        .apply(&batch, &CancellationToken::new())
        .await
        .expect("pass should commit");

    assert_eq!(
        state.recorded_calls(),
        vec!["DELETE acls", "DELETE servers", "DELETE backends"]
    );
}

// ============================================================================
// Runtime passes
// ============================================================================

#[tokio::test]
async fn test_runtime_update_retries_stale_version_once() {
    // First versioned call conflicts; the engine refetches and succeeds.
    // Exactly two wire calls are observed.
    let state = DataplaneState::new().with_conflicts(1);
    let url = start_dataplane(state.clone()).await;
    let client = client_for(&url);

    let batch = vec![catalog::server(
        ChangeOp::Update,
        "api",
        "web1",
        Some(models::Server {
            name: "web1".to_string(),
            address: "10.0.0.1".to_string(),
            weight: Some(25),
            ..Default::default()
        }),
    )];

    let report = RuntimeApplier::new(&client)
        .apply(&batch, &CancellationToken::new())
        .await;

    assert!(report.is_success());
    assert_eq!(
        state.recorded_calls(),
        vec!["PUT servers", "PUT servers"]
    );
}

#[tokio::test]
async fn test_runtime_failures_are_independent() {
    let state = DataplaneState::new().with_failing_collection("servers");
    let url = start_dataplane(state.clone()).await;
    let client = client_for(&url);

    let batch = vec![
        create_server("api", "web1"),
        create_acl("api", "is_get", 0),
    ];

    let report = RuntimeApplier::new(&client)
        .apply(&batch, &CancellationToken::new())
        .await;

    // The server create failed but the acl was still attempted
    assert!(!report.is_success());
    assert_eq!(report.applied(), 1);
    assert_eq!(
        state.recorded_calls(),
        vec!["POST servers", "POST acls"]
    );
}

// ============================================================================
// Probes
// ============================================================================

#[tokio::test]
async fn test_version_and_info_probes() {
    let state = DataplaneState::new();
    let url = start_dataplane(state.clone()).await;
    let client = client_for(&url);

    assert_eq!(client.configuration_version().await.unwrap(), 7);

    let info = client.info().await.unwrap();
    assert_eq!(
        info.api.and_then(|a| a.version).as_deref(),
        Some("2.9.1")
    );
}
