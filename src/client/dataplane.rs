//! Data Plane API client
//!
//! The configuration endpoints share one addressing scheme: a collection,
//! an optional resource id (name or list index) and an optional parent
//! query. Every mutating call carries either a transaction id or the
//! current configuration version, never both; the server answers a stale
//! version with 409, which is surfaced as its own error variant so the
//! runtime engine can retry it.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Base path for configuration resources
const CONFIGURATION_BASE: &str = "/v2/services/haproxy/configuration";

/// Base path for transactions
const TRANSACTIONS_BASE: &str = "/v2/services/haproxy/transactions";

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("version conflict: {0}")]
    VersionConflict(String),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(String),
}

impl ClientError {
    /// True for the optimistic-concurrency failure the runtime engine
    /// may retry
    pub fn is_conflict(&self) -> bool {
        matches!(self, ClientError::VersionConflict(_))
    }
}

/// Concurrency token attached to every mutating configuration call
///
/// A transaction id stages the change server-side for a single commit and
/// reload; a version number applies it immediately and fails with a
/// conflict if the live configuration moved in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyParams {
    Transaction(String),
    Version(i64),
}

/// Resource id within a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceId<'a> {
    Name(&'a str),
    Index(usize),
}

impl std::fmt::Display for ResourceId<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceId::Name(name) => write!(f, "{}", name),
            ResourceId::Index(index) => write!(f, "{}", index),
        }
    }
}

/// Parent addressing for child collections
///
/// Some collections use a dedicated query parameter (`?backend=` for
/// servers, `?resolver=` for nameservers); the rest take the generic
/// `parent_type`/`parent_name` pair.
#[derive(Debug, Clone, Copy)]
pub struct ParentQuery<'a> {
    pub param: Option<&'static str>,
    pub kind: &'a str,
    pub name: &'a str,
}

/// Wire address of one configuration resource
#[derive(Debug, Clone, Copy)]
pub struct ResourceTarget<'a> {
    pub collection: &'static str,
    pub id: Option<ResourceId<'a>>,
    pub parent: Option<ParentQuery<'a>>,
}

/// A server-side transaction as returned by the transactions endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct Transaction {
    pub id: String,
    #[serde(default)]
    pub status: String,
    #[serde(rename = "_version", default)]
    pub version: i64,
}

/// Process info reported by the API root, used by the `check` probe
#[derive(Debug, Clone, Deserialize)]
pub struct ApiInfo {
    #[serde(default)]
    pub api: Option<ApiBuildInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiBuildInfo {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(rename = "buildDate", default)]
    pub build_date: Option<String>,
}

// ============================================================================
// Trait for abstraction (allows mocking in tests)
// ============================================================================

/// The only contract the apply engines have with the transport layer
#[async_trait]
pub trait ConfigurationClient: Send + Sync {
    /// Current configuration version counter
    async fn configuration_version(&self) -> Result<i64, ClientError>;

    /// Open a transaction against the given configuration version
    async fn start_transaction(&self, version: i64) -> Result<Transaction, ClientError>;

    /// Commit a transaction, triggering a configuration reload
    async fn commit_transaction(&self, id: &str) -> Result<(), ClientError>;

    /// Discard a pending transaction (cleanup after an aborted pass)
    async fn delete_transaction(&self, id: &str) -> Result<(), ClientError>;

    async fn create_resource(
        &self,
        target: &ResourceTarget<'_>,
        body: &Value,
        params: &ApplyParams,
    ) -> Result<(), ClientError>;

    async fn replace_resource(
        &self,
        target: &ResourceTarget<'_>,
        body: &Value,
        params: &ApplyParams,
    ) -> Result<(), ClientError>;

    async fn delete_resource(
        &self,
        target: &ResourceTarget<'_>,
        params: &ApplyParams,
    ) -> Result<(), ClientError>;
}

// ============================================================================
// I/O implementation (real HTTP client)
// ============================================================================

#[derive(Clone)]
pub struct DataplaneClient {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: Option<String>,
}

impl DataplaneClient {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: Option<String>,
    ) -> Self {
        Self::with_timeout(base_url, username, password, Duration::from_secs(30))
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: Option<String>,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into(),
            username: username.into(),
            password,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Probe the API root; verifies reachability and credentials
    pub async fn info(&self) -> Result<ApiInfo, ClientError> {
        let url = format!("{}/v2/info", self.base_url.trim_end_matches('/'));
        let response = self.send(self.client.get(&url)).await?;
        response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, ClientError> {
        let response = req
            .basic_auth(&self.username, self.password.as_deref())
            .send()
            .await
            .map_err(|e| ClientError::Http(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::CONFLICT {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "configuration version changed".to_string());
            return Err(ClientError::VersionConflict(text));
        }
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        Ok(response)
    }
}

/// Path of a resource: the collection, plus the id segment when present
fn resource_path(target: &ResourceTarget<'_>) -> String {
    match &target.id {
        Some(id) => format!("{}/{}/{}", CONFIGURATION_BASE, target.collection, id),
        None => format!("{}/{}", CONFIGURATION_BASE, target.collection),
    }
}

/// Query pairs for parent addressing and the concurrency token
fn resource_query(target: &ResourceTarget<'_>, params: &ApplyParams) -> Vec<(String, String)> {
    let mut pairs = Vec::new();

    if let Some(parent) = &target.parent {
        match parent.param {
            Some(param) => pairs.push((param.to_string(), parent.name.to_string())),
            None => {
                pairs.push(("parent_type".to_string(), parent.kind.to_string()));
                pairs.push(("parent_name".to_string(), parent.name.to_string()));
            }
        }
    }

    match params {
        ApplyParams::Transaction(id) => pairs.push(("transaction_id".to_string(), id.clone())),
        ApplyParams::Version(v) => pairs.push(("version".to_string(), v.to_string())),
    }

    pairs
}

#[async_trait]
impl ConfigurationClient for DataplaneClient {
    async fn configuration_version(&self) -> Result<i64, ClientError> {
        let url = self.url(&format!("{}/version", CONFIGURATION_BASE));
        let response = self.send(self.client.get(&url)).await?;
        response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))
    }

    async fn start_transaction(&self, version: i64) -> Result<Transaction, ClientError> {
        let url = self.url(TRANSACTIONS_BASE);
        let response = self
            .send(
                self.client
                    .post(&url)
                    .query(&[("version", version.to_string())]),
            )
            .await?;
        response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))
    }

    async fn commit_transaction(&self, id: &str) -> Result<(), ClientError> {
        let url = self.url(&format!("{}/{}", TRANSACTIONS_BASE, id));
        self.send(self.client.put(&url)).await?;
        Ok(())
    }

    async fn delete_transaction(&self, id: &str) -> Result<(), ClientError> {
        let url = self.url(&format!("{}/{}", TRANSACTIONS_BASE, id));
        self.send(self.client.delete(&url)).await?;
        Ok(())
    }

    async fn create_resource(
        &self,
        target: &ResourceTarget<'_>,
        body: &Value,
        params: &ApplyParams,
    ) -> Result<(), ClientError> {
        let url = self.url(&resource_path(target));
        self.send(
            self.client
                .post(&url)
                .query(&resource_query(target, params))
                .json(body),
        )
        .await?;
        Ok(())
    }

    async fn replace_resource(
        &self,
        target: &ResourceTarget<'_>,
        body: &Value,
        params: &ApplyParams,
    ) -> Result<(), ClientError> {
        let url = self.url(&resource_path(target));
        self.send(
            self.client
                .put(&url)
                .query(&resource_query(target, params))
                .json(body),
        )
        .await?;
        Ok(())
    }

    async fn delete_resource(
        &self,
        target: &ResourceTarget<'_>,
        params: &ApplyParams,
    ) -> Result<(), ClientError> {
        let url = self.url(&resource_path(target));
        self.send(
            self.client
                .delete(&url)
                .query(&resource_query(target, params)),
        )
        .await?;
        Ok(())
    }
}

// ============================================================================
// Mock implementation for testing (no I/O)
// ============================================================================

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// One recorded mutating call
    #[derive(Debug, Clone)]
    pub struct RecordedCall {
        pub method: &'static str,
        pub collection: &'static str,
        pub id: Option<String>,
        pub parent: Option<String>,
        pub params: ApplyParams,
    }

    /// Scripted in-memory client
    ///
    /// Records every mutating call; can be told to conflict on the first N
    /// versioned calls, to fail the Nth mutating call outright, or to
    /// refuse to open a transaction.
    pub struct MockClient {
        version: AtomicI64,
        version_fetches: AtomicUsize,
        conflicts_remaining: AtomicUsize,
        fail_on_call: Option<usize>,
        fail_start: bool,
        calls: Mutex<Vec<RecordedCall>>,
        started: Mutex<Vec<String>>,
        committed: Mutex<Vec<String>>,
        discarded: Mutex<Vec<String>>,
    }

    impl MockClient {
        pub fn new() -> Self {
            Self {
                version: AtomicI64::new(1),
                version_fetches: AtomicUsize::new(0),
                conflicts_remaining: AtomicUsize::new(0),
                fail_on_call: None,
                fail_start: false,
                calls: Mutex::new(Vec::new()),
                started: Mutex::new(Vec::new()),
                committed: Mutex::new(Vec::new()),
                discarded: Mutex::new(Vec::new()),
            }
        }

        /// Conflict on the first `n` versioned mutating calls
        pub fn with_conflicts(self, n: usize) -> Self {
            self.conflicts_remaining.store(n, Ordering::SeqCst);
            self
        }

        /// Fail the `n`-th mutating call (1-based) with a 400
        pub fn with_failure_at(mut self, n: usize) -> Self {
            self.fail_on_call = Some(n);
            self
        }

        /// Refuse to open a transaction
        pub fn with_start_failure(mut self) -> Self {
            self.fail_start = true;
            self
        }

        pub fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().unwrap().clone()
        }

        pub fn version_fetches(&self) -> usize {
            self.version_fetches.load(Ordering::SeqCst)
        }

        pub fn committed(&self) -> Vec<String> {
            self.committed.lock().unwrap().clone()
        }

        pub fn discarded(&self) -> Vec<String> {
            self.discarded.lock().unwrap().clone()
        }

        fn record(
            &self,
            method: &'static str,
            target: &ResourceTarget<'_>,
            params: &ApplyParams,
        ) -> Result<(), ClientError> {
            let ordinal = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(RecordedCall {
                    method,
                    collection: target.collection,
                    id: target.id.map(|id| id.to_string()),
                    parent: target.parent.map(|p| format!("{}/{}", p.kind, p.name)),
                    params: params.clone(),
                });
                calls.len()
            };

            if self.fail_on_call == Some(ordinal) {
                return Err(ClientError::Api {
                    status: 400,
                    message: "scripted failure".to_string(),
                });
            }

            if matches!(params, ApplyParams::Version(_)) {
                let remaining = self.conflicts_remaining.load(Ordering::SeqCst);
                if remaining > 0 {
                    self.conflicts_remaining.store(remaining - 1, Ordering::SeqCst);
                    return Err(ClientError::VersionConflict(
                        "scripted conflict".to_string(),
                    ));
                }
            }

            Ok(())
        }
    }

    #[async_trait]
    impl ConfigurationClient for MockClient {
        async fn configuration_version(&self) -> Result<i64, ClientError> {
            self.version_fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.version.load(Ordering::SeqCst))
        }

        async fn start_transaction(&self, version: i64) -> Result<Transaction, ClientError> {
            if self.fail_start {
                return Err(ClientError::VersionConflict(
                    "transaction refused".to_string(),
                ));
            }
            let id = format!("tx-{}", self.started.lock().unwrap().len() + 1);
            self.started.lock().unwrap().push(id.clone());
            Ok(Transaction {
                id,
                status: "in_progress".to_string(),
                version,
            })
        }

        async fn commit_transaction(&self, id: &str) -> Result<(), ClientError> {
            self.committed.lock().unwrap().push(id.to_string());
            Ok(())
        }

        async fn delete_transaction(&self, id: &str) -> Result<(), ClientError> {
            self.discarded.lock().unwrap().push(id.to_string());
            Ok(())
        }

        async fn create_resource(
            &self,
            target: &ResourceTarget<'_>,
            _body: &Value,
            params: &ApplyParams,
        ) -> Result<(), ClientError> {
            self.record("create", target, params)
        }

        async fn replace_resource(
            &self,
            target: &ResourceTarget<'_>,
            _body: &Value,
            params: &ApplyParams,
        ) -> Result<(), ClientError> {
            self.record("replace", target, params)
        }

        async fn delete_resource(
            &self,
            target: &ResourceTarget<'_>,
            params: &ApplyParams,
        ) -> Result<(), ClientError> {
            self.record("delete", target, params)
        }
    }
}
