//! Internal configuration model
//!
//! Compact representations of the configuration elements this crate
//! reconciles. Field names follow the Data Plane wire schema so the
//! default transformation is plain serde serialization; kinds whose wire
//! shape diverges from the internal one get a custom transform in the
//! catalog.
//!
//! These are deliberately not a full mirror of the wire schema: each
//! struct carries the fields the reconciler reads or writes, nothing more.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ============================================================================
// Sections
// ============================================================================

/// The process-wide global section; a singleton, only ever updated
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Global {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maxconn: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbthread: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daemon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pidfile: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Defaults {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_timeout: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_timeout: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_timeout: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Frontend {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_backend: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maxconn: Option<i64>,
    /// Name of a defaults section this frontend inherits from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Backend {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<Balance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Name of a resolvers section used for server address resolution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolvers: Option<String>,
}

/// Load-balancing algorithm of a backend
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Balance {
    pub algorithm: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cache {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_max_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_object_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Resolver {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolve_retries: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_resolve: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted_payload_size: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ring {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maxlen: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(rename = "start-on-reload", skip_serializing_if = "Option::is_none")]
    pub start_on_reload: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrtStore {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crt_base: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_base: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogForward {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maxconn: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backlog: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MailersSection {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PeerSection {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Userlist {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FcgiApp {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docroot: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HttpErrorsSection {
    pub name: String,
    /// status code -> errorfile path
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub error_files: HashMap<String, String>,
}

// ============================================================================
// Named children
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Bind {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_certificate: Option<String>,
}

impl Bind {
    /// "address:port" when both are known; used for descriptions
    pub fn endpoint(&self) -> Option<String> {
        match (&self.address, self.port) {
            (Some(addr), Some(port)) => Some(format!("{}:{}", addr, port)),
            (Some(addr), None) => Some(addr.clone()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Server {
    pub name: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintenance: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerTemplate {
    pub prefix: String,
    pub num_or_range: String,
    pub fqdn: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Nameserver {
    pub name: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PeerEntry {
    pub name: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secure_password: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MailerEntry {
    pub name: String,
    pub address: String,
    pub port: i64,
}

/// Stick table declared inside a peers section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub table_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

// ============================================================================
// Indexed children
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Acl {
    pub acl_name: String,
    pub criterion: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Filter {
    #[serde(rename = "type")]
    pub filter_type: String,
    /// Ring name for trace filters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogTarget {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facility: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Capture {
    #[serde(rename = "type")]
    pub capture_type: String,
    pub length: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HttpRequestRule {
    #[serde(rename = "type")]
    pub rule_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cond: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cond_test: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hdr_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hdr_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redir_value: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HttpResponseRule {
    #[serde(rename = "type")]
    pub rule_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cond: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cond_test: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hdr_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hdr_format: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HttpAfterResponseRule {
    #[serde(rename = "type")]
    pub rule_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cond: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cond_test: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hdr_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TcpRequestRule {
    #[serde(rename = "type")]
    pub rule_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cond: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cond_test: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TcpResponseRule {
    #[serde(rename = "type")]
    pub rule_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cond: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cond_test: Option<String>,
}

/// Routes a frontend's traffic to a backend by name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendSwitchingRule {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cond: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cond_test: Option<String>,
}

/// Pins a backend's traffic to a server by name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerSwitchingRule {
    pub target_server: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cond: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cond_test: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StickRule {
    #[serde(rename = "type")]
    pub rule_type: String,
    pub pattern: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HttpCheck {
    #[serde(rename = "type")]
    pub check_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(rename = "match", skip_serializing_if = "Option::is_none")]
    pub match_: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TcpCheck {
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_serialization_skips_unset_fields() {
        let server = Server {
            name: "web1".to_string(),
            address: "10.0.0.1".to_string(),
            port: Some(8080),
            ..Default::default()
        };
        let json = serde_json::to_string(&server).unwrap();
        assert!(json.contains("web1"));
        assert!(json.contains("8080"));
        assert!(!json.contains("weight"));
        assert!(!json.contains("check"));
    }

    #[test]
    fn test_rule_type_field_renamed() {
        let rule = HttpRequestRule {
            rule_type: "deny".to_string(),
            cond: Some("if".to_string()),
            cond_test: Some("is_internal".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["type"], "deny");
        assert!(json.get("rule_type").is_none());
    }

    #[test]
    fn test_bind_endpoint() {
        let bind = Bind {
            name: "public".to_string(),
            address: Some("0.0.0.0".to_string()),
            port: Some(443),
            ..Default::default()
        };
        assert_eq!(bind.endpoint(), Some("0.0.0.0:443".to_string()));

        let unnamed = Bind::default();
        assert_eq!(unnamed.endpoint(), None);
    }
}
