//! Change catalog
//!
//! One factory per element kind. Each factory pins the correct structural
//! shape, precedence tier, parent addressing and update capability for its
//! kind, so callers (the diff layer) can only build well-formed records.
//! The declarations are mechanical on purpose; all behavior lives in the
//! shapes.

use super::change::{Change, ChangeOp, ParentRef};
use super::priority;
use super::shape::{
    no_label, serialize_wire, GlobalChange, IndexedChildChange, KindSpec, NamedChildChange,
    SectionChange,
};
use crate::models;

// ============================================================================
// Kind descriptors
// ============================================================================

static GLOBAL: KindSpec = KindSpec {
    element: "global",
    collection: "global",
    priority: priority::SECTION,
    parent_param: None,
    supports_update: true,
};

static DEFAULTS: KindSpec = KindSpec {
    element: "defaults",
    collection: "defaults",
    priority: priority::SECTION,
    parent_param: None,
    supports_update: true,
};

static FRONTEND: KindSpec = KindSpec {
    element: "frontend",
    collection: "frontends",
    priority: priority::PROXY,
    parent_param: None,
    supports_update: true,
};

static BACKEND: KindSpec = KindSpec {
    element: "backend",
    collection: "backends",
    priority: priority::PROXY,
    parent_param: None,
    supports_update: true,
};

static CACHE: KindSpec = KindSpec {
    element: "cache",
    collection: "caches",
    priority: priority::SECTION,
    parent_param: None,
    supports_update: true,
};

static RESOLVER: KindSpec = KindSpec {
    element: "resolver",
    collection: "resolvers",
    priority: priority::LINKED_SECTION,
    parent_param: None,
    supports_update: false,
};

static RING: KindSpec = KindSpec {
    element: "ring",
    collection: "rings",
    priority: priority::SECTION,
    parent_param: None,
    supports_update: true,
};

static PROGRAM: KindSpec = KindSpec {
    element: "program",
    collection: "programs",
    priority: priority::SECTION,
    parent_param: None,
    supports_update: true,
};

static CRT_STORE: KindSpec = KindSpec {
    element: "crt_store",
    collection: "crt_stores",
    priority: priority::SECTION,
    parent_param: None,
    supports_update: true,
};

static LOG_FORWARD: KindSpec = KindSpec {
    element: "log_forward",
    collection: "log_forwards",
    priority: priority::SECTION,
    parent_param: None,
    supports_update: true,
};

static MAILERS: KindSpec = KindSpec {
    element: "mailers",
    collection: "mailers_section",
    priority: priority::LINKED_SECTION,
    parent_param: None,
    supports_update: false,
};

static PEERS: KindSpec = KindSpec {
    element: "peers",
    collection: "peer_section",
    priority: priority::LINKED_SECTION,
    parent_param: None,
    supports_update: false,
};

static USERLIST: KindSpec = KindSpec {
    element: "userlist",
    collection: "userlists",
    priority: priority::SECTION,
    parent_param: None,
    supports_update: false,
};

static FCGI_APP: KindSpec = KindSpec {
    element: "fcgi_app",
    collection: "fcgi_apps",
    priority: priority::SECTION,
    parent_param: None,
    supports_update: true,
};

static HTTP_ERRORS: KindSpec = KindSpec {
    element: "http_errors",
    collection: "http_errors_sections",
    priority: priority::SECTION,
    parent_param: None,
    supports_update: true,
};

static BIND: KindSpec = KindSpec {
    element: "bind",
    collection: "binds",
    priority: priority::CHILD,
    parent_param: Some("frontend"),
    supports_update: true,
};

static SERVER: KindSpec = KindSpec {
    element: "server",
    collection: "servers",
    priority: priority::CHILD,
    parent_param: Some("backend"),
    supports_update: true,
};

static SERVER_TEMPLATE: KindSpec = KindSpec {
    element: "server_template",
    collection: "server_templates",
    priority: priority::CHILD,
    parent_param: Some("backend"),
    supports_update: true,
};

static NAMESERVER: KindSpec = KindSpec {
    element: "nameserver",
    collection: "nameservers",
    priority: priority::CHILD,
    parent_param: Some("resolver"),
    supports_update: true,
};

static PEER_ENTRY: KindSpec = KindSpec {
    element: "peer_entry",
    collection: "peer_entries",
    priority: priority::CHILD,
    parent_param: Some("peer_section"),
    supports_update: true,
};

static USER: KindSpec = KindSpec {
    element: "user",
    collection: "users",
    priority: priority::CHILD,
    parent_param: Some("userlist"),
    supports_update: true,
};

static MAILER_ENTRY: KindSpec = KindSpec {
    element: "mailer_entry",
    collection: "mailer_entries",
    priority: priority::CHILD,
    parent_param: Some("mailers_section"),
    supports_update: true,
};

static TABLE: KindSpec = KindSpec {
    element: "table",
    collection: "tables",
    priority: priority::CHILD,
    parent_param: Some("peer_section"),
    supports_update: true,
};

static ACL: KindSpec = KindSpec {
    element: "acl",
    collection: "acls",
    priority: priority::ACL,
    parent_param: None,
    supports_update: true,
};

static FILTER: KindSpec = KindSpec {
    element: "filter",
    collection: "filters",
    priority: priority::RULE,
    parent_param: None,
    supports_update: true,
};

static LOG_TARGET: KindSpec = KindSpec {
    element: "log_target",
    collection: "log_targets",
    priority: priority::RULE,
    parent_param: None,
    supports_update: true,
};

static CAPTURE: KindSpec = KindSpec {
    element: "capture",
    collection: "captures",
    priority: priority::RULE,
    parent_param: Some("frontend"),
    supports_update: true,
};

static HTTP_REQUEST_RULE: KindSpec = KindSpec {
    element: "http_request_rule",
    collection: "http_request_rules",
    priority: priority::RULE,
    parent_param: None,
    supports_update: true,
};

static HTTP_RESPONSE_RULE: KindSpec = KindSpec {
    element: "http_response_rule",
    collection: "http_response_rules",
    priority: priority::RULE,
    parent_param: None,
    supports_update: true,
};

static HTTP_AFTER_RESPONSE_RULE: KindSpec = KindSpec {
    element: "http_after_response_rule",
    collection: "http_after_response_rules",
    priority: priority::RULE,
    parent_param: None,
    supports_update: true,
};

static TCP_REQUEST_RULE: KindSpec = KindSpec {
    element: "tcp_request_rule",
    collection: "tcp_request_rules",
    priority: priority::RULE,
    parent_param: None,
    supports_update: true,
};

static TCP_RESPONSE_RULE: KindSpec = KindSpec {
    element: "tcp_response_rule",
    collection: "tcp_response_rules",
    priority: priority::RULE,
    parent_param: Some("backend"),
    supports_update: true,
};

static BACKEND_SWITCHING_RULE: KindSpec = KindSpec {
    element: "backend_switching_rule",
    collection: "backend_switching_rules",
    priority: priority::RULE,
    parent_param: Some("frontend"),
    supports_update: true,
};

static SERVER_SWITCHING_RULE: KindSpec = KindSpec {
    element: "server_switching_rule",
    collection: "server_switching_rules",
    priority: priority::RULE,
    parent_param: Some("backend"),
    supports_update: true,
};

static STICK_RULE: KindSpec = KindSpec {
    element: "stick_rule",
    collection: "stick_rules",
    priority: priority::RULE,
    parent_param: Some("backend"),
    supports_update: true,
};

static HTTP_CHECK: KindSpec = KindSpec {
    element: "http_check",
    collection: "http_checks",
    priority: priority::RULE,
    parent_param: None,
    supports_update: true,
};

static TCP_CHECK: KindSpec = KindSpec {
    element: "tcp_check",
    collection: "tcp_checks",
    priority: priority::RULE,
    parent_param: None,
    supports_update: true,
};

// ============================================================================
// Description labels
// ============================================================================

fn bind_label(bind: &models::Bind) -> Option<String> {
    bind.endpoint()
}

fn acl_label(acl: &models::Acl) -> Option<String> {
    Some(acl.acl_name.clone())
}

fn filter_label(filter: &models::Filter) -> Option<String> {
    Some(filter.filter_type.clone())
}

fn log_target_label(target: &models::LogTarget) -> Option<String> {
    target.address.clone()
}

fn capture_label(capture: &models::Capture) -> Option<String> {
    Some(capture.capture_type.clone())
}

fn http_request_rule_label(rule: &models::HttpRequestRule) -> Option<String> {
    Some(rule.rule_type.clone())
}

fn http_response_rule_label(rule: &models::HttpResponseRule) -> Option<String> {
    Some(rule.rule_type.clone())
}

fn http_after_response_rule_label(rule: &models::HttpAfterResponseRule) -> Option<String> {
    Some(rule.rule_type.clone())
}

fn tcp_request_rule_label(rule: &models::TcpRequestRule) -> Option<String> {
    Some(rule.rule_type.clone())
}

fn tcp_response_rule_label(rule: &models::TcpResponseRule) -> Option<String> {
    Some(rule.rule_type.clone())
}

fn backend_switching_rule_label(rule: &models::BackendSwitchingRule) -> Option<String> {
    Some(format!("-> {}", rule.name))
}

fn server_switching_rule_label(rule: &models::ServerSwitchingRule) -> Option<String> {
    Some(format!("-> {}", rule.target_server))
}

fn stick_rule_label(rule: &models::StickRule) -> Option<String> {
    Some(rule.rule_type.clone())
}

fn http_check_label(check: &models::HttpCheck) -> Option<String> {
    Some(check.check_type.clone())
}

fn tcp_check_label(check: &models::TcpCheck) -> Option<String> {
    Some(check.action.clone())
}

// ============================================================================
// Section factories
// ============================================================================

/// The global section is a singleton; only Update is offered
pub fn global(payload: models::Global) -> Box<dyn Change> {
    Box::new(GlobalChange::update(&GLOBAL, payload, serialize_wire))
}

pub fn defaults(op: ChangeOp, name: &str, payload: Option<models::Defaults>) -> Box<dyn Change> {
    Box::new(SectionChange::new(&DEFAULTS, op, name, payload, serialize_wire))
}

pub fn frontend(op: ChangeOp, name: &str, payload: Option<models::Frontend>) -> Box<dyn Change> {
    Box::new(SectionChange::new(&FRONTEND, op, name, payload, serialize_wire))
}

pub fn backend(op: ChangeOp, name: &str, payload: Option<models::Backend>) -> Box<dyn Change> {
    Box::new(SectionChange::new(&BACKEND, op, name, payload, serialize_wire))
}

pub fn cache(op: ChangeOp, name: &str, payload: Option<models::Cache>) -> Box<dyn Change> {
    Box::new(SectionChange::new(&CACHE, op, name, payload, serialize_wire))
}

pub fn resolver(op: ChangeOp, name: &str, payload: Option<models::Resolver>) -> Box<dyn Change> {
    Box::new(SectionChange::new(&RESOLVER, op, name, payload, serialize_wire))
}

pub fn ring(op: ChangeOp, name: &str, payload: Option<models::Ring>) -> Box<dyn Change> {
    Box::new(SectionChange::new(&RING, op, name, payload, serialize_wire))
}

pub fn program(op: ChangeOp, name: &str, payload: Option<models::Program>) -> Box<dyn Change> {
    Box::new(SectionChange::new(&PROGRAM, op, name, payload, serialize_wire))
}

pub fn crt_store(op: ChangeOp, name: &str, payload: Option<models::CrtStore>) -> Box<dyn Change> {
    Box::new(SectionChange::new(&CRT_STORE, op, name, payload, serialize_wire))
}

pub fn log_forward(
    op: ChangeOp,
    name: &str,
    payload: Option<models::LogForward>,
) -> Box<dyn Change> {
    Box::new(SectionChange::new(&LOG_FORWARD, op, name, payload, serialize_wire))
}

pub fn mailers(
    op: ChangeOp,
    name: &str,
    payload: Option<models::MailersSection>,
) -> Box<dyn Change> {
    Box::new(SectionChange::new(&MAILERS, op, name, payload, serialize_wire))
}

pub fn peers(op: ChangeOp, name: &str, payload: Option<models::PeerSection>) -> Box<dyn Change> {
    Box::new(SectionChange::new(&PEERS, op, name, payload, serialize_wire))
}

pub fn userlist(op: ChangeOp, name: &str, payload: Option<models::Userlist>) -> Box<dyn Change> {
    Box::new(SectionChange::new(&USERLIST, op, name, payload, serialize_wire))
}

pub fn fcgi_app(op: ChangeOp, name: &str, payload: Option<models::FcgiApp>) -> Box<dyn Change> {
    Box::new(SectionChange::new(&FCGI_APP, op, name, payload, serialize_wire))
}

pub fn http_errors(
    op: ChangeOp,
    name: &str,
    payload: Option<models::HttpErrorsSection>,
) -> Box<dyn Change> {
    Box::new(SectionChange::new(&HTTP_ERRORS, op, name, payload, serialize_wire))
}

// ============================================================================
// Named child factories
// ============================================================================

pub fn bind(
    op: ChangeOp,
    frontend: &str,
    name: &str,
    payload: Option<models::Bind>,
) -> Box<dyn Change> {
    Box::new(NamedChildChange::new(
        &BIND,
        op,
        ParentRef::frontend(frontend),
        name,
        payload,
        serialize_wire,
        bind_label,
    ))
}

pub fn server(
    op: ChangeOp,
    backend: &str,
    name: &str,
    payload: Option<models::Server>,
) -> Box<dyn Change> {
    Box::new(NamedChildChange::new(
        &SERVER,
        op,
        ParentRef::backend(backend),
        name,
        payload,
        serialize_wire,
        no_label,
    ))
}

pub fn server_template(
    op: ChangeOp,
    backend: &str,
    prefix: &str,
    payload: Option<models::ServerTemplate>,
) -> Box<dyn Change> {
    Box::new(NamedChildChange::new(
        &SERVER_TEMPLATE,
        op,
        ParentRef::backend(backend),
        prefix,
        payload,
        serialize_wire,
        no_label,
    ))
}

pub fn nameserver(
    op: ChangeOp,
    resolver: &str,
    name: &str,
    payload: Option<models::Nameserver>,
) -> Box<dyn Change> {
    Box::new(NamedChildChange::new(
        &NAMESERVER,
        op,
        ParentRef::new("resolver", resolver),
        name,
        payload,
        serialize_wire,
        no_label,
    ))
}

pub fn peer_entry(
    op: ChangeOp,
    peers: &str,
    name: &str,
    payload: Option<models::PeerEntry>,
) -> Box<dyn Change> {
    Box::new(NamedChildChange::new(
        &PEER_ENTRY,
        op,
        ParentRef::new("peers", peers),
        name,
        payload,
        serialize_wire,
        no_label,
    ))
}

pub fn user(
    op: ChangeOp,
    userlist: &str,
    username: &str,
    payload: Option<models::User>,
) -> Box<dyn Change> {
    Box::new(NamedChildChange::new(
        &USER,
        op,
        ParentRef::new("userlist", userlist),
        username,
        payload,
        serialize_wire,
        no_label,
    ))
}

pub fn mailer_entry(
    op: ChangeOp,
    mailers: &str,
    name: &str,
    payload: Option<models::MailerEntry>,
) -> Box<dyn Change> {
    Box::new(NamedChildChange::new(
        &MAILER_ENTRY,
        op,
        ParentRef::new("mailers", mailers),
        name,
        payload,
        serialize_wire,
        no_label,
    ))
}

pub fn table(
    op: ChangeOp,
    peers: &str,
    name: &str,
    payload: Option<models::Table>,
) -> Box<dyn Change> {
    Box::new(NamedChildChange::new(
        &TABLE,
        op,
        ParentRef::new("peers", peers),
        name,
        payload,
        serialize_wire,
        no_label,
    ))
}

// ============================================================================
// Indexed child factories
// ============================================================================

pub fn acl(
    op: ChangeOp,
    parent: ParentRef,
    index: usize,
    payload: Option<models::Acl>,
) -> Box<dyn Change> {
    Box::new(IndexedChildChange::new(
        &ACL,
        op,
        parent,
        index,
        payload,
        serialize_wire,
        acl_label,
    ))
}

pub fn filter(
    op: ChangeOp,
    parent: ParentRef,
    index: usize,
    payload: Option<models::Filter>,
) -> Box<dyn Change> {
    Box::new(IndexedChildChange::new(
        &FILTER,
        op,
        parent,
        index,
        payload,
        serialize_wire,
        filter_label,
    ))
}

pub fn log_target(
    op: ChangeOp,
    parent: ParentRef,
    index: usize,
    payload: Option<models::LogTarget>,
) -> Box<dyn Change> {
    Box::new(IndexedChildChange::new(
        &LOG_TARGET,
        op,
        parent,
        index,
        payload,
        serialize_wire,
        log_target_label,
    ))
}

pub fn capture(
    op: ChangeOp,
    frontend: &str,
    index: usize,
    payload: Option<models::Capture>,
) -> Box<dyn Change> {
    Box::new(IndexedChildChange::new(
        &CAPTURE,
        op,
        ParentRef::frontend(frontend),
        index,
        payload,
        serialize_wire,
        capture_label,
    ))
}

pub fn http_request_rule(
    op: ChangeOp,
    parent: ParentRef,
    index: usize,
    payload: Option<models::HttpRequestRule>,
) -> Box<dyn Change> {
    Box::new(IndexedChildChange::new(
        &HTTP_REQUEST_RULE,
        op,
        parent,
        index,
        payload,
        serialize_wire,
        http_request_rule_label,
    ))
}

pub fn http_response_rule(
    op: ChangeOp,
    parent: ParentRef,
    index: usize,
    payload: Option<models::HttpResponseRule>,
) -> Box<dyn Change> {
    Box::new(IndexedChildChange::new(
        &HTTP_RESPONSE_RULE,
        op,
        parent,
        index,
        payload,
        serialize_wire,
        http_response_rule_label,
    ))
}

pub fn http_after_response_rule(
    op: ChangeOp,
    parent: ParentRef,
    index: usize,
    payload: Option<models::HttpAfterResponseRule>,
) -> Box<dyn Change> {
    Box::new(IndexedChildChange::new(
        &HTTP_AFTER_RESPONSE_RULE,
        op,
        parent,
        index,
        payload,
        serialize_wire,
        http_after_response_rule_label,
    ))
}

pub fn tcp_request_rule(
    op: ChangeOp,
    parent: ParentRef,
    index: usize,
    payload: Option<models::TcpRequestRule>,
) -> Box<dyn Change> {
    Box::new(IndexedChildChange::new(
        &TCP_REQUEST_RULE,
        op,
        parent,
        index,
        payload,
        serialize_wire,
        tcp_request_rule_label,
    ))
}

pub fn tcp_response_rule(
    op: ChangeOp,
    backend: &str,
    index: usize,
    payload: Option<models::TcpResponseRule>,
) -> Box<dyn Change> {
    Box::new(IndexedChildChange::new(
        &TCP_RESPONSE_RULE,
        op,
        ParentRef::backend(backend),
        index,
        payload,
        serialize_wire,
        tcp_response_rule_label,
    ))
}

pub fn backend_switching_rule(
    op: ChangeOp,
    frontend: &str,
    index: usize,
    payload: Option<models::BackendSwitchingRule>,
) -> Box<dyn Change> {
    Box::new(IndexedChildChange::new(
        &BACKEND_SWITCHING_RULE,
        op,
        ParentRef::frontend(frontend),
        index,
        payload,
        serialize_wire,
        backend_switching_rule_label,
    ))
}

pub fn server_switching_rule(
    op: ChangeOp,
    backend: &str,
    index: usize,
    payload: Option<models::ServerSwitchingRule>,
) -> Box<dyn Change> {
    Box::new(IndexedChildChange::new(
        &SERVER_SWITCHING_RULE,
        op,
        ParentRef::backend(backend),
        index,
        payload,
        serialize_wire,
        server_switching_rule_label,
    ))
}

pub fn stick_rule(
    op: ChangeOp,
    backend: &str,
    index: usize,
    payload: Option<models::StickRule>,
) -> Box<dyn Change> {
    Box::new(IndexedChildChange::new(
        &STICK_RULE,
        op,
        ParentRef::backend(backend),
        index,
        payload,
        serialize_wire,
        stick_rule_label,
    ))
}

pub fn http_check(
    op: ChangeOp,
    parent: ParentRef,
    index: usize,
    payload: Option<models::HttpCheck>,
) -> Box<dyn Change> {
    Box::new(IndexedChildChange::new(
        &HTTP_CHECK,
        op,
        parent,
        index,
        payload,
        serialize_wire,
        http_check_label,
    ))
}

pub fn tcp_check(
    op: ChangeOp,
    parent: ParentRef,
    index: usize,
    payload: Option<models::TcpCheck>,
) -> Box<dyn Change> {
    Box::new(IndexedChildChange::new(
        &TCP_CHECK,
        op,
        parent,
        index,
        payload,
        serialize_wire,
        tcp_check_label,
    ))
}
