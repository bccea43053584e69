//! The unit of work: one create/update/delete on one configuration element
//!
//! A change record is built once by a catalog factory from diff output,
//! stays immutable, and is consumed exactly once by an apply engine. The
//! wire payload is rebuilt on every attempt so a retry always carries the
//! freshest version number.

use async_trait::async_trait;

use super::error::ApplyError;
use crate::client::{ApplyParams, ConfigurationClient};

/// Whether a change creates, replaces or removes its element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOp {
    Create,
    Update,
    Delete,
}

impl ChangeOp {
    /// Lowercase verb for log and error messages
    pub fn verb(&self) -> &'static str {
        match self {
            ChangeOp::Create => "create",
            ChangeOp::Update => "update",
            ChangeOp::Delete => "delete",
        }
    }
}

/// How an element is addressed within its parent
///
/// Ordered-list elements (rules, ACLs, filters, log targets, captures,
/// checks) are addressed by 0-based position; everything else carries a
/// stable name unique within its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Position {
    Index(usize),
    Name(String),
}

impl Position {
    pub fn index(&self) -> Option<usize> {
        match self {
            Position::Index(i) => Some(*i),
            Position::Name(_) => None,
        }
    }
}

/// The owning section of a child element, identified purely by kind + name
///
/// Nesting is strictly two levels: section -> child. Container entries
/// (a nameserver inside a resolver, a user inside a userlist) point at
/// their immediate parent section the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRef {
    /// Section kind as the wire schema names it (e.g. "frontend")
    pub kind: &'static str,
    /// Section name
    pub name: String,
}

impl ParentRef {
    pub fn new(kind: &'static str, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    pub fn frontend(name: impl Into<String>) -> Self {
        Self::new("frontend", name)
    }

    pub fn backend(name: impl Into<String>) -> Self {
        Self::new("backend", name)
    }

    pub fn defaults(name: impl Into<String>) -> Self {
        Self::new("defaults", name)
    }
}

impl std::fmt::Display for ParentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} '{}'", self.kind, self.name)
    }
}

/// One pending configuration change
///
/// Implementations are the structural shapes in [`super::shape`]; engines
/// only ever see the trait. `element()` is a reporting label, never a
/// dispatch key.
#[async_trait]
pub trait Change: Send + Sync {
    /// Create, Update or Delete
    fn op(&self) -> ChangeOp;

    /// Element category, e.g. "backend", "server", "http_request_rule"
    fn element(&self) -> &'static str;

    /// Precedence tier from the priority table
    fn priority(&self) -> u8;

    /// Owning section, if this is a child element
    fn parent(&self) -> Option<&ParentRef>;

    /// Address within the parent; the global singleton has none
    fn position(&self) -> Option<&Position>;

    /// Human-readable description for logs and failure reports
    fn describe(&self) -> String;

    /// Structural checks that must pass before any network call
    fn validate(&self) -> Result<(), ApplyError>;

    /// Issue the wire call for this change
    ///
    /// `params` carries either a transaction id or a configuration version,
    /// depending on which engine is driving the pass.
    async fn apply(
        &self,
        client: &dyn ConfigurationClient,
        params: &ApplyParams,
    ) -> Result<(), ApplyError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_op_verbs() {
        assert_eq!(ChangeOp::Create.verb(), "create");
        assert_eq!(ChangeOp::Update.verb(), "update");
        assert_eq!(ChangeOp::Delete.verb(), "delete");
    }

    #[test]
    fn test_position_index_accessor() {
        assert_eq!(Position::Index(3).index(), Some(3));
        assert_eq!(Position::Name("web1".to_string()).index(), None);
    }

    #[test]
    fn test_parent_ref_display() {
        let parent = ParentRef::frontend("fe_main");
        assert_eq!(parent.to_string(), "frontend 'fe_main'");
        assert_eq!(parent.kind, "frontend");
    }
}
