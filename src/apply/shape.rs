//! Structural change shapes
//!
//! The ~40 element kinds fall into a small closed set of structural
//! categories: top-level sections addressed by name, the global singleton,
//! children addressed by list position, and children addressed by a stable
//! name within their parent (container entries such as a nameserver inside
//! a resolver use the same addressing, one level down). Each category is
//! one generic builder over a static per-kind descriptor, so the catalog
//! stays a flat list of declarations instead of forty hand-written types.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use super::change::{Change, ChangeOp, ParentRef, Position};
use super::error::ApplyError;
use crate::client::{ApplyParams, ConfigurationClient, ParentQuery, ResourceId, ResourceTarget};

/// Builds the wire payload from the internal model
///
/// `None` is a transformation failure and fails the change; it is never a
/// no-op.
pub type Transform<T> = fn(&T) -> Option<Value>;

/// Derives a semantic identifier from the payload for descriptions
pub type Label<T> = fn(&T) -> Option<String>;

/// Default transform: plain serde serialization
pub fn serialize_wire<T: Serialize>(payload: &T) -> Option<Value> {
    serde_json::to_value(payload).ok()
}

/// Default label: nothing better than the structural address
pub fn no_label<T>(_payload: &T) -> Option<String> {
    None
}

/// Static descriptor of one element kind
///
/// Exactly one of these exists per kind, wired up in the catalog; the
/// priority tier and update capability live here so the shapes never
/// special-case individual kinds.
#[derive(Debug)]
pub struct KindSpec {
    /// Element label used in reports, e.g. "http_request_rule"
    pub element: &'static str,
    /// Wire collection, e.g. "http_request_rules"
    pub collection: &'static str,
    /// Precedence tier from the priority table
    pub priority: u8,
    /// Dedicated parent query parameter, when the collection has one
    pub parent_param: Option<&'static str>,
    /// Whether the collection exposes a replace endpoint
    pub supports_update: bool,
}

fn require_payload<'a, T>(
    payload: &'a Option<T>,
    describe: impl Fn() -> String,
) -> Result<&'a T, ApplyError> {
    payload.as_ref().ok_or_else(|| ApplyError::Validation {
        description: describe(),
        reason: "payload is required for create and update".to_string(),
    })
}

fn require_name(name: &str, describe: impl Fn() -> String) -> Result<(), ApplyError> {
    if name.is_empty() {
        return Err(ApplyError::Validation {
            description: describe(),
            reason: "identifying name is empty".to_string(),
        });
    }
    Ok(())
}

fn check_update_supported(
    spec: &KindSpec,
    op: ChangeOp,
    describe: impl Fn() -> String,
) -> Result<(), ApplyError> {
    if op == ChangeOp::Update && !spec.supports_update {
        return Err(ApplyError::UnsupportedUpdate {
            description: describe(),
        });
    }
    Ok(())
}

// ============================================================================
// Top-level sections
// ============================================================================

/// A change on a top-level section, addressed by name
pub struct SectionChange<T> {
    spec: &'static KindSpec,
    op: ChangeOp,
    position: Position,
    payload: Option<T>,
    transform: Transform<T>,
}

impl<T: Send + Sync + 'static> SectionChange<T> {
    pub fn new(
        spec: &'static KindSpec,
        op: ChangeOp,
        name: impl Into<String>,
        payload: Option<T>,
        transform: Transform<T>,
    ) -> Self {
        Self {
            spec,
            op,
            position: Position::Name(name.into()),
            payload,
            transform,
        }
    }

    fn name(&self) -> &str {
        match &self.position {
            Position::Name(name) => name,
            Position::Index(_) => unreachable!("sections are always addressed by name"),
        }
    }

    fn wire(&self) -> Result<Value, ApplyError> {
        let payload = require_payload(&self.payload, || self.describe())?;
        (self.transform)(payload).ok_or_else(|| ApplyError::Transform {
            description: self.describe(),
        })
    }
}

#[async_trait]
impl<T: Send + Sync + 'static> Change for SectionChange<T> {
    fn op(&self) -> ChangeOp {
        self.op
    }

    fn element(&self) -> &'static str {
        self.spec.element
    }

    fn priority(&self) -> u8 {
        self.spec.priority
    }

    fn parent(&self) -> Option<&ParentRef> {
        None
    }

    fn position(&self) -> Option<&Position> {
        Some(&self.position)
    }

    fn describe(&self) -> String {
        format!("{} {} '{}'", self.op.verb(), self.spec.element, self.name())
    }

    fn validate(&self) -> Result<(), ApplyError> {
        require_name(self.name(), || self.describe())?;
        check_update_supported(self.spec, self.op, || self.describe())?;
        if self.op != ChangeOp::Delete {
            require_payload(&self.payload, || self.describe())?;
        }
        Ok(())
    }

    async fn apply(
        &self,
        client: &dyn ConfigurationClient,
        params: &ApplyParams,
    ) -> Result<(), ApplyError> {
        self.validate()?;
        let fail = |e| ApplyError::client(self.describe(), e);
        match self.op {
            ChangeOp::Create => {
                let target = ResourceTarget {
                    collection: self.spec.collection,
                    id: None,
                    parent: None,
                };
                client
                    .create_resource(&target, &self.wire()?, params)
                    .await
                    .map_err(fail)
            }
            ChangeOp::Update => {
                let target = ResourceTarget {
                    collection: self.spec.collection,
                    id: Some(ResourceId::Name(self.name())),
                    parent: None,
                };
                client
                    .replace_resource(&target, &self.wire()?, params)
                    .await
                    .map_err(fail)
            }
            ChangeOp::Delete => {
                let target = ResourceTarget {
                    collection: self.spec.collection,
                    id: Some(ResourceId::Name(self.name())),
                    parent: None,
                };
                client.delete_resource(&target, params).await.map_err(fail)
            }
        }
    }
}

// ============================================================================
// The global singleton
// ============================================================================

/// The process-wide global section; exactly one instance exists, so only
/// Update is meaningful and the catalog offers nothing else
pub struct GlobalChange<T> {
    spec: &'static KindSpec,
    payload: Option<T>,
    transform: Transform<T>,
}

impl<T: Send + Sync + 'static> GlobalChange<T> {
    pub fn update(spec: &'static KindSpec, payload: T, transform: Transform<T>) -> Self {
        Self {
            spec,
            payload: Some(payload),
            transform,
        }
    }

    fn wire(&self) -> Result<Value, ApplyError> {
        let payload = require_payload(&self.payload, || self.describe())?;
        (self.transform)(payload).ok_or_else(|| ApplyError::Transform {
            description: self.describe(),
        })
    }
}

#[async_trait]
impl<T: Send + Sync + 'static> Change for GlobalChange<T> {
    fn op(&self) -> ChangeOp {
        ChangeOp::Update
    }

    fn element(&self) -> &'static str {
        self.spec.element
    }

    fn priority(&self) -> u8 {
        self.spec.priority
    }

    fn parent(&self) -> Option<&ParentRef> {
        None
    }

    fn position(&self) -> Option<&Position> {
        None
    }

    fn describe(&self) -> String {
        format!("update {} configuration", self.spec.element)
    }

    fn validate(&self) -> Result<(), ApplyError> {
        require_payload(&self.payload, || self.describe())?;
        Ok(())
    }

    async fn apply(
        &self,
        client: &dyn ConfigurationClient,
        params: &ApplyParams,
    ) -> Result<(), ApplyError> {
        self.validate()?;
        let target = ResourceTarget {
            collection: self.spec.collection,
            id: None,
            parent: None,
        };
        client
            .replace_resource(&target, &self.wire()?, params)
            .await
            .map_err(|e| ApplyError::client(self.describe(), e))
    }
}

// ============================================================================
// Indexed children
// ============================================================================

/// A change on an ordered-list element, addressed by 0-based position
/// within its parent
///
/// The wire schema wants the position inside the payload for creates and
/// updates, so it is injected into the serialized body here rather than
/// carried by every internal model.
pub struct IndexedChildChange<T> {
    spec: &'static KindSpec,
    op: ChangeOp,
    parent: ParentRef,
    position: Position,
    payload: Option<T>,
    transform: Transform<T>,
    label: Label<T>,
}

impl<T: Send + Sync + 'static> IndexedChildChange<T> {
    pub fn new(
        spec: &'static KindSpec,
        op: ChangeOp,
        parent: ParentRef,
        index: usize,
        payload: Option<T>,
        transform: Transform<T>,
        label: Label<T>,
    ) -> Self {
        Self {
            spec,
            op,
            parent,
            position: Position::Index(index),
            payload,
            transform,
            label,
        }
    }

    fn index(&self) -> usize {
        match self.position {
            Position::Index(index) => index,
            Position::Name(_) => unreachable!("indexed children are always addressed by index"),
        }
    }

    fn wire(&self) -> Result<Value, ApplyError> {
        let payload = require_payload(&self.payload, || self.describe())?;
        let mut value = (self.transform)(payload).ok_or_else(|| ApplyError::Transform {
            description: self.describe(),
        })?;
        if let Some(map) = value.as_object_mut() {
            map.insert("index".to_string(), Value::from(self.index()));
        }
        Ok(value)
    }

    fn parent_query(&self) -> ParentQuery<'_> {
        ParentQuery {
            param: self.spec.parent_param,
            kind: self.parent.kind,
            name: &self.parent.name,
        }
    }
}

#[async_trait]
impl<T: Send + Sync + 'static> Change for IndexedChildChange<T> {
    fn op(&self) -> ChangeOp {
        self.op
    }

    fn element(&self) -> &'static str {
        self.spec.element
    }

    fn priority(&self) -> u8 {
        self.spec.priority
    }

    fn parent(&self) -> Option<&ParentRef> {
        Some(&self.parent)
    }

    fn position(&self) -> Option<&Position> {
        Some(&self.position)
    }

    fn describe(&self) -> String {
        let identity = self
            .payload
            .as_ref()
            .and_then(|p| (self.label)(p))
            .map(|label| format!("'{}'", label))
            .unwrap_or_else(|| format!("at index {}", self.index()));
        format!(
            "{} {} {} in {}",
            self.op.verb(),
            self.spec.element,
            identity,
            self.parent
        )
    }

    fn validate(&self) -> Result<(), ApplyError> {
        require_name(&self.parent.name, || self.describe())?;
        check_update_supported(self.spec, self.op, || self.describe())?;
        if self.op != ChangeOp::Delete {
            require_payload(&self.payload, || self.describe())?;
        }
        Ok(())
    }

    async fn apply(
        &self,
        client: &dyn ConfigurationClient,
        params: &ApplyParams,
    ) -> Result<(), ApplyError> {
        self.validate()?;
        let fail = |e| ApplyError::client(self.describe(), e);
        let parent = self.parent_query();
        match self.op {
            ChangeOp::Create => {
                let target = ResourceTarget {
                    collection: self.spec.collection,
                    id: None,
                    parent: Some(parent),
                };
                client
                    .create_resource(&target, &self.wire()?, params)
                    .await
                    .map_err(fail)
            }
            ChangeOp::Update => {
                let target = ResourceTarget {
                    collection: self.spec.collection,
                    id: Some(ResourceId::Index(self.index())),
                    parent: Some(parent),
                };
                client
                    .replace_resource(&target, &self.wire()?, params)
                    .await
                    .map_err(fail)
            }
            ChangeOp::Delete => {
                let target = ResourceTarget {
                    collection: self.spec.collection,
                    id: Some(ResourceId::Index(self.index())),
                    parent: Some(parent),
                };
                client.delete_resource(&target, params).await.map_err(fail)
            }
        }
    }
}

// ============================================================================
// Named children
// ============================================================================

/// A change on a child addressed by a stable name within its parent
///
/// Covers servers, binds and server templates as well as container
/// entries one level down (nameservers, users, peer and mailer entries,
/// tables); reordering never invalidates these addresses.
pub struct NamedChildChange<T> {
    spec: &'static KindSpec,
    op: ChangeOp,
    parent: ParentRef,
    position: Position,
    payload: Option<T>,
    transform: Transform<T>,
    label: Label<T>,
}

impl<T: Send + Sync + 'static> NamedChildChange<T> {
    pub fn new(
        spec: &'static KindSpec,
        op: ChangeOp,
        parent: ParentRef,
        name: impl Into<String>,
        payload: Option<T>,
        transform: Transform<T>,
        label: Label<T>,
    ) -> Self {
        Self {
            spec,
            op,
            parent,
            position: Position::Name(name.into()),
            payload,
            transform,
            label,
        }
    }

    fn name(&self) -> &str {
        match &self.position {
            Position::Name(name) => name,
            Position::Index(_) => unreachable!("named children are always addressed by name"),
        }
    }

    fn wire(&self) -> Result<Value, ApplyError> {
        let payload = require_payload(&self.payload, || self.describe())?;
        (self.transform)(payload).ok_or_else(|| ApplyError::Transform {
            description: self.describe(),
        })
    }

    fn parent_query(&self) -> ParentQuery<'_> {
        ParentQuery {
            param: self.spec.parent_param,
            kind: self.parent.kind,
            name: &self.parent.name,
        }
    }
}

#[async_trait]
impl<T: Send + Sync + 'static> Change for NamedChildChange<T> {
    fn op(&self) -> ChangeOp {
        self.op
    }

    fn element(&self) -> &'static str {
        self.spec.element
    }

    fn priority(&self) -> u8 {
        self.spec.priority
    }

    fn parent(&self) -> Option<&ParentRef> {
        Some(&self.parent)
    }

    fn position(&self) -> Option<&Position> {
        Some(&self.position)
    }

    fn describe(&self) -> String {
        let identity = self
            .payload
            .as_ref()
            .and_then(|p| (self.label)(p))
            .unwrap_or_else(|| self.name().to_string());
        format!(
            "{} {} '{}' in {}",
            self.op.verb(),
            self.spec.element,
            identity,
            self.parent
        )
    }

    fn validate(&self) -> Result<(), ApplyError> {
        require_name(self.name(), || self.describe())?;
        require_name(&self.parent.name, || self.describe())?;
        check_update_supported(self.spec, self.op, || self.describe())?;
        if self.op != ChangeOp::Delete {
            require_payload(&self.payload, || self.describe())?;
        }
        Ok(())
    }

    async fn apply(
        &self,
        client: &dyn ConfigurationClient,
        params: &ApplyParams,
    ) -> Result<(), ApplyError> {
        self.validate()?;
        let fail = |e| ApplyError::client(self.describe(), e);
        let parent = self.parent_query();
        match self.op {
            ChangeOp::Create => {
                let target = ResourceTarget {
                    collection: self.spec.collection,
                    id: None,
                    parent: Some(parent),
                };
                client
                    .create_resource(&target, &self.wire()?, params)
                    .await
                    .map_err(fail)
            }
            ChangeOp::Update => {
                let target = ResourceTarget {
                    collection: self.spec.collection,
                    id: Some(ResourceId::Name(self.name())),
                    parent: Some(parent),
                };
                client
                    .replace_resource(&target, &self.wire()?, params)
                    .await
                    .map_err(fail)
            }
            ChangeOp::Delete => {
                let target = ResourceTarget {
                    collection: self.spec.collection,
                    id: Some(ResourceId::Name(self.name())),
                    parent: Some(parent),
                };
                client.delete_resource(&target, params).await.map_err(fail)
            }
        }
    }
}
