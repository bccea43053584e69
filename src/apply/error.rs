//! Error taxonomy for the apply engines
//!
//! Validation and transformation failures are raised before any network
//! call and never retried. Version conflicts are retryable, but only on
//! the runtime path. Everything else is fatal for the change, and on the
//! transactional path fatal for the whole pass. Every variant carries the
//! offending record's description so operators can locate the failing
//! element without reading wire payloads.

use thiserror::Error;

use crate::client::ClientError;

#[derive(Error, Debug)]
pub enum ApplyError {
    /// Structural defect in the record itself (missing payload, empty
    /// identifying name)
    #[error("invalid {description}: {reason}")]
    Validation { description: String, reason: String },

    /// Internal-to-wire conversion produced nothing; treated exactly like
    /// a validation failure
    #[error("cannot build wire payload for {description}")]
    Transform { description: String },

    /// The element kind exposes no update endpoint; callers must model
    /// the change as delete + recreate
    #[error("{description}: element kind does not support updates")]
    UnsupportedUpdate { description: String },

    /// Version conflicts survived every allowed attempt on the runtime
    /// path
    #[error("{description}: version conflict persisted after {attempts} attempt(s)")]
    ConflictExhausted { description: String, attempts: usize },

    /// Transport or non-2xx failure from the control plane
    #[error("{description}: {source}")]
    Client {
        description: String,
        #[source]
        source: ClientError,
    },

    /// The pass was cancelled before this change was issued
    #[error("cancelled before {description}")]
    Cancelled { description: String },
}

impl ApplyError {
    pub(crate) fn client(description: impl Into<String>, source: ClientError) -> Self {
        ApplyError::Client {
            description: description.into(),
            source,
        }
    }

    /// True when the underlying failure is a version conflict the runtime
    /// engine may retry
    pub fn is_conflict(&self) -> bool {
        matches!(self, ApplyError::Client { source, .. } if source.is_conflict())
    }
}

/// Failure of a whole transactional pass
///
/// When `transaction` is set, the pass died after the transaction was
/// opened and the caller owns its cleanup (`delete_transaction`); nothing
/// from the pass has reached the live configuration either way.
#[derive(Debug)]
pub struct PassError {
    /// Open transaction left behind, if one was started
    pub transaction: Option<String>,
    /// Changes successfully staged before the failure
    pub applied: usize,
    pub source: ApplyError,
}

impl std::fmt::Display for PassError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.transaction {
            Some(id) => write!(
                f,
                "transaction {} aborted after {} staged change(s): {}",
                id, self.applied, self.source
            ),
            None => write!(f, "pass aborted before a transaction was opened: {}", self.source),
        }
    }
}

impl std::error::Error for PassError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}
