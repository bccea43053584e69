//! Transactional apply engine
//!
//! Runs one reconciliation pass inside a single configuration-version
//! transaction: every change is staged server-side against the
//! transaction id, and the commit applies them all in one reload. The
//! pass is all-or-nothing; the first failure stops the sequence and
//! nothing reaches the live configuration.
//!
//! Calls are issued strictly sequentially. Each one mutates the pending
//! transaction state on the server, so concurrent calls within one
//! transaction are unsafe and never made.
//!
//! Aborting does not roll back: the engine stops issuing calls and
//! returns the transaction id inside the error, and the caller discards
//! the transaction (`delete_transaction`) as a follow-up.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::change::Change;
use super::error::{ApplyError, PassError};
use crate::client::{ApplyParams, ConfigurationClient};

/// Result of a committed pass
#[derive(Debug, Clone)]
pub struct TransactionOutcome {
    /// Id of the committed transaction
    pub transaction: String,
    /// Number of changes it carried
    pub applied: usize,
}

pub struct TransactionalApplier<'a> {
    client: &'a dyn ConfigurationClient,
}

impl<'a> TransactionalApplier<'a> {
    pub fn new(client: &'a dyn ConfigurationClient) -> Self {
        Self { client }
    }

    /// Apply an ordered batch under one transaction
    ///
    /// The batch is validated in full before any network call, so a
    /// malformed record aborts the pass before a transaction is even
    /// opened. Cancellation between calls stops the pass and leaves the
    /// open transaction to the caller.
    pub async fn apply(
        &self,
        changes: &[Box<dyn Change>],
        cancel: &CancellationToken,
    ) -> Result<TransactionOutcome, PassError> {
        for change in changes {
            change.validate().map_err(|source| PassError {
                transaction: None,
                applied: 0,
                source,
            })?;
        }

        if cancel.is_cancelled() {
            return Err(PassError {
                transaction: None,
                applied: 0,
                source: ApplyError::Cancelled {
                    description: "transactional pass".to_string(),
                },
            });
        }

        let version = self
            .client
            .configuration_version()
            .await
            .map_err(|e| PassError {
                transaction: None,
                applied: 0,
                source: ApplyError::client("fetch configuration version", e),
            })?;

        let transaction = self
            .client
            .start_transaction(version)
            .await
            .map_err(|e| PassError {
                transaction: None,
                applied: 0,
                source: ApplyError::client(
                    format!("start transaction at version {}", version),
                    e,
                ),
            })?;

        debug!(
            "transaction {} opened at version {}",
            transaction.id, version
        );

        let params = ApplyParams::Transaction(transaction.id.clone());
        let mut applied = 0usize;

        for change in changes {
            if cancel.is_cancelled() {
                return Err(PassError {
                    transaction: Some(transaction.id.clone()),
                    applied,
                    source: ApplyError::Cancelled {
                        description: change.describe(),
                    },
                });
            }

            debug!("staging {}", change.describe());
            if let Err(source) = change.apply(self.client, &params).await {
                warn!(
                    "aborting transaction {} after {} staged change(s): {}",
                    transaction.id, applied, source
                );
                return Err(PassError {
                    transaction: Some(transaction.id.clone()),
                    applied,
                    source,
                });
            }
            applied += 1;
        }

        self.client
            .commit_transaction(&transaction.id)
            .await
            .map_err(|e| PassError {
                transaction: Some(transaction.id.clone()),
                applied,
                source: ApplyError::client(
                    format!("commit transaction {}", transaction.id),
                    e,
                ),
            })?;

        info!(
            "transaction {} committed with {} change(s)",
            transaction.id, applied
        );

        Ok(TransactionOutcome {
            transaction: transaction.id,
            applied,
        })
    }
}
