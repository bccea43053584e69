//! Runtime apply engine
//!
//! Applies changes that need no reload, one independent call at a time.
//! There is no transaction; each call carries the configuration version
//! that was current just before it, and a version conflict (concurrent
//! external mutation between fetch and apply) is retried with a fresh
//! version, up to a bound. The wire payload is rebuilt on every attempt.
//!
//! Submission follows the orderer's sequence, but outcomes are
//! independent: a failed change does not stop its siblings unless the
//! caller asks for stop-on-first-error.

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::change::Change;
use super::error::ApplyError;
use crate::client::{ApplyParams, ConfigurationClient};

/// Default number of fetch-and-apply attempts per change
pub const DEFAULT_RETRY_LIMIT: usize = 3;

/// Outcome of one change within a runtime pass
#[derive(Debug)]
pub struct ChangeResult {
    pub element: &'static str,
    pub description: String,
    pub outcome: Result<(), ApplyError>,
}

/// Per-pass report with one entry per attempted change
#[derive(Debug, Default)]
pub struct RuntimeReport {
    pub results: Vec<ChangeResult>,
}

impl RuntimeReport {
    pub fn is_success(&self) -> bool {
        self.results.iter().all(|r| r.outcome.is_ok())
    }

    pub fn applied(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_ok()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ChangeResult> {
        self.results.iter().filter(|r| r.outcome.is_err())
    }
}

pub struct RuntimeApplier<'a> {
    client: &'a dyn ConfigurationClient,
    retry_limit: usize,
    stop_on_error: bool,
}

impl<'a> RuntimeApplier<'a> {
    pub fn new(client: &'a dyn ConfigurationClient) -> Self {
        Self {
            client,
            retry_limit: DEFAULT_RETRY_LIMIT,
            stop_on_error: false,
        }
    }

    /// Bound the number of fetch-and-apply attempts per change
    pub fn with_retry_limit(mut self, limit: usize) -> Self {
        self.retry_limit = limit.max(1);
        self
    }

    /// Stop the pass at the first failing change instead of carrying on
    pub fn with_stop_on_error(mut self) -> Self {
        self.stop_on_error = true;
        self
    }

    /// Apply an ordered batch, one versioned call per change
    ///
    /// Cancellation stops issuing further calls; changes already applied
    /// stay in place.
    pub async fn apply(
        &self,
        changes: &[Box<dyn Change>],
        cancel: &CancellationToken,
    ) -> RuntimeReport {
        let mut report = RuntimeReport::default();

        for change in changes {
            if cancel.is_cancelled() {
                report.results.push(ChangeResult {
                    element: change.element(),
                    description: change.describe(),
                    outcome: Err(ApplyError::Cancelled {
                        description: change.describe(),
                    }),
                });
                break;
            }

            let outcome = self.apply_one(change.as_ref()).await;
            let failed = outcome.is_err();
            if let Err(e) = &outcome {
                warn!("{}", e);
            }
            report.results.push(ChangeResult {
                element: change.element(),
                description: change.describe(),
                outcome,
            });

            if failed && self.stop_on_error {
                break;
            }
        }

        report
    }

    async fn apply_one(&self, change: &dyn Change) -> Result<(), ApplyError> {
        change.validate()?;

        let mut attempts = 0usize;
        loop {
            attempts += 1;

            let version = self
                .client
                .configuration_version()
                .await
                .map_err(|e| ApplyError::client(change.describe(), e))?;

            debug!(
                "applying {} at version {} (attempt {}/{})",
                change.describe(),
                version,
                attempts,
                self.retry_limit
            );

            match change.apply(self.client, &ApplyParams::Version(version)).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_conflict() => {
                    if attempts >= self.retry_limit {
                        return Err(ApplyError::ConflictExhausted {
                            description: change.describe(),
                            attempts,
                        });
                    }
                    warn!(
                        "version conflict on {}, refetching (attempt {}/{})",
                        change.describe(),
                        attempts,
                        self.retry_limit
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }
}
