//! # dpsync
//!
//! Declarative configuration sync for the HAProxy Data Plane API.
//!
//! A reconciliation pass starts from an unordered set of pending changes
//! (computed elsewhere by diffing a desired configuration snapshot
//! against the live one) and pushes them through this pipeline:
//!
//! ```text
//! diff output ──> catalog factories ──> orderer ──> apply engine ──> Data Plane API
//!                 (change records)      (safe       (transactional
//!                                        sequence)   or runtime)
//! ```
//!
//! The transactional engine stages the whole batch inside one
//! configuration-version transaction and commits it as a single reload;
//! the runtime engine applies hot changes one at a time with
//! optimistic-concurrency retry and no reload.

pub mod apply;
pub mod cli;
pub mod client;
pub mod context;
pub mod models;
