//! Pulse Ingest
//!
//! The ingestion pipeline: pulls time-stamped metric records from the
//! external provider, stages them durably as per-type container files, and
//! commits them into the relational store.
//!
//! Data flows one direction:
//!
//! ```text
//! provider -> Fetcher -> CanonicalRecord -> staging file -> Processor -> store
//! ```
//!
//! The [`orchestrator::FetchOrchestrator`] runs one fetch pass over the
//! metric-type registry and, when it staged anything, fires the
//! [`trigger::CommitTrigger`]; the [`orchestrator::CommitOrchestrator`]
//! drains the staging area file by file. Failures are isolated per type and
//! per file: a staged file stays in place until its commit succeeds.

pub mod config;
pub mod error;
pub mod fetch;
pub mod orchestrator;
pub mod processor;
pub mod provider;
pub mod scheduler;
pub mod staging;
pub mod trigger;

pub use config::IngestConfig;
pub use error::{CommitError, FetchError, StagingError};
pub use orchestrator::{CommitOrchestrator, CommitRunReport, FetchOrchestrator, FetchRunReport};
pub use scheduler::Scheduler;
pub use staging::{StagingArea, StagingBatch};
