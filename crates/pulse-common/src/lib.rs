//! Pulse Common Library
//!
//! Shared types, utilities, and error handling for the Pulse Sync project.
//!
//! # Overview
//!
//! This crate provides common functionality used across all workspace members:
//!
//! - **Error Handling**: the shared [`PulseError`] type and result alias
//! - **Logging**: centralized tracing initialization
//! - **Registry**: the static registry of supported metric types
//! - **Record Model**: the canonical, type-agnostic metric record
//! - **Time**: half-open time windows used by fetch runs

pub mod error;
pub mod logging;
pub mod record;
pub mod registry;
pub mod time;

// Re-export commonly used types
pub use error::{PulseError, Result};
pub use record::{CanonicalRecord, MetricPayload, Provenance, RecordTime};
pub use registry::{MetricKind, MetricType, TimeShape};
pub use time::TimeWindow;
