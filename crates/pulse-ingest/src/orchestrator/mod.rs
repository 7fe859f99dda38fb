//! Pipeline orchestrators
//!
//! [`FetchOrchestrator`] runs one fetch pass over the registry and stages
//! what it pulled; [`CommitOrchestrator`] drains the staging area into the
//! store. Both isolate failures per type: one type failing never stops the
//! others, and the run report says which ones failed.

pub mod commit;
pub mod fetch;

pub use commit::{CommitOrchestrator, CommitRunReport};
pub use fetch::{FetchOrchestrator, FetchRunReport};
