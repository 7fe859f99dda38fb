//! Pulse Store
//!
//! The relational store collaborator: per-metric-type tables with
//! insert-or-replace-on-natural-key semantics, backed by `sqlx` over SQLite.
//! The schema is generated from the metric-type registry at startup rather
//! than hand-written per type.
//!
//! Only processors mutate the store. Each store struct is scoped to one
//! metric type and its table(s):
//!
//! - [`ScalarStore`]: single-table types, batched upserts
//! - [`SeriesStore`]: parent row plus per-sample child rows
//! - [`SessionStore`]: parent row plus child interval rows, committed in a
//!   per-record transaction

pub mod entity;
pub mod scalar;
pub mod schema;
pub mod series;
pub mod session;

pub use entity::{
    RecordMeta, ScalarEntity, ScalarRow, SampleEntity, SeriesEntity, SeriesRow,
    SessionChildEntity, SessionChildRow, SessionEntity, SessionRow,
};
pub use scalar::ScalarStore;
pub use series::SeriesStore;
pub use session::SessionStore;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

/// Open a connection pool for the given SQLite url, creating the database
/// file if needed. Foreign keys are enabled on every connection so child
/// rows cascade when a parent is replaced.
pub async fn connect(url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
}

/// In-memory pool for tests. A single connection keeps every caller on the
/// same database, since each in-memory connection is otherwise private.
pub async fn memory() -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
}
