//! SQLite backend for the Detour disruption pipeline.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Holds the destination tables for the
//! reconciliation pipeline, the staged-table cutover operations, and the
//! parameters table backing the cutover kill-switch.

mod cutover;
mod encode;
mod schema;
mod store;
mod writer;

pub mod error;

pub use cutover::{previous_table, staging_table};
pub use encode::{ConsequenceRow, DisruptionRow, flatten};
pub use error::{Error, Result};
pub use store::DisruptionStore;
pub use writer::{CHUNK_SIZE, ChunkPolicy};
