//! The `RecordSource` trait — the scan seam over the sparse store.
//!
//! The upstream edit/approval workflow owns the store; this side only ever
//! scans it. Backends implement the trait; the pipeline depends on the
//! abstraction.

use std::{convert::Infallible, future::Future};

use uuid::Uuid;

use crate::record::SparseRecord;

/// Abstraction over a scan/query interface on the sparse store.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait RecordSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Return every record belonging to one scope (organisation).
  fn scan(
    &self,
    org: Uuid,
  ) -> impl Future<Output = Result<Vec<SparseRecord>, Self::Error>> + Send + '_;
}

/// An in-memory source over a fixed record set. Used by tests and by tooling
/// that loads an exported scan from disk.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
  records: Vec<SparseRecord>,
}

impl MemorySource {
  pub fn new(records: Vec<SparseRecord>) -> Self { Self { records } }
}

impl RecordSource for MemorySource {
  type Error = Infallible;

  async fn scan(&self, org: Uuid) -> Result<Vec<SparseRecord>, Infallible> {
    let org = org.hyphenated().to_string();
    Ok(
      self
        .records
        .iter()
        .filter(|record| record.partition_key == org)
        .cloned()
        .collect(),
    )
  }
}
