//! Error types for `detour-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("malformed sort key: {0:?}")]
  MalformedSortKey(String),

  #[error("unknown record kind: {0:?}")]
  UnknownRecordKind(String),

  #[error("record payload error: {0}")]
  Payload(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
