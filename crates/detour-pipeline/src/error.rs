//! Error type for `detour-pipeline`.

use thiserror::Error;

/// Boxed error from a pluggable backend (record source or parameter store).
type BoxedError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  #[error("store error: {0}")]
  Store(#[from] detour_store_sqlite::Error),

  #[error("record source error: {0}")]
  Source(#[source] BoxedError),

  #[error("kill-switch read/write error: {0}")]
  Parameter(#[source] BoxedError),

  /// The kill-switch was readable but not in the proceed state.
  #[error("cutover is not armed (switch value {value:?}); refusing to swap")]
  CutoverBlocked { value: String },

  /// The kill-switch key has never been written.
  #[error("cutover kill-switch is unset; refusing to swap")]
  SwitchUnset,

  #[error("no rows imported into staging for table {table:?}")]
  NoRowsImported { table: String },

  #[error(
    "staging for table {table:?} holds only {ratio:.1}% of the live row \
     count; refusing to swap"
  )]
  RatioBelowThreshold { table: String, ratio: f64 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
