//! The `ParameterStore` trait — the external key-value control surface.
//!
//! The cutover kill-switch lives behind this seam. A read failure must
//! surface as an error; the pipeline never treats an unreadable switch as
//! permission to proceed.

use std::future::Future;

/// A small externally-stored key-value parameter set, readable and writable
/// by the pipeline.
pub trait ParameterStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Read a parameter. `Ok(None)` means the key has never been written.
  fn get<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + 'a;

  /// Write a parameter, overwriting any previous value.
  fn set<'a>(
    &'a self,
    key: &'a str,
    value: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
