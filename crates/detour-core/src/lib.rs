//! Core types and resolution logic for the Detour disruption pipeline.
//!
//! This crate is deliberately free of database dependencies. It holds the
//! sparse-record model, the overlay resolver that reconstructs one disruption
//! aggregate out of overlapping revision layers, and the business-rule
//! validator applied before persistence. All other crates depend on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod disruption;
pub mod error;
pub mod params;
pub mod record;
pub mod resolve;
pub mod source;
pub mod time;
pub mod validate;

pub use error::{Error, Result};
