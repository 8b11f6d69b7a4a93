//! The two batch jobs of the Detour core.
//!
//! [`reconcile`] drives a full scope scan through overlay resolution,
//! validation and the batch upsert writer. [`cutover`] guards and executes
//! the staged→live promotion of bulk-refreshed reference tables. The jobs
//! are independent, non-overlapping, and scheduled externally; neither holds
//! in-process locks.

pub mod cutover;
pub mod error;
pub mod guard;
pub mod reconcile;

pub use error::{Error, Result};

#[cfg(test)]
mod tests;
