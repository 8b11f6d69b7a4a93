//! The reconciliation run: scope scan → overlay resolution → validation →
//! batch upsert, routed per lifecycle destination.
//!
//! Discards and validation failures are recovered locally and reported as
//! counters; a write failure aborts the run and surfaces to the caller.

use chrono::Utc;
use detour_core::{
  disruption::{Destination, Disruption},
  resolve::{Mode, resolve_scope},
  source::RecordSource,
  validate::validate,
};
use detour_store_sqlite::{ChunkPolicy, DisruptionStore, flatten};
use uuid::Uuid;

use crate::{Error, Result};

/// Per-run counters, accumulated by the run and logged once at completion.
/// No process-wide state is involved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
  /// Records or entities skipped as orphaned or corrupt.
  pub discarded:       usize,
  /// Candidates rejected by the validator, per destination.
  pub invalid_current: usize,
  pub invalid_edited:  usize,
  /// Aggregates written, per destination.
  pub written_current: usize,
  pub written_edited:  usize,
}

/// Reconcile one scope: rebuild every aggregate from the sparse store and
/// upsert the valid ones into their destination tables.
pub async fn run<S: RecordSource>(
  source: &S,
  store: &DisruptionStore,
  org: Uuid,
  mode: Mode,
  policy: ChunkPolicy,
) -> Result<ReconcileReport> {
  let records = source
    .scan(org)
    .await
    .map_err(|e| Error::Source(Box::new(e)))?;
  tracing::debug!(%org, records = records.len(), "scope scan complete");

  let resolution = resolve_scope(&records, mode, Utc::now());

  let mut report = ReconcileReport {
    discarded: resolution.discarded,
    ..ReconcileReport::default()
  };
  let mut current: Vec<Disruption> = Vec::new();
  let mut edited: Vec<Disruption> = Vec::new();

  for candidate in resolution.disruptions {
    let destination = candidate.destination();
    match validate(&candidate) {
      Ok(()) => match destination {
        Destination::Current => current.push(candidate),
        Destination::Edited => edited.push(candidate),
      },
      Err(err) => {
        tracing::warn!(disruption = %candidate.id, error = %err, "invalid aggregate skipped");
        match destination {
          Destination::Current => report.invalid_current += 1,
          Destination::Edited => report.invalid_edited += 1,
        }
      }
    }
  }

  report.written_current =
    write_destination(store, Destination::Current, &current, policy).await?;
  report.written_edited =
    write_destination(store, Destination::Edited, &edited, policy).await?;

  tracing::info!(
    org = %org,
    discarded = report.discarded,
    invalid_current = report.invalid_current,
    invalid_edited = report.invalid_edited,
    written_current = report.written_current,
    written_edited = report.written_edited,
    "reconciliation complete"
  );
  Ok(report)
}

/// Write one destination's aggregates and their flattened consequences.
/// Each destination runs its own batch loops; batches committed here stay
/// committed even if the other destination fails later.
async fn write_destination(
  store: &DisruptionStore,
  destination: Destination,
  disruptions: &[Disruption],
  policy: ChunkPolicy,
) -> Result<usize> {
  let (disruption_rows, consequence_rows) = flatten(disruptions)?;
  let written = disruption_rows.len();

  store
    .upsert_disruptions(destination, disruption_rows, policy)
    .await?;
  store
    .upsert_consequences(destination, consequence_rows, policy)
    .await?;

  Ok(written)
}
