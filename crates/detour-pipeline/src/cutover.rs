//! The cutover run: kill-switch gate, per-table guard, atomic swap.
//!
//! The kill-switch polarity is explicit: the stored value must be exactly
//! [`SWITCH_ENABLED`] for a swap to proceed. After a guard failure or any
//! swap error the switch is written back to [`SWITCH_DISABLED`] before the
//! error propagates, so the next scheduled attempt refuses to run until a
//! human re-arms it.

use detour_core::params::ParameterStore;
use detour_store_sqlite::{DisruptionStore, staging_table};

use crate::{Error, Result, guard};

/// Parameter key of the cutover kill-switch.
pub const SWITCH_KEY: &str = "cutover_enabled";
/// The single value that permits a swap.
pub const SWITCH_ENABLED: &str = "enabled";
/// Written back after any failed attempt.
pub const SWITCH_DISABLED: &str = "disabled";

/// The outcome of a successful cutover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CutoverReport {
  /// Per table: the staged row count that is now live.
  pub promoted: Vec<(String, u64)>,
}

/// Guard and execute the staged→live promotion for `tables`.
///
/// Reads the kill-switch first; an unreadable or unset switch is an error,
/// and any value other than [`SWITCH_ENABLED`] refuses the run without
/// touching anything. Guard and swap failures disarm the switch.
pub async fn run<P: ParameterStore>(
  store: &DisruptionStore,
  params: &P,
  tables: &[String],
) -> Result<CutoverReport> {
  let value = params
    .get(SWITCH_KEY)
    .await
    .map_err(|e| Error::Parameter(Box::new(e)))?
    .ok_or(Error::SwitchUnset)?;
  if value != SWITCH_ENABLED {
    return Err(Error::CutoverBlocked { value });
  }

  match attempt(store, tables).await {
    Ok(report) => {
      tracing::info!(tables = tables.len(), "cutover complete");
      Ok(report)
    }
    Err(err) => {
      // Operational alert: a failed cutover must not retry on the next
      // schedule without deliberate human re-arming.
      tracing::error!(error = %err, "cutover failed; disarming kill-switch");
      if let Err(set_err) = params.set(SWITCH_KEY, SWITCH_DISABLED).await {
        tracing::error!(error = %set_err, "failed to disarm kill-switch");
      }
      Err(err)
    }
  }
}

/// Check every table, then swap all of them in one transaction. The first
/// guard failure aborts the attempt before any rename is issued.
async fn attempt(
  store: &DisruptionStore,
  tables: &[String],
) -> Result<CutoverReport> {
  let mut promoted = Vec::with_capacity(tables.len());

  for table in tables {
    let staging = store.count_rows(&staging_table(table)).await?;
    let live = store.count_rows(table).await?;
    guard::check_counts(table, staging, live)?;
    tracing::debug!(table = table.as_str(), staging, live, "cutover guard passed");
    promoted.push((table.clone(), staging));
  }

  store.swap_tables(tables).await?;
  Ok(CutoverReport { promoted })
}
