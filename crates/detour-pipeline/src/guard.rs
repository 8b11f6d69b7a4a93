//! The cutover guard — row-count sanity checks run before any table is
//! touched.
//!
//! The guard protects against two upstream failure modes: a bulk load that
//! produced nothing at all, and a partial/truncated import that would
//! silently replace good data with materially less data.

use crate::{Error, Result};

/// Minimum staging/live row-count ratio, in percent. A staging copy holding
/// exactly this share of the live count still passes.
pub const MIN_RATIO_PERCENT: f64 = 75.0;

/// Check one table's staged row count against its live row count.
///
/// An empty staging table always fails. An empty live table is a bootstrap:
/// the ratio check is skipped. Otherwise the staged count must be at least
/// [`MIN_RATIO_PERCENT`] of the live count.
pub fn check_counts(table: &str, staging: u64, live: u64) -> Result<()> {
  if staging == 0 {
    return Err(Error::NoRowsImported { table: table.to_owned() });
  }
  if live == 0 {
    return Ok(());
  }

  let ratio = staging as f64 / live as f64 * 100.0;
  if ratio < MIN_RATIO_PERCENT {
    return Err(Error::RatioBelowThreshold { table: table.to_owned(), ratio });
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::check_counts;
  use crate::Error;

  #[test]
  fn empty_staging_fails_whatever_the_live_count() {
    assert!(matches!(
      check_counts("stops", 0, 0),
      Err(Error::NoRowsImported { .. })
    ));
    assert!(matches!(
      check_counts("stops", 0, 10_000),
      Err(Error::NoRowsImported { .. })
    ));
  }

  #[test]
  fn empty_live_table_is_a_bootstrap() {
    assert!(check_counts("stops", 1, 0).is_ok());
    assert!(check_counts("stops", 50_000, 0).is_ok());
  }

  #[test]
  fn threshold_is_inclusive_at_exactly_75_percent() {
    assert!(check_counts("stops", 750, 1000).is_ok());
  }

  #[test]
  fn just_below_threshold_fails_with_observed_ratio() {
    match check_counts("stops", 749, 1000) {
      Err(Error::RatioBelowThreshold { table, ratio }) => {
        assert_eq!(table, "stops");
        assert!((ratio - 74.9).abs() < 1e-9);
      }
      other => panic!("expected ratio failure, got {other:?}"),
    }
  }

  #[test]
  fn growth_passes() {
    assert!(check_counts("stops", 2000, 1000).is_ok());
  }
}
