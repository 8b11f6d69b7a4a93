//! Staged-table operations for the cutover pipeline: row counts and the
//! atomic staging→live promotion.
//!
//! For each reference table `{t}`, the external bulk loader fills
//! `{t}_staging`; a successful swap renames live to `{t}_previous` (kept for
//! one cycle) and staging to live, for every configured table, inside one
//! transaction. A failure anywhere rolls the whole attempt back so callers
//! never observe a half-swapped state.

use crate::{Error, Result, store::DisruptionStore};

/// The staging companion of a reference table.
pub fn staging_table(table: &str) -> String { format!("{table}_staging") }

/// The previous-cycle companion of a reference table.
pub fn previous_table(table: &str) -> String { format!("{table}_previous") }

/// Table names are interpolated into DDL; only plain identifiers are
/// accepted.
fn ensure_identifier(name: &str) -> Result<()> {
  let mut chars = name.chars();
  let head_ok = chars
    .next()
    .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
  if head_ok && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
    Ok(())
  } else {
    Err(Error::InvalidTableName(name.to_owned()))
  }
}

impl DisruptionStore {
  /// `SELECT COUNT(*)` over an arbitrary (validated) table name.
  pub async fn count_rows(&self, table: &str) -> Result<u64> {
    ensure_identifier(table)?;
    let sql = format!("SELECT COUNT(*) FROM {table}");
    let count: i64 = self
      .conn
      .call(move |conn| Ok(conn.query_row(&sql, [], |row| row.get(0))?))
      .await?;
    Ok(count as u64)
  }

  /// Promote staging to live for every table, atomically.
  ///
  /// Per table: drop `{t}_previous` if it exists, rename `{t}` to
  /// `{t}_previous`, rename `{t}_staging` to `{t}`. One transaction covers
  /// all tables; on any failure the transaction rolls back and the live
  /// tables are left exactly as they were.
  pub async fn swap_tables(&self, tables: &[String]) -> Result<()> {
    for table in tables {
      ensure_identifier(table)?;
    }
    let tables = tables.to_vec();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for table in &tables {
          let staging = staging_table(table);
          let previous = previous_table(table);
          tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {previous};
             ALTER TABLE {table} RENAME TO {previous};
             ALTER TABLE {staging} RENAME TO {table};"
          ))?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
