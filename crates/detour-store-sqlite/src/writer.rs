//! The batch upsert writer.
//!
//! Validated aggregates arrive flattened into row sets and are written in
//! fixed-size chunks to respect transaction limits. Each chunk is one
//! transaction issuing conflict-resolving upserts: on key conflict every
//! non-key column is overwritten with the incoming value, so re-running the
//! pipeline over the same source data is idempotent.

use detour_core::disruption::Destination;
use serde::Deserialize;

use crate::{
  Result,
  encode::{ConsequenceRow, DisruptionRow},
  store::DisruptionStore,
};

/// Rows per chunk; bounds the size of any single transaction.
pub const CHUNK_SIZE: usize = 1000;

/// What happens to chunks already committed when a later chunk fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkPolicy {
  /// Each chunk commits on its own. A failure aborts the remaining chunks
  /// but leaves earlier ones committed (at-least-once across chunks).
  #[default]
  Independent,
  /// All chunks share one transaction; a failure rolls everything back.
  AllOrNothing,
}

pub(crate) fn disruptions_table(destination: Destination) -> &'static str {
  match destination {
    Destination::Current => "disruptions",
    Destination::Edited => "disruptions_edited",
  }
}

pub(crate) fn consequences_table(destination: Destination) -> &'static str {
  match destination {
    Destination::Current => "consequences",
    Destination::Edited => "consequences_edited",
  }
}

// ─── Upsert SQL ──────────────────────────────────────────────────────────────

fn disruption_upsert_sql(table: &str) -> String {
  format!(
    "INSERT INTO {table} (
       disruption_id, organisation_id, status, summary, description, reason,
       creation_time, validity_start, validity_end, publish_start,
       publish_end, social_media_posts
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
     ON CONFLICT (disruption_id) DO UPDATE SET
       organisation_id    = excluded.organisation_id,
       status             = excluded.status,
       summary            = excluded.summary,
       description        = excluded.description,
       reason             = excluded.reason,
       creation_time      = excluded.creation_time,
       validity_start     = excluded.validity_start,
       validity_end       = excluded.validity_end,
       publish_start      = excluded.publish_start,
       publish_end        = excluded.publish_end,
       social_media_posts = excluded.social_media_posts"
  )
}

fn consequence_upsert_sql(table: &str) -> String {
  format!(
    "INSERT INTO {table} (
       disruption_id, consequence_index, kind, description, severity,
       vehicle_mode, delay_minutes, operators_json, services_json,
       stops_json, journeys_json
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
     ON CONFLICT (disruption_id, consequence_index) DO UPDATE SET
       kind           = excluded.kind,
       description    = excluded.description,
       severity       = excluded.severity,
       vehicle_mode   = excluded.vehicle_mode,
       delay_minutes  = excluded.delay_minutes,
       operators_json = excluded.operators_json,
       services_json  = excluded.services_json,
       stops_json     = excluded.stops_json,
       journeys_json  = excluded.journeys_json"
  )
}

fn bind_disruption(
  stmt: &mut rusqlite::Statement<'_>,
  row: &DisruptionRow,
) -> rusqlite::Result<()> {
  stmt.execute(rusqlite::params![
    row.disruption_id,
    row.organisation_id,
    row.status,
    row.summary,
    row.description,
    row.reason,
    row.creation_time,
    row.validity_start,
    row.validity_end,
    row.publish_start,
    row.publish_end,
    row.social_media_posts,
  ])?;
  Ok(())
}

fn bind_consequence(
  stmt: &mut rusqlite::Statement<'_>,
  row: &ConsequenceRow,
) -> rusqlite::Result<()> {
  stmt.execute(rusqlite::params![
    row.disruption_id,
    row.consequence_index,
    row.kind,
    row.description,
    row.severity,
    row.vehicle_mode,
    row.delay_minutes,
    row.operators_json,
    row.services_json,
    row.stops_json,
    row.journeys_json,
  ])?;
  Ok(())
}

// ─── Writer ──────────────────────────────────────────────────────────────────

impl DisruptionStore {
  /// Upsert disruption rows into the given destination. Returns the number
  /// of chunks issued.
  pub async fn upsert_disruptions(
    &self,
    destination: Destination,
    rows: Vec<DisruptionRow>,
    policy: ChunkPolicy,
  ) -> Result<usize> {
    self
      .upsert_chunks(
        &disruption_upsert_sql(disruptions_table(destination)),
        rows,
        policy,
        bind_disruption,
      )
      .await
  }

  /// Upsert consequence rows into the given destination. Returns the number
  /// of chunks issued.
  pub async fn upsert_consequences(
    &self,
    destination: Destination,
    rows: Vec<ConsequenceRow>,
    policy: ChunkPolicy,
  ) -> Result<usize> {
    self
      .upsert_chunks(
        &consequence_upsert_sql(consequences_table(destination)),
        rows,
        policy,
        bind_consequence,
      )
      .await
  }

  async fn upsert_chunks<R: Send + 'static>(
    &self,
    sql: &str,
    rows: Vec<R>,
    policy: ChunkPolicy,
    bind: fn(&mut rusqlite::Statement<'_>, &R) -> rusqlite::Result<()>,
  ) -> Result<usize> {
    if rows.is_empty() {
      return Ok(0);
    }

    let mut chunks: Vec<Vec<R>> = Vec::new();
    let mut remaining = rows;
    while remaining.len() > CHUNK_SIZE {
      let tail = remaining.split_off(CHUNK_SIZE);
      chunks.push(remaining);
      remaining = tail;
    }
    chunks.push(remaining);
    let issued = chunks.len();

    match policy {
      ChunkPolicy::Independent => {
        // A failed chunk aborts the loop; chunks already committed stay
        // committed.
        for chunk in chunks {
          let sql = sql.to_owned();
          self
            .conn
            .call(move |conn| {
              let tx = conn.transaction()?;
              {
                let mut stmt = tx.prepare(&sql)?;
                for row in &chunk {
                  bind(&mut stmt, row)?;
                }
              }
              tx.commit()?;
              Ok(())
            })
            .await?;
        }
      }
      ChunkPolicy::AllOrNothing => {
        let sql = sql.to_owned();
        self
          .conn
          .call(move |conn| {
            let tx = conn.transaction()?;
            {
              let mut stmt = tx.prepare(&sql)?;
              for chunk in &chunks {
                for row in chunk {
                  bind(&mut stmt, row)?;
                }
              }
            }
            tx.commit()?;
            Ok(())
          })
          .await?;
      }
    }

    Ok(issued)
  }
}
