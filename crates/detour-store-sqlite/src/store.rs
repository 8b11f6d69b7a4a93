//! [`DisruptionStore`] — connection handling, schema initialisation and the
//! parameter-table implementation of [`ParameterStore`].

use std::path::Path;

use detour_core::{disruption::Destination, params::ParameterStore};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Result,
  encode::{ConsequenceRow, DisruptionRow, encode_uuid},
  schema::SCHEMA,
  writer::{consequences_table, disruptions_table},
};

/// The Detour relational store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct DisruptionStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl DisruptionStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Raw DDL/DML escape hatch. The bulk loader that populates staging
  /// reference tables lives outside this crate; tests use this to stand in
  /// for it.
  pub async fn execute_batch(&self, sql: &str) -> Result<()> {
    let sql = sql.to_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(&sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  /// Fetch one disruption row from the given destination, if present.
  pub async fn get_disruption(
    &self,
    destination: Destination,
    id: Uuid,
  ) -> Result<Option<DisruptionRow>> {
    let table = disruptions_table(destination);
    let id_str = encode_uuid(id);
    let sql = format!(
      "SELECT disruption_id, organisation_id, status, summary, description,
              reason, creation_time, validity_start, validity_end,
              publish_start, publish_end, social_media_posts
       FROM {table} WHERE disruption_id = ?1"
    );

    let row = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], |row| {
              Ok(DisruptionRow {
                disruption_id:      row.get(0)?,
                organisation_id:    row.get(1)?,
                status:             row.get(2)?,
                summary:            row.get(3)?,
                description:        row.get(4)?,
                reason:             row.get(5)?,
                creation_time:      row.get(6)?,
                validity_start:     row.get(7)?,
                validity_end:       row.get(8)?,
                publish_start:      row.get(9)?,
                publish_end:        row.get(10)?,
                social_media_posts: row.get(11)?,
              })
            })
            .optional()?,
        )
      })
      .await?;

    Ok(row)
  }

  /// Fetch one consequence row from the given destination, if present.
  pub async fn get_consequence(
    &self,
    destination: Destination,
    id: Uuid,
    index: u32,
  ) -> Result<Option<ConsequenceRow>> {
    let table = consequences_table(destination);
    let id_str = encode_uuid(id);
    let sql = format!(
      "SELECT disruption_id, consequence_index, kind, description, severity,
              vehicle_mode, delay_minutes, operators_json, services_json,
              stops_json, journeys_json
       FROM {table} WHERE disruption_id = ?1 AND consequence_index = ?2"
    );

    let row = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str, i64::from(index)], |row| {
              Ok(ConsequenceRow {
                disruption_id:     row.get(0)?,
                consequence_index: row.get(1)?,
                kind:              row.get(2)?,
                description:       row.get(3)?,
                severity:          row.get(4)?,
                vehicle_mode:      row.get(5)?,
                delay_minutes:     row.get(6)?,
                operators_json:    row.get(7)?,
                services_json:     row.get(8)?,
                stops_json:        row.get(9)?,
                journeys_json:     row.get(10)?,
              })
            })
            .optional()?,
        )
      })
      .await?;

    Ok(row)
  }
}

// ─── ParameterStore impl ─────────────────────────────────────────────────────

impl ParameterStore for DisruptionStore {
  type Error = crate::Error;

  async fn get(&self, key: &str) -> Result<Option<String>> {
    let key = key.to_owned();
    let value = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT value FROM parameters WHERE key = ?1",
              rusqlite::params![key],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    Ok(value)
  }

  async fn set(&self, key: &str, value: &str) -> Result<()> {
    let key = key.to_owned();
    let value = value.to_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO parameters (key, value) VALUES (?1, ?2)
           ON CONFLICT (key) DO UPDATE SET value = excluded.value",
          rusqlite::params![key, value],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
