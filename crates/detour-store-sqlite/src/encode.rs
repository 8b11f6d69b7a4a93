//! Flattening between the resolved aggregate and the plain-text row shapes
//! stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings, UUIDs as hyphenated
//! lowercase strings, and list payloads as compact JSON.

use chrono::{DateTime, Utc};
use detour_core::disruption::{Consequence, ConsequenceDetail, Disruption};
use uuid::Uuid;

use crate::Result;

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

const EMPTY_LIST: &str = "[]";

// ─── Row types ───────────────────────────────────────────────────────────────

/// One row of a `disruptions` table, ready to bind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisruptionRow {
  pub disruption_id:      String,
  pub organisation_id:    String,
  pub status:             String,
  pub summary:            String,
  pub description:        String,
  pub reason:             Option<String>,
  pub creation_time:      String,
  pub validity_start:     Option<String>,
  pub validity_end:       Option<String>,
  pub publish_start:      Option<String>,
  pub publish_end:        Option<String>,
  pub social_media_posts: String,
}

/// One row of a `consequences` table. Every payload list column is present
/// on every row; kinds the list does not apply to get `[]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsequenceRow {
  pub disruption_id:     String,
  pub consequence_index: i64,
  pub kind:              String,
  pub description:       String,
  pub severity:          Option<String>,
  pub vehicle_mode:      Option<String>,
  pub delay_minutes:     Option<i64>,
  pub operators_json:    String,
  pub services_json:     String,
  pub stops_json:        String,
  pub journeys_json:     String,
}

// ─── Flattening ──────────────────────────────────────────────────────────────

/// Flatten validated aggregates into the two row sets the writer upserts.
pub fn flatten(
  disruptions: &[Disruption],
) -> Result<(Vec<DisruptionRow>, Vec<ConsequenceRow>)> {
  let mut disruption_rows = Vec::with_capacity(disruptions.len());
  let mut consequence_rows = Vec::new();

  for disruption in disruptions {
    disruption_rows.push(disruption_row(disruption)?);
    for consequence in &disruption.consequences {
      consequence_rows.push(consequence_row(disruption.id, consequence)?);
    }
  }

  Ok((disruption_rows, consequence_rows))
}

fn disruption_row(disruption: &Disruption) -> Result<DisruptionRow> {
  Ok(DisruptionRow {
    disruption_id:      encode_uuid(disruption.id),
    organisation_id:    encode_uuid(disruption.organisation_id),
    status:             disruption.status.to_string(),
    summary:            disruption.summary.clone(),
    description:        disruption.description.clone(),
    reason:             disruption.reason.clone(),
    creation_time:      encode_dt(disruption.creation_time),
    validity_start:     disruption.validity_start.map(encode_dt),
    validity_end:       disruption.validity_end.map(encode_dt),
    publish_start:      disruption.publish_start.map(encode_dt),
    publish_end:        disruption.publish_end.map(encode_dt),
    social_media_posts: serde_json::to_string(&disruption.social_media_posts)?,
  })
}

fn consequence_row(
  disruption_id: Uuid,
  consequence: &Consequence,
) -> Result<ConsequenceRow> {
  let mut row = ConsequenceRow {
    disruption_id:     encode_uuid(disruption_id),
    consequence_index: i64::from(consequence.index),
    kind:              consequence.detail.kind().to_string(),
    description:       consequence.description.clone(),
    severity:          consequence.severity.clone(),
    vehicle_mode:      consequence.vehicle_mode.clone(),
    delay_minutes:     consequence.delay_minutes.map(i64::from),
    operators_json:    EMPTY_LIST.to_owned(),
    services_json:     EMPTY_LIST.to_owned(),
    stops_json:        EMPTY_LIST.to_owned(),
    journeys_json:     EMPTY_LIST.to_owned(),
  };

  match &consequence.detail {
    ConsequenceDetail::NetworkWide => {}
    ConsequenceDetail::OperatorWide { operators } => {
      row.operators_json = serde_json::to_string(operators)?;
    }
    ConsequenceDetail::Services { services, stops } => {
      row.services_json = serde_json::to_string(services)?;
      row.stops_json = serde_json::to_string(stops)?;
    }
    ConsequenceDetail::Stops { stops } => {
      row.stops_json = serde_json::to_string(stops)?;
    }
    ConsequenceDetail::Journeys { journeys } => {
      row.journeys_json = serde_json::to_string(journeys)?;
    }
  }

  Ok(row)
}
