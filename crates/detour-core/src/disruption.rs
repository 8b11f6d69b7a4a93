//! The disruption aggregate — the reconstructed entity.
//!
//! A disruption is never stored in this shape. It is computed fresh on each
//! reconciliation run by overlaying revision layers (see [`crate::resolve`])
//! and persisted by idempotent upsert.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Lifecycle status ────────────────────────────────────────────────────────

/// The lifecycle status of a disruption. The string form (strum) is what the
/// relational store and the sparse-record bodies carry.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
  Published,
  Draft,
  Rejected,
  PendingApproval,
  EditPendingApproval,
  Editing,
  PendingAndEditing,
}

/// Which destination table pair an aggregate is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
  /// The live tables: published, draft, rejected and pending-approval
  /// disruptions.
  Current,
  /// The shadow tables holding in-flight edits of published disruptions.
  Edited,
}

impl Status {
  pub fn destination(self) -> Destination {
    match self {
      Self::Published | Self::Draft | Self::Rejected | Self::PendingApproval => {
        Destination::Current
      }
      Self::EditPendingApproval | Self::Editing | Self::PendingAndEditing => {
        Destination::Edited
      }
    }
  }
}

// ─── Consequences ────────────────────────────────────────────────────────────

/// The scope of a consequence, matching the `consequenceType` discriminant on
/// the wire.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ConsequenceKind {
  NetworkWide,
  OperatorWide,
  Services,
  Stops,
  Journeys,
}

/// A bus service affected by a consequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRef {
  pub line_name:    String,
  #[serde(default)]
  pub operator_ref: Option<String>,
  #[serde(default)]
  pub destination:  Option<String>,
}

/// A stop affected by a consequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopRef {
  pub atco_code:   String,
  #[serde(default)]
  pub common_name: Option<String>,
}

/// A vehicle journey affected by a consequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyRef {
  pub journey_ref: String,
  #[serde(default)]
  pub line_ref:    Option<String>,
}

/// The kind-specific payload of a consequence. Lists that do not apply to a
/// kind do not exist here; the relational writer fills them in as empty
/// collections to keep the row schema uniform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ConsequenceDetail {
  NetworkWide,
  OperatorWide { operators: Vec<String> },
  Services {
    services: Vec<ServiceRef>,
    stops:    Vec<StopRef>,
  },
  Stops { stops: Vec<StopRef> },
  Journeys { journeys: Vec<JourneyRef> },
}

impl ConsequenceDetail {
  pub fn kind(&self) -> ConsequenceKind {
    match self {
      Self::NetworkWide => ConsequenceKind::NetworkWide,
      Self::OperatorWide { .. } => ConsequenceKind::OperatorWide,
      Self::Services { .. } => ConsequenceKind::Services,
      Self::Stops { .. } => ConsequenceKind::Stops,
      Self::Journeys { .. } => ConsequenceKind::Journeys,
    }
  }
}

/// One resolved consequence. Identity is the pair (disruption id, index);
/// at most one live consequence exists per index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consequence {
  pub index:         u32,
  pub description:   String,
  pub severity:      Option<String>,
  pub vehicle_mode:  Option<String>,
  pub delay_minutes: Option<u32>,
  pub detail:        ConsequenceDetail,
}

// ─── Social media posts ──────────────────────────────────────────────────────

/// One resolved social media post. Identity is (disruption id, index), same
/// as consequences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialMediaPost {
  pub index:        u32,
  pub message:      String,
  pub publish_time: Option<DateTime<Utc>>,
  pub account_type: Option<String>,
  pub status:       Option<String>,
}

// ─── History ─────────────────────────────────────────────────────────────────

/// One entry of a disruption's audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
  pub recorded_at: DateTime<Utc>,
  pub details:     Vec<String>,
}

// ─── Aggregate ───────────────────────────────────────────────────────────────

/// The reconstructed disruption aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Disruption {
  pub id:                 Uuid,
  pub organisation_id:    Uuid,
  pub status:             Status,
  pub summary:            String,
  pub description:        String,
  pub reason:             Option<String>,
  pub creation_time:      DateTime<Utc>,
  pub validity_start:     Option<DateTime<Utc>>,
  pub validity_end:       Option<DateTime<Utc>>,
  pub publish_start:      Option<DateTime<Utc>>,
  pub publish_end:        Option<DateTime<Utc>>,
  pub consequences:       Vec<Consequence>,
  pub social_media_posts: Vec<SocialMediaPost>,
  /// Empty for templates, which carry no audit trail.
  pub history:            Vec<HistoryEntry>,
}

impl Disruption {
  /// Destination table pair per the lifecycle classification.
  pub fn destination(&self) -> Destination { self.status.destination() }
}
