//! Sparse records — the raw shape of the upstream append-style store.
//!
//! A record is one fragment of a logical disruption, addressed by a partition
//! key (the owning organisation) and a compound sort key
//! `{entityId}#{kind}[#{index}][#{revisionTag}]`. Records are immutable from
//! this side; deletion is a soft flag, never physical removal.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  disruption::{
    Consequence, ConsequenceDetail, ConsequenceKind, JourneyRef, ServiceRef,
    SocialMediaPost, Status, StopRef,
  },
  time::combine,
};

// ─── Raw record ──────────────────────────────────────────────────────────────

/// One row of the sparse store, as returned by a scope scan. The typed fields
/// of the fragment stay semi-structured until a resolver asks for them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SparseRecord {
  /// Partition key: the owning organisation.
  pub partition_key: String,
  /// Compound sort key; see [`SortKey::parse`].
  pub sort_key:      String,
  /// Soft-delete flag. Deleted fragments survive the scan and are dropped
  /// during overlay resolution.
  #[serde(default)]
  pub deleted:       bool,
  /// Everything else on the row.
  #[serde(flatten)]
  pub body:          serde_json::Map<String, serde_json::Value>,
}

impl SparseRecord {
  /// Parse this record's sort key into its structured form.
  pub fn key(&self) -> Result<SortKey> { SortKey::parse(&self.sort_key) }

  fn payload<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
    Ok(serde_json::from_value(serde_json::Value::Object(
      self.body.clone(),
    ))?)
  }

  pub fn info(&self) -> Result<InfoFields> { self.payload() }

  pub fn consequence(&self) -> Result<ConsequenceFields> { self.payload() }

  pub fn social_media_post(&self) -> Result<SocialMediaPostFields> {
    self.payload()
  }

  pub fn history(&self) -> Result<HistoryFields> { self.payload() }
}

// ─── Sort key ────────────────────────────────────────────────────────────────

/// The fragment kind encoded in a sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
  Info,
  Consequence,
  SocialMediaPost,
  History,
}

/// The revision layer a fragment belongs to, parsed once at ingestion so
/// nothing downstream re-inspects key suffixes.
///
/// Precedence is `Base < Pending < Edit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Revision {
  /// The current / published layer (no suffix on the sort key).
  #[default]
  Base,
  /// Awaiting approval (`#PENDING` suffix).
  Pending,
  /// An in-progress edit of a published entity (`#EDIT` suffix).
  Edit,
}

/// A parsed compound sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
  pub entity_id: Uuid,
  pub kind:      RecordKind,
  /// Positional index; present for sub-collection fragments.
  pub index:     Option<u32>,
  pub revision:  Revision,
}

impl SortKey {
  /// Parse `{entityId}#{kind}[#{index}][#{revisionTag}]`.
  ///
  /// The index, when present, must precede the revision tag, and neither may
  /// appear twice.
  pub fn parse(raw: &str) -> Result<Self> {
    let malformed = || Error::MalformedSortKey(raw.to_owned());

    let mut parts = raw.split('#');
    let entity_id = parts
      .next()
      .and_then(|p| Uuid::parse_str(p).ok())
      .ok_or_else(malformed)?;

    let kind = match parts.next().ok_or_else(malformed)? {
      "INFO" => RecordKind::Info,
      "CONSEQUENCE" => RecordKind::Consequence,
      "SOCIALMEDIAPOST" => RecordKind::SocialMediaPost,
      "HISTORY" => RecordKind::History,
      other => return Err(Error::UnknownRecordKind(other.to_owned())),
    };

    let mut index = None;
    let mut revision = None;
    for part in parts {
      match part {
        "EDIT" | "PENDING" => {
          if revision.is_some() {
            return Err(malformed());
          }
          revision = Some(if part == "EDIT" {
            Revision::Edit
          } else {
            Revision::Pending
          });
        }
        p => {
          // An index after the revision tag (or a second index) is invalid.
          if revision.is_some() || index.is_some() {
            return Err(malformed());
          }
          index = Some(p.parse::<u32>().map_err(|_| malformed())?);
        }
      }
    }

    Ok(Self {
      entity_id,
      kind,
      index,
      revision: revision.unwrap_or_default(),
    })
  }
}

// ─── Typed fragment payloads ─────────────────────────────────────────────────

/// The typed fields of an INFO fragment. Dates and times keep the upstream
/// wire format (`DD/MM/YYYY`, `HHMM`) and are combined into UTC instants
/// during resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoFields {
  #[serde(default)]
  pub organisation_id:    Option<String>,
  pub status:             Status,
  #[serde(default)]
  pub summary:            String,
  #[serde(default)]
  pub description:        String,
  #[serde(default)]
  pub reason:             Option<String>,
  #[serde(default)]
  pub creation_time:      Option<DateTime<Utc>>,
  #[serde(default, with = "crate::time::uk_date")]
  pub start_date:         Option<NaiveDate>,
  #[serde(default, with = "crate::time::hhmm")]
  pub start_time:         Option<NaiveTime>,
  #[serde(default, with = "crate::time::uk_date")]
  pub end_date:           Option<NaiveDate>,
  #[serde(default, with = "crate::time::hhmm")]
  pub end_time:           Option<NaiveTime>,
  #[serde(default, with = "crate::time::uk_date")]
  pub publish_start_date: Option<NaiveDate>,
  #[serde(default, with = "crate::time::hhmm")]
  pub publish_start_time: Option<NaiveTime>,
  #[serde(default, with = "crate::time::uk_date")]
  pub publish_end_date:   Option<NaiveDate>,
  #[serde(default, with = "crate::time::hhmm")]
  pub publish_end_time:   Option<NaiveTime>,
}

impl InfoFields {
  /// The owner reference, or `None` when absent or empty. Fragments without
  /// an owner are treated as orphaned and discarded by the resolver.
  pub fn owner(&self) -> Option<&str> {
    self
      .organisation_id
      .as_deref()
      .filter(|s| !s.trim().is_empty())
  }
}

/// The typed fields of a CONSEQUENCE fragment. Payload lists that do not
/// apply to the declared kind are simply ignored at resolution time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsequenceFields {
  pub consequence_type: ConsequenceKind,
  #[serde(default)]
  pub description:      String,
  #[serde(default)]
  pub severity:         Option<String>,
  #[serde(default)]
  pub vehicle_mode:     Option<String>,
  #[serde(default)]
  pub disruption_delay: Option<u32>,
  #[serde(default)]
  pub operators:        Vec<String>,
  #[serde(default)]
  pub services:         Vec<ServiceRef>,
  #[serde(default)]
  pub stops:            Vec<StopRef>,
  #[serde(default)]
  pub journeys:         Vec<JourneyRef>,
}

impl ConsequenceFields {
  /// Convert to the domain shape, keeping only the payload list that applies
  /// to the declared kind.
  pub fn into_consequence(self, index: u32) -> Consequence {
    let detail = match self.consequence_type {
      ConsequenceKind::NetworkWide => ConsequenceDetail::NetworkWide,
      ConsequenceKind::OperatorWide => ConsequenceDetail::OperatorWide {
        operators: self.operators,
      },
      ConsequenceKind::Services => ConsequenceDetail::Services {
        services: self.services,
        stops:    self.stops,
      },
      ConsequenceKind::Stops => ConsequenceDetail::Stops { stops: self.stops },
      ConsequenceKind::Journeys => ConsequenceDetail::Journeys {
        journeys: self.journeys,
      },
    };
    Consequence {
      index,
      description: self.description,
      severity: self.severity,
      vehicle_mode: self.vehicle_mode,
      delay_minutes: self.disruption_delay,
      detail,
    }
  }
}

/// The typed fields of a SOCIALMEDIAPOST fragment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialMediaPostFields {
  #[serde(default)]
  pub message_content: String,
  #[serde(default, with = "crate::time::uk_date")]
  pub publish_date:    Option<NaiveDate>,
  #[serde(default, with = "crate::time::hhmm")]
  pub publish_time:    Option<NaiveTime>,
  #[serde(default)]
  pub account_type:    Option<String>,
  #[serde(default)]
  pub status:          Option<String>,
}

impl SocialMediaPostFields {
  pub fn into_post(self, index: u32) -> SocialMediaPost {
    SocialMediaPost {
      index,
      message: self.message_content,
      publish_time: combine(self.publish_date, self.publish_time),
      account_type: self.account_type,
      status: self.status,
    }
  }
}

/// The typed fields of a HISTORY fragment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryFields {
  pub datetime:      DateTime<Utc>,
  #[serde(default)]
  pub history_items: Vec<String>,
}
