//! Overlay resolution — rebuilding one coherent disruption out of a set of
//! sparse, revision-tagged fragments.
//!
//! The sparse store holds up to three overlapping revision layers per entity:
//! the published base, a pending-approval layer and an in-progress edit
//! layer. Resolution applies the precedence `Base < Pending < Edit` to the
//! INFO fragment and merges sub-collection fragments layer by layer, keyed on
//! their positional index. The whole pass is a pure function of the scanned
//! record set; no persistent structure is mutated.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  Result,
  disruption::{
    Consequence, Disruption, HistoryEntry, SocialMediaPost, Status,
  },
  record::{
    HistoryFields, InfoFields, RecordKind, Revision, SortKey, SparseRecord,
  },
  time::combine,
};

// ─── Inputs and outputs ──────────────────────────────────────────────────────

/// What kind of entity a scope scan holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
  #[default]
  Disruption,
  /// Templates carry no audit trail; their history is omitted.
  Template,
}

/// The outcome of resolving one scope.
#[derive(Debug, Default)]
pub struct Resolution {
  /// One candidate aggregate per reconstructable entity. Candidates still
  /// need to pass [`crate::validate::validate`] before persistence.
  pub disruptions: Vec<Disruption>,
  /// Entities and records skipped as orphaned or corrupt. Discards are
  /// never an error.
  pub discarded:   usize,
}

/// Marker phrases of the history entry written when a disruption first
/// enters the store. Used as the creation-time fallback.
const CREATION_MARKERS: [&str; 2] =
  ["Disruption created", "Disruption submitted"];

// ─── Scope resolution ────────────────────────────────────────────────────────

/// Resolve every entity found in one scope scan.
///
/// An entity is reconstructable when it has a base INFO fragment and a
/// non-EDIT INFO fragment carrying a non-empty owner reference; everything
/// else is discarded, counted and logged at debug.
pub fn resolve_scope(
  records: &[SparseRecord],
  mode: Mode,
  now: DateTime<Utc>,
) -> Resolution {
  let mut entities: HashMap<Uuid, Vec<(SortKey, &SparseRecord)>> =
    HashMap::new();
  let mut discarded = 0usize;

  for record in records {
    match record.key() {
      Ok(key) => {
        entities.entry(key.entity_id).or_default().push((key, record));
      }
      Err(err) => {
        tracing::debug!(sort_key = %record.sort_key, error = %err, "unparseable sort key; record discarded");
        discarded += 1;
      }
    }
  }

  let mut disruptions = Vec::with_capacity(entities.len());
  for (entity_id, entity_records) in entities {
    match resolve_entity(entity_id, &entity_records, mode, now) {
      Some(disruption) => disruptions.push(disruption),
      None => discarded += 1,
    }
  }

  Resolution { disruptions, discarded }
}

// ─── Entity resolution ───────────────────────────────────────────────────────

fn resolve_entity(
  id: Uuid,
  records: &[(SortKey, &SparseRecord)],
  mode: Mode,
  now: DateTime<Utc>,
) -> Option<Disruption> {
  let info_at = |revision: Revision| {
    records
      .iter()
      .find(|(key, _)| key.kind == RecordKind::Info && key.revision == revision)
      .map(|(_, record)| *record)
  };

  // Without a base INFO fragment the entity cannot be reconstructed, even if
  // EDIT or PENDING fragments exist for it.
  let Some(base_record) = info_at(Revision::Base) else {
    tracing::debug!(entity = %id, "no base INFO record; entity discarded");
    return None;
  };
  let base_info = decode_info(id, base_record)?;
  let pending_info =
    info_at(Revision::Pending).and_then(|r| decode_info_lenient(id, r));
  let edit_info =
    info_at(Revision::Edit).and_then(|r| decode_info_lenient(id, r));

  // The owner reference must be present on a non-EDIT INFO fragment;
  // fragments without one are orphaned.
  let owner = base_info
    .owner()
    .or_else(|| pending_info.as_ref().and_then(InfoFields::owner))?;
  let Ok(organisation_id) = Uuid::parse_str(owner) else {
    tracing::debug!(entity = %id, owner, "unparseable owner reference; entity discarded");
    return None;
  };

  // INFO precedence: base < PENDING < EDIT.
  let from_edit = edit_info.is_some();
  let info = edit_info
    .or(pending_info)
    .unwrap_or(base_info);

  let consequences: Vec<Consequence> =
    overlay_items(records, RecordKind::Consequence, |record| {
      record.consequence()
    })
    .into_iter()
    .map(|(index, fields)| fields.into_consequence(index))
    .collect();

  let social_media_posts: Vec<SocialMediaPost> =
    overlay_items(records, RecordKind::SocialMediaPost, |record| {
      record.social_media_post()
    })
    .into_iter()
    .map(|(index, fields)| fields.into_post(index))
    .collect();

  let mut history = history_entries(records);
  history.sort_by_key(|entry| entry.recorded_at);

  let creation_time = info
    .creation_time
    .or_else(|| {
      history
        .iter()
        .find(|entry| {
          entry.details.iter().any(|line| {
            CREATION_MARKERS.iter().any(|marker| line.starts_with(marker))
          })
        })
        .map(|entry| entry.recorded_at)
    })
    .unwrap_or(now);

  // A published entity cannot show as published while an edit of it sits in
  // the shadow table.
  let mut status = info.status;
  if from_edit && status == Status::Published {
    status = Status::Editing;
  }

  Some(Disruption {
    id,
    organisation_id,
    status,
    summary: info.summary,
    description: info.description,
    reason: info.reason,
    creation_time,
    validity_start: combine(info.start_date, info.start_time),
    validity_end: combine(info.end_date, info.end_time),
    publish_start: combine(info.publish_start_date, info.publish_start_time),
    publish_end: combine(info.publish_end_date, info.publish_end_time),
    consequences,
    social_media_posts,
    history: match mode {
      Mode::Disruption => history,
      Mode::Template => Vec::new(),
    },
  })
}

fn decode_info(id: Uuid, record: &SparseRecord) -> Option<InfoFields> {
  match record.info() {
    Ok(info) => Some(info),
    Err(err) => {
      tracing::debug!(entity = %id, error = %err, "corrupt base INFO payload; entity discarded");
      None
    }
  }
}

/// Decode a PENDING or EDIT INFO payload; a corrupt overlay is treated as
/// absent rather than discarding the whole entity.
fn decode_info_lenient(id: Uuid, record: &SparseRecord) -> Option<InfoFields> {
  match record.info() {
    Ok(info) => Some(info),
    Err(err) => {
      tracing::debug!(entity = %id, sort_key = %record.sort_key, error = %err, "corrupt overlay INFO payload; layer ignored");
      None
    }
  }
}

// ─── Sub-collection overlay ──────────────────────────────────────────────────

/// Merge one sub-collection across revision layers.
///
/// Each layer is an index-keyed map; PENDING merges onto base and EDIT onto
/// the result, where merging is replace-if-match else append. Items whose
/// soft-delete flag is set anywhere in the winning layer are dropped after
/// both overlays.
fn overlay_items<T>(
  records: &[(SortKey, &SparseRecord)],
  kind: RecordKind,
  decode: impl Fn(&SparseRecord) -> Result<T>,
) -> Vec<(u32, T)> {
  let mut base: BTreeMap<u32, (bool, T)> = BTreeMap::new();
  let mut pending: BTreeMap<u32, (bool, T)> = BTreeMap::new();
  let mut edit: BTreeMap<u32, (bool, T)> = BTreeMap::new();

  for (key, record) in records.iter().filter(|(key, _)| key.kind == kind) {
    let Some(index) = key.index else {
      tracing::debug!(sort_key = %record.sort_key, "sub-collection record without index; skipped");
      continue;
    };
    let fields = match decode(record) {
      Ok(fields) => fields,
      Err(err) => {
        tracing::debug!(sort_key = %record.sort_key, error = %err, "corrupt sub-collection payload; skipped");
        continue;
      }
    };
    let layer = match key.revision {
      Revision::Base => &mut base,
      Revision::Pending => &mut pending,
      Revision::Edit => &mut edit,
    };
    layer.insert(index, (record.deleted, fields));
  }

  for (index, item) in pending {
    base.insert(index, item);
  }
  for (index, item) in edit {
    base.insert(index, item);
  }

  base
    .into_iter()
    .filter(|(_, (deleted, _))| !deleted)
    .map(|(index, (_, fields))| (index, fields))
    .collect()
}

fn history_entries(
  records: &[(SortKey, &SparseRecord)],
) -> Vec<HistoryEntry> {
  records
    .iter()
    .filter(|(key, record)| key.kind == RecordKind::History && !record.deleted)
    .filter_map(|(_, record)| match record.history() {
      Ok(HistoryFields { datetime, history_items }) => Some(HistoryEntry {
        recorded_at: datetime,
        details:     history_items,
      }),
      Err(err) => {
        tracing::debug!(sort_key = %record.sort_key, error = %err, "corrupt HISTORY payload; skipped");
        None
      }
    })
    .collect()
}
