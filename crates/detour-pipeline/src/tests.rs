//! End-to-end tests for the reconciliation and cutover runs against an
//! in-memory store.

use detour_core::{
  disruption::Destination,
  params::ParameterStore,
  resolve::Mode,
  source::MemorySource,
};
use detour_store_sqlite::{ChunkPolicy, DisruptionStore};
use serde_json::json;
use uuid::Uuid;

use crate::{
  Error,
  cutover::{self, SWITCH_DISABLED, SWITCH_ENABLED, SWITCH_KEY},
  reconcile,
};

async fn store() -> DisruptionStore {
  DisruptionStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn record(
  org: Uuid,
  sort_key: String,
  body: serde_json::Value,
) -> detour_core::record::SparseRecord {
  let serde_json::Value::Object(body) = body else {
    panic!("record body must be an object")
  };
  detour_core::record::SparseRecord {
    partition_key: org.hyphenated().to_string(),
    sort_key,
    deleted: false,
    body,
  }
}

fn info_body(org: Uuid, status: &str, summary: &str) -> serde_json::Value {
  json!({
    "organisationId": org.to_string(),
    "status": status,
    "summary": summary,
    "description": "Water main burst under the junction",
    "publishStartDate": "01/03/2024",
    "publishStartTime": "0800",
  })
}

// ─── Reconciliation ──────────────────────────────────────────────────────────

#[tokio::test]
async fn reconcile_routes_aggregates_to_their_destinations() {
  let s = store().await;
  let org = Uuid::new_v4();

  let published = Uuid::new_v4();
  let edited = Uuid::new_v4();
  let invalid = Uuid::new_v4();
  let orphan = Uuid::new_v4();

  let source = MemorySource::new(vec![
    // A plain published disruption with one consequence.
    record(org, format!("{published}#INFO"), info_body(org, "PUBLISHED", "Junction closed")),
    record(
      org,
      format!("{published}#CONSEQUENCE#0"),
      json!({
        "consequenceType": "operatorWide",
        "description": "All services delayed",
        "operators": ["FBRI"],
      }),
    ),
    // A published disruption with an in-flight edit: routes to the shadow
    // table as EDITING.
    record(org, format!("{edited}#INFO"), info_body(org, "PUBLISHED", "Diversion")),
    record(
      org,
      format!("{edited}#INFO#EDIT"),
      info_body(org, "PUBLISHED", "Diversion (amended)"),
    ),
    // Fails validation: empty summary.
    record(org, format!("{invalid}#INFO"), info_body(org, "PUBLISHED", "")),
    // Discarded: no base INFO.
    record(
      org,
      format!("{orphan}#INFO#PENDING"),
      info_body(org, "PENDING_APPROVAL", "pending only"),
    ),
  ]);

  let report = reconcile::run(
    &source,
    &s,
    org,
    Mode::Disruption,
    ChunkPolicy::Independent,
  )
  .await
  .unwrap();

  assert_eq!(report.written_current, 1);
  assert_eq!(report.written_edited, 1);
  assert_eq!(report.invalid_current, 1);
  assert_eq!(report.invalid_edited, 0);
  assert_eq!(report.discarded, 1);

  let row = s
    .get_disruption(Destination::Current, published)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(row.summary, "Junction closed");

  let consequence = s
    .get_consequence(Destination::Current, published, 0)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(consequence.kind, "operatorWide");
  assert!(consequence.operators_json.contains("FBRI"));
  assert_eq!(consequence.stops_json, "[]");

  // The published+EDIT aggregate lands in the shadow table, remapped.
  let row = s
    .get_disruption(Destination::Edited, edited)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(row.status, "EDITING");
  assert_eq!(row.summary, "Diversion (amended)");
  assert!(
    s.get_disruption(Destination::Current, edited)
      .await
      .unwrap()
      .is_none()
  );
}

#[tokio::test]
async fn reconcile_twice_is_idempotent() {
  let s = store().await;
  let org = Uuid::new_v4();
  let id = Uuid::new_v4();

  let source = MemorySource::new(vec![
    record(org, format!("{id}#INFO"), info_body(org, "PUBLISHED", "Roadworks")),
    record(
      org,
      format!("{id}#CONSEQUENCE#0"),
      json!({
        "consequenceType": "networkWide",
        "description": "Delays across the network",
      }),
    ),
  ]);

  let first =
    reconcile::run(&source, &s, org, Mode::Disruption, ChunkPolicy::Independent)
      .await
      .unwrap();
  let second =
    reconcile::run(&source, &s, org, Mode::Disruption, ChunkPolicy::Independent)
      .await
      .unwrap();

  assert_eq!(first, second);
  assert_eq!(s.count_rows("disruptions").await.unwrap(), 1);
  assert_eq!(s.count_rows("consequences").await.unwrap(), 1);
}

#[tokio::test]
async fn reconcile_ignores_records_from_other_scopes() {
  let s = store().await;
  let org = Uuid::new_v4();
  let other_org = Uuid::new_v4();
  let id = Uuid::new_v4();

  let source = MemorySource::new(vec![record(
    other_org,
    format!("{id}#INFO"),
    info_body(other_org, "PUBLISHED", "Elsewhere"),
  )]);

  let report = reconcile::run(&source, &s, org, Mode::Disruption, ChunkPolicy::Independent)
    .await
    .unwrap();
  assert_eq!(report.written_current, 0);
  assert_eq!(s.count_rows("disruptions").await.unwrap(), 0);
}

// ─── Cutover ─────────────────────────────────────────────────────────────────

async fn seed_reference_table(
  s: &DisruptionStore,
  table: &str,
  staging_rows: usize,
  live_rows: usize,
) {
  let mut sql = format!(
    "CREATE TABLE {table} (id INTEGER PRIMARY KEY, name TEXT);
     CREATE TABLE {table}_staging (id INTEGER PRIMARY KEY, name TEXT);"
  );
  for i in 0..staging_rows {
    sql.push_str(&format!("INSERT INTO {table}_staging (name) VALUES ('s{i}');"));
  }
  for i in 0..live_rows {
    sql.push_str(&format!("INSERT INTO {table} (name) VALUES ('l{i}');"));
  }
  s.execute_batch(&sql).await.unwrap();
}

#[tokio::test]
async fn armed_cutover_promotes_all_tables() {
  let s = store().await;
  seed_reference_table(&s, "stops", 80, 100).await;
  seed_reference_table(&s, "services", 60, 0).await;
  s.set(SWITCH_KEY, SWITCH_ENABLED).await.unwrap();

  let report = cutover::run(&s, &s, &["stops".into(), "services".into()])
    .await
    .unwrap();

  assert_eq!(
    report.promoted,
    vec![("stops".to_string(), 80), ("services".to_string(), 60)]
  );
  assert_eq!(s.count_rows("stops").await.unwrap(), 80);
  assert_eq!(s.count_rows("stops_previous").await.unwrap(), 100);
  assert_eq!(s.count_rows("services").await.unwrap(), 60);

  // A clean run leaves the switch armed for the next schedule.
  assert_eq!(s.get(SWITCH_KEY).await.unwrap().as_deref(), Some(SWITCH_ENABLED));
}

#[tokio::test]
async fn unset_switch_refuses_to_run() {
  let s = store().await;
  seed_reference_table(&s, "stops", 10, 0).await;

  let err = cutover::run(&s, &s, &["stops".into()]).await.unwrap_err();
  assert!(matches!(err, Error::SwitchUnset));
  assert_eq!(s.count_rows("stops").await.unwrap(), 0);
}

#[tokio::test]
async fn disarmed_switch_refuses_to_run() {
  let s = store().await;
  seed_reference_table(&s, "stops", 10, 0).await;
  s.set(SWITCH_KEY, SWITCH_DISABLED).await.unwrap();

  let err = cutover::run(&s, &s, &["stops".into()]).await.unwrap_err();
  assert!(matches!(err, Error::CutoverBlocked { .. }));
  // Only the exact proceed value arms the run; anything else blocks.
  s.set(SWITCH_KEY, "ENABLED").await.unwrap();
  let err = cutover::run(&s, &s, &["stops".into()]).await.unwrap_err();
  assert!(matches!(err, Error::CutoverBlocked { .. }));
}

#[tokio::test]
async fn guard_failure_aborts_everything_and_disarms_the_switch() {
  let s = store().await;
  // stops passes at 80%; services has an empty staging copy.
  seed_reference_table(&s, "stops", 80, 100).await;
  seed_reference_table(&s, "services", 0, 40).await;
  s.set(SWITCH_KEY, SWITCH_ENABLED).await.unwrap();

  let err = cutover::run(&s, &s, &["stops".into(), "services".into()])
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NoRowsImported { ref table } if table == "services"));

  // No table was touched, stops included.
  assert_eq!(s.count_rows("stops").await.unwrap(), 100);
  assert_eq!(s.count_rows("stops_staging").await.unwrap(), 80);
  assert_eq!(s.count_rows("services").await.unwrap(), 40);

  // A human has to re-arm before the next scheduled attempt can run.
  assert_eq!(
    s.get(SWITCH_KEY).await.unwrap().as_deref(),
    Some(SWITCH_DISABLED)
  );
}

#[tokio::test]
async fn ratio_below_threshold_aborts_with_percentage() {
  let s = store().await;
  seed_reference_table(&s, "stops", 749, 1000).await;
  s.set(SWITCH_KEY, SWITCH_ENABLED).await.unwrap();

  let err = cutover::run(&s, &s, &["stops".into()]).await.unwrap_err();
  match err {
    Error::RatioBelowThreshold { table, ratio } => {
      assert_eq!(table, "stops");
      assert!(ratio < 75.0);
    }
    other => panic!("expected ratio failure, got {other:?}"),
  }
  assert_eq!(
    s.get(SWITCH_KEY).await.unwrap().as_deref(),
    Some(SWITCH_DISABLED)
  );
}

#[tokio::test]
async fn swap_failure_rolls_back_and_disarms_the_switch() {
  let s = store().await;
  seed_reference_table(&s, "stops", 10, 10).await;
  // `stops_previous` exists as a view, so the swap's DROP TABLE fails after
  // the guard has already passed.
  s.execute_batch("CREATE VIEW stops_previous AS SELECT * FROM stops")
    .await
    .unwrap();
  s.set(SWITCH_KEY, SWITCH_ENABLED).await.unwrap();

  let err = cutover::run(&s, &s, &["stops".into()]).await.unwrap_err();
  assert!(matches!(err, Error::Store(_)));

  // Rolled back: staging and live are exactly as they were.
  assert_eq!(s.count_rows("stops").await.unwrap(), 10);
  assert_eq!(s.count_rows("stops_staging").await.unwrap(), 10);
  assert_eq!(
    s.get(SWITCH_KEY).await.unwrap().as_deref(),
    Some(SWITCH_DISABLED)
  );
}
