//! SQL schema for the Detour relational store.
//!
//! Two table pairs receive the reconciliation pipeline's output: the current
//! tables and their `_edited` shadows. Bulk-refreshed reference tables (and
//! their `_staging` / `_previous` companions) are created by the external
//! bulk loader, not here.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Published, draft, rejected and pending-approval disruptions.
-- Rows are fully overwritten on upsert; re-running a reconciliation over the
-- same source data is a no-op.
CREATE TABLE IF NOT EXISTS disruptions (
    disruption_id      TEXT PRIMARY KEY,
    organisation_id    TEXT NOT NULL,
    status             TEXT NOT NULL,
    summary            TEXT NOT NULL,
    description        TEXT NOT NULL,
    reason             TEXT,
    creation_time      TEXT NOT NULL,   -- ISO 8601 UTC
    validity_start     TEXT,
    validity_end       TEXT,
    publish_start      TEXT,
    publish_end        TEXT,
    social_media_posts TEXT NOT NULL DEFAULT '[]'   -- JSON list
);

-- Shadow copy holding in-flight edits of published disruptions.
CREATE TABLE IF NOT EXISTS disruptions_edited (
    disruption_id      TEXT PRIMARY KEY,
    organisation_id    TEXT NOT NULL,
    status             TEXT NOT NULL,
    summary            TEXT NOT NULL,
    description        TEXT NOT NULL,
    reason             TEXT,
    creation_time      TEXT NOT NULL,
    validity_start     TEXT,
    validity_end       TEXT,
    publish_start      TEXT,
    publish_end        TEXT,
    social_media_posts TEXT NOT NULL DEFAULT '[]'
);

-- Flattened consequences. Identity is (disruption_id, consequence_index);
-- payload list columns are always written, '[]' when not applicable to the
-- kind, so the row schema stays uniform.
CREATE TABLE IF NOT EXISTS consequences (
    disruption_id     TEXT NOT NULL,
    consequence_index INTEGER NOT NULL,
    kind              TEXT NOT NULL,
    description       TEXT NOT NULL,
    severity          TEXT,
    vehicle_mode      TEXT,
    delay_minutes     INTEGER,
    operators_json    TEXT NOT NULL DEFAULT '[]',
    services_json     TEXT NOT NULL DEFAULT '[]',
    stops_json        TEXT NOT NULL DEFAULT '[]',
    journeys_json     TEXT NOT NULL DEFAULT '[]',
    PRIMARY KEY (disruption_id, consequence_index)
);

CREATE TABLE IF NOT EXISTS consequences_edited (
    disruption_id     TEXT NOT NULL,
    consequence_index INTEGER NOT NULL,
    kind              TEXT NOT NULL,
    description       TEXT NOT NULL,
    severity          TEXT,
    vehicle_mode      TEXT,
    delay_minutes     INTEGER,
    operators_json    TEXT NOT NULL DEFAULT '[]',
    services_json     TEXT NOT NULL DEFAULT '[]',
    stops_json        TEXT NOT NULL DEFAULT '[]',
    journeys_json     TEXT NOT NULL DEFAULT '[]',
    PRIMARY KEY (disruption_id, consequence_index)
);

-- External key-value control surface; holds the cutover kill-switch.
CREATE TABLE IF NOT EXISTS parameters (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS disruptions_org_idx
    ON disruptions(organisation_id);
CREATE INDEX IF NOT EXISTS disruptions_edited_org_idx
    ON disruptions_edited(organisation_id);
CREATE INDEX IF NOT EXISTS consequences_disruption_idx
    ON consequences(disruption_id);
CREATE INDEX IF NOT EXISTS consequences_edited_disruption_idx
    ON consequences_edited(disruption_id);

PRAGMA user_version = 1;
";
