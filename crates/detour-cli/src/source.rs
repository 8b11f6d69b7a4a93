//! Loading an exported scope scan from disk.

use std::{
  fs::File,
  io::{BufRead, BufReader},
  path::Path,
};

use anyhow::Context as _;
use detour_core::{record::SparseRecord, source::MemorySource};

/// Read a JSON-lines export (one sparse record per line) into an in-memory
/// record source. Blank lines are skipped.
pub fn load_jsonl(path: &Path) -> anyhow::Result<MemorySource> {
  let file = File::open(path)
    .with_context(|| format!("opening {}", path.display()))?;

  let mut records = Vec::new();
  for (number, line) in BufReader::new(file).lines().enumerate() {
    let line =
      line.with_context(|| format!("reading {}", path.display()))?;
    if line.trim().is_empty() {
      continue;
    }
    let record: SparseRecord = serde_json::from_str(&line).with_context(
      || format!("{}:{}: invalid record", path.display(), number + 1),
    )?;
    records.push(record);
  }

  Ok(MemorySource::new(records))
}
