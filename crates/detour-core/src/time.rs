//! Date and time handling for the upstream wire formats.
//!
//! The sparse store carries dates as `DD/MM/YYYY` strings and times as
//! four-digit `HHMM` strings in separate fields. These serde helper modules
//! keep that format at the edge; [`combine`] produces the UTC instants the
//! rest of the pipeline works with.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

const DATE_FORMAT: &str = "%d/%m/%Y";
const TIME_FORMAT: &str = "%H%M";

/// Combine a wire-format date and time into a UTC instant.
///
/// A missing time means midnight; a missing date means the instant is absent
/// altogether.
pub fn combine(
  date: Option<NaiveDate>,
  time: Option<NaiveTime>,
) -> Option<DateTime<Utc>> {
  let date = date?;
  let time = time.unwrap_or(NaiveTime::MIN);
  Some(date.and_time(time).and_utc())
}

/// Serde helper for `Option<NaiveDate>` in `DD/MM/YYYY` form. Empty strings
/// deserialise to `None`.
pub mod uk_date {
  use chrono::NaiveDate;
  use serde::{Deserialize, Deserializer, Serializer, de};

  use super::DATE_FORMAT;

  pub fn serialize<S: Serializer>(
    date: &Option<NaiveDate>,
    ser: S,
  ) -> Result<S::Ok, S::Error> {
    match date {
      Some(d) => ser.serialize_str(&d.format(DATE_FORMAT).to_string()),
      None => ser.serialize_none(),
    }
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(
    de: D,
  ) -> Result<Option<NaiveDate>, D::Error> {
    let raw: Option<String> = Option::deserialize(de)?;
    match raw.as_deref() {
      None | Some("") => Ok(None),
      Some(s) => NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map(Some)
        .map_err(de::Error::custom),
    }
  }
}

/// Serde helper for `Option<NaiveTime>` in four-digit `HHMM` form. Empty
/// strings deserialise to `None`.
pub mod hhmm {
  use chrono::NaiveTime;
  use serde::{Deserialize, Deserializer, Serializer, de};

  use super::TIME_FORMAT;

  pub fn serialize<S: Serializer>(
    time: &Option<NaiveTime>,
    ser: S,
  ) -> Result<S::Ok, S::Error> {
    match time {
      Some(t) => ser.serialize_str(&t.format(TIME_FORMAT).to_string()),
      None => ser.serialize_none(),
    }
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(
    de: D,
  ) -> Result<Option<NaiveTime>, D::Error> {
    let raw: Option<String> = Option::deserialize(de)?;
    match raw.as_deref() {
      None | Some("") => Ok(None),
      Some(s) => NaiveTime::parse_from_str(s, TIME_FORMAT)
        .map(Some)
        .map_err(de::Error::custom),
    }
  }
}
