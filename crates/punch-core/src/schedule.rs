//! Work schedule and arrival classification.
//!
//! An arrival is `Late` only when it falls strictly after the work start plus
//! the grace window, measured on the wall clock of the configured timezone.
//! Arriving early is simply `Present`.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{Error, Result};

// ─── Arrival ─────────────────────────────────────────────────────────────────

/// Outcome of classifying a check-in instant against a [`WorkSchedule`].
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
pub enum Arrival {
  Present,
  Late,
  /// The instant could not be interpreted as a point in time.
  Invalid,
}

// ─── Schedule ────────────────────────────────────────────────────────────────

/// The working day, interpreted in a single named timezone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkSchedule {
  #[serde(with = "hh_mm")]
  pub work_start:    NaiveTime,
  pub grace_minutes: u32,
  /// Not used by any rule yet; kept so deployments can configure it.
  #[serde(with = "hh_mm")]
  pub work_end:      NaiveTime,
  pub timezone:      Tz,
}

impl Default for WorkSchedule {
  /// 09:00 start, 15 minutes grace, 18:00 end, Asia/Tashkent.
  fn default() -> Self {
    Self {
      work_start:    NaiveTime::from_hms_opt(9, 0, 0).expect("09:00 is a valid time of day"),
      grace_minutes: 15,
      work_end:      NaiveTime::from_hms_opt(18, 0, 0).expect("18:00 is a valid time of day"),
      timezone:      chrono_tz::Asia::Tashkent,
    }
  }
}

impl WorkSchedule {
  /// The calendar date of `instant` in the schedule's timezone.
  pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&self.timezone).date_naive()
  }

  /// `HH:MM` wall-clock label of `instant` in the schedule's timezone.
  pub fn local_time_label(&self, instant: DateTime<Utc>) -> String {
    instant
      .with_timezone(&self.timezone)
      .format("%H:%M")
      .to_string()
  }

  /// Classify an already-interpreted instant. Never returns
  /// [`Arrival::Invalid`].
  pub fn classify_at(&self, instant: DateTime<Utc>) -> Arrival {
    let local = instant.with_timezone(&self.timezone).naive_local();
    let deadline = local.date().and_time(self.work_start)
      + TimeDelta::minutes(i64::from(self.grace_minutes));

    if local > deadline {
      Arrival::Late
    } else {
      Arrival::Present
    }
  }

  /// Classify an RFC 3339 timestamp. Unparsable input yields
  /// [`Arrival::Invalid`].
  pub fn classify(&self, raw: &str) -> Arrival {
    match DateTime::parse_from_rfc3339(raw.trim()) {
      Ok(instant) => self.classify_at(instant.with_timezone(&Utc)),
      Err(e) => {
        tracing::warn!(input = raw, error = %e, "cannot interpret check-in instant");
        Arrival::Invalid
      }
    }
  }
}

// ─── HH:MM parsing ───────────────────────────────────────────────────────────

/// Parse a `HH:MM` (or `HH:MM:SS`) time of day.
pub fn parse_time_of_day(s: &str) -> Result<NaiveTime> {
  let s = s.trim();
  NaiveTime::parse_from_str(s, "%H:%M")
    .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
    .map_err(|_| Error::InvalidTimeOfDay(s.to_owned()))
}

/// Serde adapter storing a [`NaiveTime`] as `HH:MM`.
pub mod hh_mm {
  use chrono::NaiveTime;
  use serde::{Deserialize, Deserializer, Serializer, de};

  pub fn serialize<S: Serializer>(t: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(&t.format("%H:%M"))
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
    let raw = String::deserialize(d)?;
    super::parse_time_of_day(&raw).map_err(de::Error::custom)
  }
}
