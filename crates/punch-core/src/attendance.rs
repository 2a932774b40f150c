//! Attendance records, one per employee per calendar day.
//!
//! A record is opened by a check-in and closed by a check-out. Closing is
//! terminal: a closed record is never mutated again. The check-out half of a
//! record only exists on [`RecordState::Closed`], so an open record cannot
//! carry check-out data.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result, employee::EmployeeId, geo::Coordinates, schedule::Arrival};

// ─── Status ──────────────────────────────────────────────────────────────────

/// The status tag written to the store's `status` column.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
pub enum Status {
  #[strum(serialize = "IN")]
  #[serde(rename = "IN")]
  In,
  #[strum(serialize = "OUT")]
  #[serde(rename = "OUT")]
  Out,
}

// ─── Halves of a record ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckIn {
  pub at:      DateTime<Utc>,
  pub coords:  Coordinates,
  pub arrival: Arrival,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckOut {
  pub at:            DateTime<Utc>,
  pub coords:        Coordinates,
  /// Hours between check-in and check-out, rounded to two decimals.
  pub elapsed_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecordState {
  Open { check_in: CheckIn },
  Closed { check_in: CheckIn, check_out: CheckOut },
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// A persisted attendance record. Identity is `(employee_id, date)`, where
/// `date` is the calendar date in `timezone`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
  pub record_id:     Uuid,
  pub employee_id:   EmployeeId,
  pub employee_name: String,
  pub date:          NaiveDate,
  pub timezone:      Tz,
  pub state:         RecordState,
}

impl AttendanceRecord {
  pub fn status(&self) -> Status {
    match self.state {
      RecordState::Open { .. } => Status::In,
      RecordState::Closed { .. } => Status::Out,
    }
  }

  pub fn is_closed(&self) -> bool { matches!(self.state, RecordState::Closed { .. }) }

  pub fn check_in(&self) -> &CheckIn {
    match &self.state {
      RecordState::Open { check_in } | RecordState::Closed { check_in, .. } => check_in,
    }
  }

  pub fn check_out(&self) -> Option<&CheckOut> {
    match &self.state {
      RecordState::Open { .. } => None,
      RecordState::Closed { check_out, .. } => Some(check_out),
    }
  }

  /// Close an open record with a check-out at `at`.
  ///
  /// Returns [`Error::AlreadyCheckedOut`] if the record is already closed.
  pub fn close(self, at: DateTime<Utc>, coords: Coordinates) -> Result<Self> {
    let check_in = match self.state {
      RecordState::Open { check_in } => check_in,
      RecordState::Closed { .. } => {
        return Err(Error::AlreadyCheckedOut {
          employee: self.employee_id,
          date:     self.date,
        });
      }
    };

    let check_out = CheckOut {
      at,
      coords,
      elapsed_hours: elapsed_hours(check_in.at, at),
    };

    Ok(Self {
      state: RecordState::Closed { check_in, check_out },
      ..self
    })
  }
}

// ─── NewAttendance ───────────────────────────────────────────────────────────

/// Input to [`crate::store::AttendanceStore::insert`]. The record id is
/// assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAttendance {
  pub employee_id:   EmployeeId,
  pub employee_name: String,
  pub date:          NaiveDate,
  pub timezone:      Tz,
  pub check_in:      CheckIn,
}

impl NewAttendance {
  /// The open record this input becomes once stored under `record_id`.
  pub fn into_record(self, record_id: Uuid) -> AttendanceRecord {
    AttendanceRecord {
      record_id,
      employee_id: self.employee_id,
      employee_name: self.employee_name,
      date: self.date,
      timezone: self.timezone,
      state: RecordState::Open { check_in: self.check_in },
    }
  }
}

/// Hours from `from` to `to`, rounded to two decimals and never negative.
pub fn elapsed_hours(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
  let seconds = (to - from).num_seconds().max(0) as f64;
  (seconds / 3600.0 * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
  use chrono::{TimeDelta, TimeZone};

  use super::*;

  fn open_record() -> AttendanceRecord {
    NewAttendance {
      employee_id:   EmployeeId(42),
      employee_name: "Dilnoza".into(),
      date:          NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
      timezone:      chrono_tz::Asia::Tashkent,
      check_in:      CheckIn {
        at:      Utc.with_ymd_and_hms(2025, 3, 10, 4, 0, 0).unwrap(),
        coords:  Coordinates::new(41.2995, 69.2401),
        arrival: Arrival::Present,
      },
    }
    .into_record(Uuid::new_v4())
  }

  #[test]
  fn new_record_is_open() {
    let r = open_record();
    assert_eq!(r.status(), Status::In);
    assert!(r.check_out().is_none());
    assert!(!r.is_closed());
  }

  #[test]
  fn close_sets_check_out_and_status() {
    let r = open_record();
    let at = r.check_in().at + TimeDelta::hours(2);
    let closed = r.close(at, Coordinates::new(41.2996, 69.2402)).unwrap();

    assert_eq!(closed.status(), Status::Out);
    let out = closed.check_out().unwrap();
    assert_eq!(out.at, at);
    assert_eq!(out.elapsed_hours, 2.0);
  }

  #[test]
  fn closing_twice_is_rejected() {
    let r = open_record();
    let at = r.check_in().at + TimeDelta::hours(1);
    let closed = r.close(at, Coordinates::new(0.0, 0.0)).unwrap();
    let err = closed.close(at, Coordinates::new(0.0, 0.0)).unwrap_err();
    assert!(matches!(err, Error::AlreadyCheckedOut { .. }));
  }

  #[test]
  fn elapsed_hours_rounds_and_clamps() {
    let start = Utc.with_ymd_and_hms(2025, 3, 10, 4, 0, 0).unwrap();
    assert_eq!(elapsed_hours(start, start + TimeDelta::minutes(90)), 1.5);
    assert_eq!(elapsed_hours(start, start + TimeDelta::minutes(20)), 0.33);
    assert_eq!(elapsed_hours(start, start - TimeDelta::minutes(20)), 0.0);
  }

  #[test]
  fn status_tags_match_store_columns() {
    assert_eq!(Status::In.to_string(), "IN");
    assert_eq!("OUT".parse::<Status>().unwrap(), Status::Out);
  }
}
