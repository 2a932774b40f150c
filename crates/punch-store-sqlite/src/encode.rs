//! Encoding and decoding helpers between domain types and the plain values
//! stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, dates are `YYYY-MM-DD`, timezones are IANA
//! names, and enum tags use their `Display` form.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use punch_core::{
  attendance::{AttendanceRecord, CheckIn, CheckOut, RecordState, Status},
  employee::{Employee, EmployeeId, parse_active_flag},
  geo::Coordinates,
  schedule::Arrival,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

pub fn decode_tz(s: &str) -> Result<Tz> {
  s.parse::<Tz>()
    .map_err(|_| Error::Malformed(format!("unknown timezone: {s:?}")))
}

pub fn encode_active(active: bool) -> &'static str { if active { "TRUE" } else { "FALSE" } }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching the field order of [`RawRecord`].
pub const RECORD_COLUMNS: &str = "record_id, telegram_id, employee_name, date, timezone,
   check_in_at, check_in_lat, check_in_lng, arrival,
   check_out_at, check_out_lat, check_out_lng, total_hours, status";

/// Raw values read directly from an `attendance` row.
pub struct RawRecord {
  pub record_id:     String,
  pub telegram_id:   i64,
  pub employee_name: String,
  pub date:          String,
  pub timezone:      String,
  pub check_in_at:   String,
  pub check_in_lat:  f64,
  pub check_in_lng:  f64,
  pub arrival:       String,
  pub check_out_at:  Option<String>,
  pub check_out_lat: Option<f64>,
  pub check_out_lng: Option<f64>,
  pub total_hours:   Option<f64>,
  pub status:        String,
}

impl RawRecord {
  /// Read a row selected with [`RECORD_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      record_id:     row.get(0)?,
      telegram_id:   row.get(1)?,
      employee_name: row.get(2)?,
      date:          row.get(3)?,
      timezone:      row.get(4)?,
      check_in_at:   row.get(5)?,
      check_in_lat:  row.get(6)?,
      check_in_lng:  row.get(7)?,
      arrival:       row.get(8)?,
      check_out_at:  row.get(9)?,
      check_out_lat: row.get(10)?,
      check_out_lng: row.get(11)?,
      total_hours:   row.get(12)?,
      status:        row.get(13)?,
    })
  }

  pub fn into_record(self) -> Result<AttendanceRecord> {
    let arrival = self
      .arrival
      .parse::<Arrival>()
      .map_err(|_| punch_core::Error::UnknownArrival(self.arrival.clone()))?;
    let status = self
      .status
      .parse::<Status>()
      .map_err(|_| punch_core::Error::UnknownStatus(self.status.clone()))?;

    let check_in = CheckIn {
      at: decode_dt(&self.check_in_at)?,
      coords: Coordinates::new(self.check_in_lat, self.check_in_lng),
      arrival,
    };

    let state = match (status, self.check_out_at, self.check_out_lat, self.check_out_lng, self.total_hours) {
      (Status::In, None, None, None, None) => RecordState::Open { check_in },
      (Status::Out, Some(at), Some(lat), Some(lng), Some(hours)) => RecordState::Closed {
        check_in,
        check_out: CheckOut {
          at:            decode_dt(&at)?,
          coords:        Coordinates::new(lat, lng),
          elapsed_hours: hours,
        },
      },
      _ => {
        return Err(Error::Malformed(format!(
          "record {} has status {status} but inconsistent check-out columns",
          self.record_id
        )));
      }
    };

    Ok(AttendanceRecord {
      record_id: decode_uuid(&self.record_id)?,
      employee_id: EmployeeId(self.telegram_id),
      employee_name: self.employee_name,
      date: decode_date(&self.date)?,
      timezone: decode_tz(&self.timezone)?,
      state,
    })
  }
}

/// Raw values read directly from an `employees` row.
pub struct RawEmployee {
  pub telegram_id: i64,
  pub name:        String,
  pub is_active:   String,
}

impl RawEmployee {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      telegram_id: row.get(0)?,
      name:        row.get(1)?,
      is_active:   row.get(2)?,
    })
  }

  pub fn into_employee(self) -> Employee {
    Employee {
      id:     EmployeeId(self.telegram_id),
      name:   self.name,
      active: parse_active_flag(&self.is_active),
    }
  }
}
