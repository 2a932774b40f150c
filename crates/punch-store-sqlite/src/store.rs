//! [`SqliteStore`]: the SQLite implementation of [`AttendanceStore`] and
//! [`EmployeeDirectory`].

use std::path::Path;

use chrono::{NaiveDate, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use punch_core::{
  attendance::{AttendanceRecord, NewAttendance, RecordState},
  employee::{Employee, EmployeeId},
  store::{AttendanceStore, EmployeeDirectory, WriteOutcome},
};

use crate::{
  Result,
  encode::{
    RECORD_COLUMNS, RawEmployee, RawRecord, encode_active, encode_date, encode_dt,
    encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An attendance store and employee directory backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Directory administration ──────────────────────────────────────────────

  /// Add an employee, or rename and reactivate an existing one.
  pub async fn add_employee(&self, id: EmployeeId, name: &str) -> Result<Employee> {
    let name_owned = name.to_owned();
    let at_str     = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO employees (telegram_id, name, is_active, created_at)
           VALUES (?1, ?2, 'TRUE', ?3)
           ON CONFLICT (telegram_id) DO UPDATE
             SET name = excluded.name, is_active = 'TRUE'",
          rusqlite::params![id.0, name_owned, at_str],
        )?;
        Ok(())
      })
      .await?;

    tracing::info!(employee = %id, name, "employee saved");
    Ok(Employee { id, name: name.to_owned(), active: true })
  }

  /// Set the active flag. Returns `false` if no such employee exists.
  pub async fn set_active(&self, id: EmployeeId, active: bool) -> Result<bool> {
    let flag = encode_active(active);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE employees SET is_active = ?2 WHERE telegram_id = ?1",
          rusqlite::params![id.0, flag],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  /// All employees, active or not, ordered by name.
  pub async fn list_employees(&self) -> Result<Vec<Employee>> {
    let raws: Vec<RawEmployee> = self
      .conn
      .call(|conn| {
        let mut stmt = conn
          .prepare("SELECT telegram_id, name, is_active FROM employees ORDER BY name")?;
        let rows = stmt
          .query_map([], RawEmployee::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(raws.into_iter().map(RawEmployee::into_employee).collect())
  }

  /// All attendance records for `date`, ordered by check-in time.
  pub async fn list_attendance(&self, date: NaiveDate) -> Result<Vec<AttendanceRecord>> {
    let date_str = encode_date(date);

    let raws: Vec<RawRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {RECORD_COLUMNS} FROM attendance WHERE date = ?1 ORDER BY check_in_at"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![date_str], RawRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecord::into_record).collect()
  }
}

// ─── EmployeeDirectory impl ──────────────────────────────────────────────────

impl EmployeeDirectory for SqliteStore {
  type Error = crate::Error;

  async fn lookup(&self, id: EmployeeId) -> Result<Option<Employee>> {
    let raw: Option<RawEmployee> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT telegram_id, name, is_active FROM employees WHERE telegram_id = ?1",
            rusqlite::params![id.0],
            RawEmployee::from_row,
          )
          .optional()?)
      })
      .await?;

    Ok(raw.map(RawEmployee::into_employee).filter(|e| e.active))
  }
}

// ─── AttendanceStore impl ────────────────────────────────────────────────────

impl AttendanceStore for SqliteStore {
  type Error = crate::Error;

  async fn find_today(
    &self,
    employee: EmployeeId,
    date:     NaiveDate,
  ) -> Result<Option<AttendanceRecord>> {
    let date_str = encode_date(date);

    let raw: Option<RawRecord> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {RECORD_COLUMNS} FROM attendance WHERE telegram_id = ?1 AND date = ?2"
            ),
            rusqlite::params![employee.0, date_str],
            RawRecord::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawRecord::into_record).transpose()
  }

  async fn insert(&self, input: NewAttendance) -> Result<WriteOutcome> {
    let record = input.into_record(Uuid::new_v4());
    let check_in = record.check_in();

    let record_id_str = encode_uuid(record.record_id);
    let telegram_id   = record.employee_id.0;
    let name          = record.employee_name.clone();
    let date_str      = encode_date(record.date);
    let tz_str        = record.timezone.name().to_owned();
    let at_str        = encode_dt(check_in.at);
    let lat           = check_in.coords.latitude;
    let lng           = check_in.coords.longitude;
    let arrival_str   = check_in.arrival.to_string();
    let status_str    = record.status().to_string();

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT INTO attendance (
             record_id, telegram_id, employee_name, date, timezone,
             check_in_at, check_in_lat, check_in_lng, arrival, status
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
           ON CONFLICT (telegram_id, date) DO NOTHING",
          rusqlite::params![
            record_id_str,
            telegram_id,
            name,
            date_str,
            tz_str,
            at_str,
            lat,
            lng,
            arrival_str,
            status_str,
          ],
        )?)
      })
      .await?;

    if inserted == 0 {
      tracing::debug!(employee = %record.employee_id, date = %record.date, "insert conflict");
      return Ok(WriteOutcome::Conflict);
    }
    Ok(WriteOutcome::Committed(record))
  }

  async fn update(&self, record: &AttendanceRecord) -> Result<WriteOutcome> {
    let RecordState::Closed { check_out, .. } = &record.state else {
      return Ok(WriteOutcome::Conflict);
    };

    let record_id_str = encode_uuid(record.record_id);
    let at_str        = encode_dt(check_out.at);
    let lat           = check_out.coords.latitude;
    let lng           = check_out.coords.longitude;
    let hours         = check_out.elapsed_hours;
    let status_str    = record.status().to_string();

    // Single statement: check-out columns and status change together or not
    // at all, and only while the row is still open.
    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE attendance
             SET check_out_at = ?2, check_out_lat = ?3, check_out_lng = ?4,
                 total_hours = ?5, status = ?6
           WHERE record_id = ?1 AND status = 'IN'",
          rusqlite::params![record_id_str, at_str, lat, lng, hours, status_str],
        )?)
      })
      .await?;

    if updated == 0 {
      tracing::debug!(record = %record.record_id, "update conflict");
      return Ok(WriteOutcome::Conflict);
    }
    Ok(WriteOutcome::Committed(record.clone()))
  }
}
