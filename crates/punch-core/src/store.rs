//! The `AttendanceStore` and `EmployeeDirectory` traits.
//!
//! The traits are implemented by storage backends (e.g.
//! `punch-store-sqlite`). The dispatcher in `punch-bot` depends on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use chrono::NaiveDate;

use crate::{
  attendance::{AttendanceRecord, NewAttendance},
  employee::{Employee, EmployeeId},
};

/// Result of a conditional write.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
  /// The write was applied; carries the record as now stored.
  Committed(AttendanceRecord),
  /// The stored state changed since it was read; nothing was written.
  Conflict,
}

/// Resolves platform user ids to active employees.
pub trait EmployeeDirectory: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Return the employee for `id` if one exists and is active.
  fn lookup(
    &self,
    id: EmployeeId,
  ) -> impl Future<Output = Result<Option<Employee>, Self::Error>> + Send + '_;
}

/// Persists one attendance record per (employee, day).
///
/// Both writes are conditional so that two concurrent events for the same
/// employee cannot both commit a transition from the same state.
pub trait AttendanceStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The record for `employee` on `date`, if any.
  fn find_today(
    &self,
    employee: EmployeeId,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Option<AttendanceRecord>, Self::Error>> + Send + '_;

  /// Insert a new open record. Returns [`WriteOutcome::Conflict`] if a record
  /// for the same (employee, date) already exists; never overwrites.
  fn insert(
    &self,
    input: NewAttendance,
  ) -> impl Future<Output = Result<WriteOutcome, Self::Error>> + Send + '_;

  /// Persist the check-out half of a closed record onto the stored row.
  ///
  /// Applies only while the stored row is still open; otherwise returns
  /// [`WriteOutcome::Conflict`]. Passing an open record is a conflict too.
  fn update<'a>(
    &'a self,
    record: &'a AttendanceRecord,
  ) -> impl Future<Output = Result<WriteOutcome, Self::Error>> + Send + 'a;
}
