//! Error types for `punch-core`.

use chrono::NaiveDate;
use thiserror::Error;

use crate::employee::EmployeeId;

#[derive(Debug, Error)]
pub enum Error {
  #[error("employee {employee} already checked out on {date}")]
  AlreadyCheckedOut { employee: EmployeeId, date: NaiveDate },

  #[error("invalid time of day {0:?}, expected HH:MM")]
  InvalidTimeOfDay(String),

  #[error("unknown attendance status: {0:?}")]
  UnknownStatus(String),

  #[error("unknown arrival classification: {0:?}")]
  UnknownArrival(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
