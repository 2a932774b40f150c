//! Employees as known to the directory.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The messaging-platform user id; stable for the lifetime of an account.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EmployeeId(pub i64);

impl fmt::Display for EmployeeId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

/// A snapshot of a directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
  pub id:     EmployeeId,
  pub name:   String,
  pub active: bool,
}

/// Interpret a directory "active" flag. Only `true`, in any letter case and
/// ignoring surrounding whitespace, counts as active.
pub fn parse_active_flag(raw: &str) -> bool { raw.trim().eq_ignore_ascii_case("true") }

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn active_flag_is_case_insensitive() {
    assert!(parse_active_flag("TRUE"));
    assert!(parse_active_flag("true"));
    assert!(parse_active_flag(" True "));
    assert!(!parse_active_flag("FALSE"));
    assert!(!parse_active_flag("yes"));
    assert!(!parse_active_flag(""));
  }
}
