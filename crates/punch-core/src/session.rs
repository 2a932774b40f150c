//! The session contract: which employee is behind a platform user id in the
//! current process.
//!
//! Sessions are volatile. They are written on successful authentication,
//! read on every later event from the same user, and never persisted.

use crate::employee::{Employee, EmployeeId};

/// A process-local map from user id to authenticated employee.
///
/// Operations are synchronous and infallible; implementations are in-memory.
pub trait SessionStore: Send + Sync {
  fn get(&self, id: EmployeeId) -> Option<Employee>;

  fn set(&self, employee: Employee);

  fn clear(&self, id: EmployeeId);
}
