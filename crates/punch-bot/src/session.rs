//! In-process [`SessionStore`] implementations.

use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use moka::sync::Cache;
use punch_core::{
  employee::{Employee, EmployeeId},
  session::SessionStore,
};

/// Unbounded session map; entries live until cleared or the process exits.
#[derive(Debug, Default)]
pub struct MemorySessions {
  entries: DashMap<EmployeeId, Employee>,
}

impl MemorySessions {
  pub fn new() -> Self { Self::default() }
}

impl SessionStore for MemorySessions {
  fn get(&self, id: EmployeeId) -> Option<Employee> {
    self.entries.get(&id).map(|e| e.value().clone())
  }

  fn set(&self, employee: Employee) { self.entries.insert(employee.id, employee); }

  fn clear(&self, id: EmployeeId) { self.entries.remove(&id); }
}

/// Sessions that expire after a period without activity.
pub struct ExpiringSessions {
  cache: Cache<EmployeeId, Employee>,
}

impl ExpiringSessions {
  pub fn new(idle: Duration) -> Self {
    Self { cache: Cache::builder().time_to_idle(idle).build() }
  }
}

impl SessionStore for ExpiringSessions {
  fn get(&self, id: EmployeeId) -> Option<Employee> { self.cache.get(&id) }

  fn set(&self, employee: Employee) { self.cache.insert(employee.id, employee); }

  fn clear(&self, id: EmployeeId) { self.cache.invalidate(&id); }
}

/// Pick an implementation: expiring when an idle timeout is configured,
/// otherwise unbounded.
pub fn build(idle: Option<Duration>) -> Arc<dyn SessionStore> {
  match idle {
    Some(idle) => {
      tracing::info!(idle_secs = idle.as_secs(), "using expiring sessions");
      Arc::new(ExpiringSessions::new(idle))
    }
    None => Arc::new(MemorySessions::new()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn employee(id: i64) -> Employee {
    Employee { id: EmployeeId(id), name: format!("employee {id}"), active: true }
  }

  fn exercise(sessions: &dyn SessionStore) {
    assert!(sessions.get(EmployeeId(1)).is_none());

    sessions.set(employee(1));
    sessions.set(employee(2));
    assert_eq!(sessions.get(EmployeeId(1)), Some(employee(1)));

    sessions.clear(EmployeeId(1));
    assert!(sessions.get(EmployeeId(1)).is_none());
    assert_eq!(sessions.get(EmployeeId(2)), Some(employee(2)));
  }

  #[test]
  fn memory_sessions_get_set_clear() { exercise(&MemorySessions::new()); }

  #[test]
  fn expiring_sessions_get_set_clear() {
    exercise(&ExpiringSessions::new(Duration::from_secs(60)));
  }

  #[test]
  fn expiring_sessions_drop_idle_entries() {
    let sessions = ExpiringSessions::new(Duration::from_millis(20));
    sessions.set(employee(1));
    std::thread::sleep(Duration::from_millis(60));
    assert!(sessions.get(EmployeeId(1)).is_none());
  }

  #[test]
  fn set_replaces_snapshot() {
    let sessions = build(None);
    sessions.set(employee(1));
    sessions.set(Employee { name: "renamed".into(), ..employee(1) });
    assert_eq!(sessions.get(EmployeeId(1)).unwrap().name, "renamed");
  }
}
