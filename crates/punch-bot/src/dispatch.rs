//! The dispatcher: routes inbound events to the directory, the session store
//! and the attendance store, and decides the reply.
//!
//! Per employee and day, attendance moves `NoRecord → CheckedIn → CheckedOut`.
//! Each transition is triggered by a location inside the office geofence from
//! an authenticated session. `CheckedOut` is terminal.
//!
//! Collaborator failures never escape [`Dispatcher::handle`]; they are logged
//! and answered with a generic failure message.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use punch_core::{
  attendance::{AttendanceRecord, CheckIn, NewAttendance},
  employee::{Employee, EmployeeId},
  geo::{Coordinates, OfficeGeofence, is_within_fence},
  schedule::WorkSchedule,
  session::SessionStore,
  store::{AttendanceStore, EmployeeDirectory, WriteOutcome},
};

use crate::{
  Error, Result,
  event::{ChatId, EventKind, InboundEvent, Keyboard, Reply},
  messages::{self, Command},
};

/// How many times a location event attempts its transition. A conflicting
/// write is re-read and retried once before giving up.
const TRANSITION_ATTEMPTS: usize = 2;

pub struct Dispatcher<D, S> {
  directory: Arc<D>,
  store:     Arc<S>,
  sessions:  Arc<dyn SessionStore>,
  fence:     OfficeGeofence,
  schedule:  WorkSchedule,
}

impl<D, S> Dispatcher<D, S>
where
  D: EmployeeDirectory,
  S: AttendanceStore,
{
  pub fn new(
    directory: Arc<D>,
    store: Arc<S>,
    sessions: Arc<dyn SessionStore>,
    fence: OfficeGeofence,
    schedule: WorkSchedule,
  ) -> Self {
    Self { directory, store, sessions, fence, schedule }
  }

  /// Handle one event and produce the reply to send.
  pub async fn handle(&self, event: InboundEvent) -> Reply {
    let chat = event.chat;
    match self.try_handle(event).await {
      Ok(reply) => reply,
      Err(e) => {
        tracing::error!(chat = %chat, error = %e, "event handling failed");
        Reply::text(chat, messages::FAILURE)
      }
    }
  }

  async fn try_handle(&self, event: InboundEvent) -> Result<Reply> {
    let InboundEvent { sender, chat, sent_at, kind } = event;

    match kind {
      EventKind::Authenticate => self.authenticate(sender, chat).await,
      EventKind::Text(text) => {
        let Some(employee) = self.sessions.get(sender) else {
          return Ok(authenticate_first(sender, chat));
        };
        match Command::parse(&text) {
          Some(Command::BeginCheckIn) => Ok(
            Reply::text(chat, messages::SEND_LOCATION_CHECK_IN)
              .with_keyboard(Keyboard::ShareLocation),
          ),
          Some(Command::BeginCheckOut) => self.begin_check_out(&employee, chat, sent_at).await,
          None => Ok(Reply::text(chat, messages::HELP).with_keyboard(Keyboard::Menu)),
        }
      }
      EventKind::Location(coords) => {
        let Some(employee) = self.sessions.get(sender) else {
          return Ok(authenticate_first(sender, chat));
        };
        self.location(&employee, chat, sent_at, coords).await
      }
    }
  }

  // ── Authentication ────────────────────────────────────────────────────────

  async fn authenticate(&self, sender: EmployeeId, chat: ChatId) -> Result<Reply> {
    let found = self
      .directory
      .lookup(sender)
      .await
      .map_err(|e| Error::Directory(Box::new(e)))?;

    match found {
      Some(employee) => {
        tracing::info!(employee = %employee.id, name = %employee.name, "authenticated");
        let text = messages::welcome(&employee.name);
        self.sessions.set(employee);
        Ok(Reply::text(chat, text).with_keyboard(Keyboard::Menu))
      }
      None => {
        tracing::info!(sender = %sender, "authentication refused");
        self.sessions.clear(sender);
        Ok(Reply::text(chat, messages::NOT_REGISTERED))
      }
    }
  }

  // ── Check-out prompt ──────────────────────────────────────────────────────

  async fn begin_check_out(
    &self,
    employee: &Employee,
    chat: ChatId,
    now: DateTime<Utc>,
  ) -> Result<Reply> {
    let today = self.find_today(employee.id, now).await?;
    let reply = match today {
      None => Reply::text(chat, messages::NOT_CHECKED_IN),
      Some(r) if r.is_closed() => Reply::text(chat, messages::ALREADY_CHECKED_OUT),
      Some(_) => Reply::text(chat, messages::SEND_LOCATION_CHECK_OUT)
        .with_keyboard(Keyboard::ShareLocation),
    };
    Ok(reply)
  }

  // ── Location ──────────────────────────────────────────────────────────────

  async fn location(
    &self,
    employee: &Employee,
    chat: ChatId,
    at: DateTime<Utc>,
    coords: Coordinates,
  ) -> Result<Reply> {
    let mut today = self.find_today(employee.id, at).await?;
    if today.as_ref().is_some_and(AttendanceRecord::is_closed) {
      return Ok(day_finalized(chat));
    }

    if !is_within_fence(coords.latitude, coords.longitude, &self.fence) {
      tracing::info!(employee = %employee.id, ?coords, "location outside office");
      return Ok(Reply::text(chat, messages::OUTSIDE_OFFICE).with_keyboard(Keyboard::Menu));
    }

    // A retry repeats the transition this event first set out to make; it
    // never turns a lost check-in into a check-out.
    let checking_in = today.is_none();

    for attempt in 1..=TRANSITION_ATTEMPTS {
      let outcome = match today {
        Some(record) if record.is_closed() => return Ok(day_finalized(chat)),
        Some(open) if checking_in || at <= open.check_in().at => {
          tracing::info!(employee = %employee.id, "check-in already recorded");
          return Ok(self.confirmation(chat, &open));
        }
        Some(open) => {
          let closed = open.close(at, coords)?;
          self.store.update(&closed).await.map_err(store_err)?
        }
        None if checking_in => self.check_in(employee, at, coords).await?,
        None => {
          tracing::warn!(employee = %employee.id, "open record vanished before check-out");
          break;
        }
      };

      match outcome {
        WriteOutcome::Committed(record) => return Ok(self.confirmation(chat, &record)),
        WriteOutcome::Conflict => {
          tracing::warn!(employee = %employee.id, attempt, "attendance write conflict");
          if attempt == TRANSITION_ATTEMPTS {
            break;
          }
          today = self.find_today(employee.id, at).await?;
        }
      }
    }

    Ok(Reply::text(chat, messages::CONFLICT).with_keyboard(Keyboard::Menu))
  }

  async fn check_in(
    &self,
    employee: &Employee,
    at: DateTime<Utc>,
    coords: Coordinates,
  ) -> Result<WriteOutcome> {
    let input = NewAttendance {
      employee_id:   employee.id,
      employee_name: employee.name.clone(),
      date:          self.schedule.local_date(at),
      timezone:      self.schedule.timezone,
      check_in:      CheckIn {
        at,
        coords,
        arrival: self.schedule.classify_at(at),
      },
    };
    self.store.insert(input).await.map_err(store_err)
  }

  fn confirmation(&self, chat: ChatId, record: &AttendanceRecord) -> Reply {
    let text = match record.check_out() {
      None => {
        let check_in = record.check_in();
        tracing::info!(
          employee = %record.employee_id,
          arrival = %check_in.arrival,
          "checked in"
        );
        messages::checked_in(&self.schedule.local_time_label(check_in.at), check_in.arrival)
      }
      Some(check_out) => {
        tracing::info!(
          employee = %record.employee_id,
          hours = check_out.elapsed_hours,
          "checked out"
        );
        messages::checked_out(
          &self.schedule.local_time_label(check_out.at),
          check_out.elapsed_hours,
        )
      }
    };
    Reply::text(chat, text).with_keyboard(Keyboard::Menu)
  }

  async fn find_today(
    &self,
    employee: EmployeeId,
    at: DateTime<Utc>,
  ) -> Result<Option<AttendanceRecord>> {
    self
      .store
      .find_today(employee, self.schedule.local_date(at))
      .await
      .map_err(store_err)
  }
}

fn day_finalized(chat: ChatId) -> Reply {
  Reply::text(chat, messages::DAY_FINALIZED).with_keyboard(Keyboard::Menu)
}

fn authenticate_first(sender: EmployeeId, chat: ChatId) -> Reply {
  tracing::debug!(sender = %sender, "event without session");
  Reply::text(chat, messages::AUTHENTICATE_FIRST)
}

fn store_err<E>(e: E) -> Error
where
  E: std::error::Error + Send + Sync + 'static,
{
  Error::Store(Box::new(e))
}
