//! Telegram attendance bot.
//!
//! Employees authenticate with `/start`, then check in and out by sharing a
//! location inside the office geofence. The [`dispatch::Dispatcher`] holds the
//! rules; [`telegram`] speaks the Bot API; [`transport`] receives updates by
//! long polling or by webhook and serves the health endpoints.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod messages;
pub mod session;
pub mod telegram;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use error::{Error, Result};

use punch_core::store::{AttendanceStore, EmployeeDirectory};

use crate::{dispatch::Dispatcher, event::Outbound, telegram::types::Update};

/// A dispatcher paired with the channel its replies go out on. Both transports
/// feed updates through [`Bot::process`].
pub struct Bot<D, S, O> {
  dispatcher: Dispatcher<D, S>,
  outbound:   O,
}

impl<D, S, O> Bot<D, S, O>
where
  D: EmployeeDirectory,
  S: AttendanceStore,
  O: Outbound,
{
  pub fn new(dispatcher: Dispatcher<D, S>, outbound: O) -> Self {
    Self { dispatcher, outbound }
  }

  /// Handle one update end to end. Delivery failures are logged, not retried.
  pub async fn process(&self, update: Update) {
    let update_id = update.update_id;
    let Some(event) = update.into_event() else {
      tracing::debug!(update_id, "ignoring update without a usable message");
      return;
    };

    let reply = self.dispatcher.handle(event).await;
    if let Err(e) = self.outbound.send(&reply).await {
      tracing::warn!(update_id, chat = %reply.chat, error = %e, "failed to deliver reply");
    }
  }
}
