//! Long-polling loop.

use std::{sync::Arc, time::Duration};

use punch_core::store::{AttendanceStore, EmployeeDirectory};
use tokio::sync::watch;

use super::UpdateSource;
use crate::{Bot, event::Outbound};

#[derive(Debug, Clone, Copy)]
pub struct PollingOptions {
  /// Long-poll timeout handed to `getUpdates`, in seconds.
  pub timeout_secs: u64,
  /// Pause after a failed poll before trying again.
  pub retry_delay:  Duration,
}

impl Default for PollingOptions {
  fn default() -> Self {
    Self { timeout_secs: 30, retry_delay: Duration::from_secs(5) }
  }
}

/// Poll `source` until `shutdown` flips to `true` (or its sender is dropped).
///
/// Each update is processed on its own task so a slow store call does not hold
/// up the next batch. Poll errors are logged and retried after
/// [`PollingOptions::retry_delay`].
pub async fn run<D, S, O, U>(
  bot: Arc<Bot<D, S, O>>,
  source: U,
  options: PollingOptions,
  mut shutdown: watch::Receiver<bool>,
) where
  D: EmployeeDirectory + 'static,
  S: AttendanceStore + 'static,
  O: Outbound + 'static,
  U: UpdateSource,
{
  let mut offset = 0;
  tracing::info!(timeout_secs = options.timeout_secs, "polling for updates");

  while !*shutdown.borrow() {
    let batch = tokio::select! {
      _ = shutdown.changed() => break,
      batch = source.poll(offset, options.timeout_secs) => batch,
    };

    match batch {
      Ok(updates) => {
        for update in updates {
          offset = offset.max(update.update_id + 1);
          let bot = bot.clone();
          tokio::spawn(async move { bot.process(update).await });
        }
      }
      Err(e) => {
        tracing::warn!(error = %e, retry_in = ?options.retry_delay, "polling failed");
        tokio::select! {
          _ = shutdown.changed() => break,
          _ = tokio::time::sleep(options.retry_delay) => {}
        }
      }
    }
  }

  tracing::info!("polling stopped");
}
