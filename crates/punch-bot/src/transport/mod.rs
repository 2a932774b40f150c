//! Ways updates reach the bot.
//!
//! [`polling`] long-polls `getUpdates`; [`webhook`] serves the HTTP surface,
//! including the `/webhook` endpoint Telegram pushes to when configured.

use std::future::Future;

use crate::{Result, telegram::types::Update};

pub mod polling;
pub mod webhook;

/// A source of update batches for the polling loop.
pub trait UpdateSource: Send + Sync {
  /// Updates with `update_id >= offset`, waiting up to `timeout` seconds.
  fn poll(&self, offset: i64, timeout: u64) -> impl Future<Output = Result<Vec<Update>>> + Send + '_;
}
