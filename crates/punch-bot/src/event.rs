//! The transport-neutral inbound event and outbound reply.
//!
//! Every transport adapter translates its own payloads into [`InboundEvent`]
//! and delivers the [`Reply`] produced by the dispatcher.

use std::{fmt, future::Future};

use chrono::{DateTime, Utc};
use punch_core::{employee::EmployeeId, geo::Coordinates};
use serde::{Deserialize, Serialize};

/// The conversation a reply is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

// ─── Inbound ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
  /// The authentication command (`/start`).
  Authenticate,
  /// Any other text: typed commands and keyboard button presses.
  Text(String),
  /// A shared geolocation.
  Location(Coordinates),
}

impl EventKind {
  /// Classify a text message. `/start`, `/start@SomeBot` and `/start payload`
  /// all authenticate.
  pub fn from_text(text: &str) -> Self {
    let first = text.split_whitespace().next().unwrap_or_default();
    let command = first.split('@').next().unwrap_or_default();
    if command == "/start" {
      Self::Authenticate
    } else {
      Self::Text(text.trim().to_owned())
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
  pub sender:  EmployeeId,
  pub chat:    ChatId,
  /// When the platform received the message.
  pub sent_at: DateTime<Utc>,
  pub kind:    EventKind,
}

// ─── Outbound ────────────────────────────────────────────────────────────────

/// Which reply keyboard to attach to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyboard {
  /// Check-in and check-out buttons.
  Menu,
  /// A single button that shares the user's location.
  ShareLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
  pub chat:     ChatId,
  pub text:     String,
  pub keyboard: Option<Keyboard>,
}

impl Reply {
  pub fn text(chat: ChatId, text: impl Into<String>) -> Self {
    Self { chat, text: text.into(), keyboard: None }
  }

  pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
    self.keyboard = Some(keyboard);
    self
  }
}

/// Delivers replies back to the conversation. Failures are reported to the
/// caller, which logs them; nothing is retried.
pub trait Outbound: Send + Sync {
  fn send<'a>(
    &'a self,
    reply: &'a Reply,
  ) -> impl Future<Output = crate::Result<()>> + Send + 'a;
}
