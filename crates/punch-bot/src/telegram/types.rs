//! Telegram Bot API payloads, reduced to the fields the bot reads or writes,
//! and their translation into transport-neutral events.

use chrono::{DateTime, Utc};
use punch_core::{employee::EmployeeId, geo::Coordinates};
use serde::{Deserialize, Serialize};

use crate::{
  event::{ChatId, EventKind, InboundEvent, Keyboard},
  messages::{CHECK_IN_BUTTON, CHECK_OUT_BUTTON, SHARE_LOCATION_BUTTON},
};

// ─── Responses ───────────────────────────────────────────────────────────────

/// The envelope every Bot API method answers with.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
  pub ok:          bool,
  pub result:      Option<T>,
  pub description: Option<String>,
}

// ─── Updates ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Update {
  pub update_id: i64,
  pub message:   Option<Message>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
  pub message_id: i64,
  pub from:       Option<User>,
  pub chat:       Chat,
  /// Unix time in seconds.
  pub date:       i64,
  pub text:       Option<String>,
  pub location:   Option<Location>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub id:         i64,
  pub first_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
  pub id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
  pub latitude:  f64,
  pub longitude: f64,
}

impl Update {
  /// Translate into an [`InboundEvent`]. Updates without a message, without a
  /// sender, or carrying neither text nor a location are not events.
  pub fn into_event(self) -> Option<InboundEvent> {
    let message = self.message?;
    let sender = message.from.as_ref()?.id;

    let kind = if let Some(location) = &message.location {
      EventKind::Location(Coordinates::new(location.latitude, location.longitude))
    } else {
      EventKind::from_text(message.text.as_deref()?)
    };

    let sent_at = DateTime::from_timestamp(message.date, 0).unwrap_or_else(|| {
      tracing::warn!(date = message.date, "message date out of range, using now");
      Utc::now()
    });

    Some(InboundEvent {
      sender: EmployeeId(sender),
      chat: ChatId(message.chat.id),
      sent_at,
      kind,
    })
  }
}

// ─── Requests ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct GetUpdates {
  pub offset:          i64,
  pub timeout:         u64,
  pub allowed_updates: &'static [&'static str],
}

#[derive(Debug, Serialize)]
pub struct SendMessage<'a> {
  pub chat_id:      i64,
  pub text:         &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub reply_markup: Option<ReplyKeyboardMarkup>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplyKeyboardMarkup {
  pub keyboard:        Vec<Vec<KeyboardButton>>,
  pub resize_keyboard: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyboardButton {
  pub text:             String,
  #[serde(skip_serializing_if = "std::ops::Not::not")]
  pub request_location: bool,
}

impl KeyboardButton {
  fn text(text: &str) -> Self { Self { text: text.to_owned(), request_location: false } }
}

impl From<Keyboard> for ReplyKeyboardMarkup {
  fn from(keyboard: Keyboard) -> Self {
    let keyboard = match keyboard {
      Keyboard::Menu => vec![
        vec![KeyboardButton::text(CHECK_IN_BUTTON)],
        vec![KeyboardButton::text(CHECK_OUT_BUTTON)],
      ],
      Keyboard::ShareLocation => vec![vec![KeyboardButton {
        text:             SHARE_LOCATION_BUTTON.to_owned(),
        request_location: true,
      }]],
    };
    Self { keyboard, resize_keyboard: true }
  }
}

#[derive(Debug, Serialize)]
pub struct SetWebhook<'a> {
  pub url:             &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub secret_token:    Option<&'a str>,
  pub allowed_updates: &'static [&'static str],
}

#[derive(Debug, Serialize)]
pub struct BotCommand {
  pub command:     &'static str,
  pub description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SetMyCommands {
  pub commands: Vec<BotCommand>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn update(json: serde_json::Value) -> Update { serde_json::from_value(json).unwrap() }

  #[test]
  fn location_message_becomes_location_event() {
    let u = update(serde_json::json!({
      "update_id": 10,
      "message": {
        "message_id": 1,
        "from": { "id": 42, "first_name": "Aziz", "is_bot": false },
        "chat": { "id": 4242, "type": "private" },
        "date": 1741579200,
        "location": { "latitude": 41.2995, "longitude": 69.2401 }
      }
    }));

    let event = u.into_event().unwrap();
    assert_eq!(event.sender, EmployeeId(42));
    assert_eq!(event.chat, ChatId(4242));
    assert_eq!(event.sent_at.timestamp(), 1741579200);
    assert_eq!(event.kind, EventKind::Location(Coordinates::new(41.2995, 69.2401)));
  }

  #[test]
  fn start_message_becomes_authenticate() {
    let u = update(serde_json::json!({
      "update_id": 11,
      "message": {
        "message_id": 2,
        "from": { "id": 42, "first_name": "Aziz" },
        "chat": { "id": 42 },
        "date": 1741579200,
        "text": "/start"
      }
    }));
    assert_eq!(u.into_event().unwrap().kind, EventKind::Authenticate);
  }

  #[test]
  fn non_message_updates_are_ignored() {
    let u = update(serde_json::json!({ "update_id": 12 }));
    assert!(u.into_event().is_none());

    let sticker = update(serde_json::json!({
      "update_id": 13,
      "message": {
        "message_id": 3,
        "from": { "id": 42, "first_name": "Aziz" },
        "chat": { "id": 42 },
        "date": 1741579200
      }
    }));
    assert!(sticker.into_event().is_none());
  }

  #[test]
  fn menu_keyboard_serialises_like_the_bot_api_expects() {
    let markup = ReplyKeyboardMarkup::from(Keyboard::Menu);
    let json = serde_json::to_value(&markup).unwrap();
    assert_eq!(
      json,
      serde_json::json!({
        "keyboard": [[{ "text": CHECK_IN_BUTTON }], [{ "text": CHECK_OUT_BUTTON }]],
        "resize_keyboard": true
      })
    );
  }

  #[test]
  fn share_location_button_requests_location() {
    let markup = ReplyKeyboardMarkup::from(Keyboard::ShareLocation);
    assert!(markup.keyboard[0][0].request_location);
  }
}
