//! User-facing texts and the button/command vocabulary.

use punch_core::schedule::Arrival;

pub const CHECK_IN_BUTTON: &str = "🟢 Check In";
pub const CHECK_OUT_BUTTON: &str = "🔴 Check Out";
pub const SHARE_LOCATION_BUTTON: &str = "📍 Send location";

/// Commands registered with the platform at startup, with descriptions.
pub const BOT_COMMANDS: &[(&str, &str)] = &[
  ("start", "Identify yourself"),
  ("checkin", "Start a check-in"),
  ("checkout", "Start a check-out"),
];

/// A text message the dispatcher understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
  BeginCheckIn,
  BeginCheckOut,
}

impl Command {
  pub fn parse(text: &str) -> Option<Self> {
    let command = text.split('@').next().unwrap_or_default();
    match command {
      CHECK_IN_BUTTON | "/checkin" => Some(Self::BeginCheckIn),
      CHECK_OUT_BUTTON | "/checkout" => Some(Self::BeginCheckOut),
      _ => None,
    }
  }
}

pub fn welcome(name: &str) -> String { format!("✅ Welcome, {name}!") }

pub const NOT_REGISTERED: &str =
  "❌ You are not registered or your account is inactive.\nPlease contact an administrator.";

pub const AUTHENTICATE_FIRST: &str = "Please send /start first.";

pub const HELP: &str = "Use the buttons below to check in or check out.";

pub const SEND_LOCATION_CHECK_IN: &str = "📍 Send your location to check in.";

pub const SEND_LOCATION_CHECK_OUT: &str = "📍 Send your location to check out.";

pub const NOT_CHECKED_IN: &str = "⚠️ You have not checked in today.";

pub const ALREADY_CHECKED_OUT: &str = "⚠️ You have already checked out today.";

pub const OUTSIDE_OFFICE: &str = "❌ Your location is outside the office area.";

pub const DAY_FINALIZED: &str = "ℹ️ Today's check-in and check-out are already complete.";

pub const CONFLICT: &str =
  "⚠️ Your attendance was changed by another request at the same time. Please try again.";

pub const FAILURE: &str = "❌ Something went wrong. Please try again later.";

pub fn checked_in(time: &str, arrival: Arrival) -> String {
  match arrival {
    Arrival::Late => format!("✅ Checked in\n🕘 {time}\n⏰ Late"),
    Arrival::Present | Arrival::Invalid => format!("✅ Checked in\n🕘 {time}"),
  }
}

pub fn checked_out(time: &str, hours: f64) -> String {
  format!("✅ Checked out\n🕔 {time}\n⏱ {hours:.2} h")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn buttons_and_slash_commands_parse() {
    assert_eq!(Command::parse(CHECK_IN_BUTTON), Some(Command::BeginCheckIn));
    assert_eq!(Command::parse("/checkin"), Some(Command::BeginCheckIn));
    assert_eq!(Command::parse("/checkout@PunchBot"), Some(Command::BeginCheckOut));
    assert_eq!(Command::parse("check in"), None);
  }

  #[test]
  fn check_out_text_shows_two_decimals() {
    assert_eq!(checked_out("18:00", 2.0), "✅ Checked out\n🕔 18:00\n⏱ 2.00 h");
  }
}
