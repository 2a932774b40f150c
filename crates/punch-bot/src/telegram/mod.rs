//! The slice of the Telegram Bot API the bot uses.

mod client;
pub mod types;

pub use client::TelegramClient;
