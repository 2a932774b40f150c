//! Async HTTP client for the Telegram Bot API.

use std::{future::Future, time::Duration};

use reqwest::Client;
use serde::{Serialize, de::DeserializeOwned};

use super::types::{
  ApiResponse, BotCommand, GetUpdates, ReplyKeyboardMarkup, SendMessage,
  SetMyCommands, SetWebhook, Update,
};
use crate::{
  Error, Result,
  event::{Outbound, Reply},
  messages::BOT_COMMANDS,
  transport::UpdateSource,
};

const ALLOWED_UPDATES: &[&str] = &["message"];

/// Slack added on top of the long-poll timeout before the HTTP request itself
/// is abandoned.
const REQUEST_SLACK: Duration = Duration::from_secs(10);

/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct TelegramClient {
  client:   Client,
  base_url: String,
}

impl TelegramClient {
  pub fn new(api_base: &str, token: &str, poll_timeout: Duration) -> Result<Self> {
    let client = Client::builder()
      .timeout(poll_timeout + REQUEST_SLACK)
      .build()?;
    Ok(Self {
      client,
      base_url: format!("{}/bot{token}", api_base.trim_end_matches('/')),
    })
  }

  async fn call<B, T>(&self, method: &'static str, body: &B) -> Result<T>
  where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
  {
    let response: ApiResponse<T> = self
      .client
      .post(format!("{}/{method}", self.base_url))
      .json(body)
      .send()
      .await?
      .json()
      .await?;

    match response {
      ApiResponse { ok: true, result: Some(result), .. } => Ok(result),
      ApiResponse { description, .. } => Err(Error::Api {
        method,
        description: description.unwrap_or_else(|| "no description".to_owned()),
      }),
    }
  }

  // ── Updates ───────────────────────────────────────────────────────────────

  /// `getUpdates`, long-polling for up to `timeout` seconds.
  pub async fn get_updates(&self, offset: i64, timeout: u64) -> Result<Vec<Update>> {
    self
      .call("getUpdates", &GetUpdates { offset, timeout, allowed_updates: ALLOWED_UPDATES })
      .await
  }

  // ── Messages ──────────────────────────────────────────────────────────────

  pub async fn send_message(&self, reply: &Reply) -> Result<()> {
    let body = SendMessage {
      chat_id:      reply.chat.0,
      text:         &reply.text,
      reply_markup: reply.keyboard.map(ReplyKeyboardMarkup::from),
    };
    let _: serde_json::Value = self.call("sendMessage", &body).await?;
    Ok(())
  }

  // ── Setup ─────────────────────────────────────────────────────────────────

  pub async fn set_webhook(&self, url: &str, secret: Option<&str>) -> Result<()> {
    let body = SetWebhook { url, secret_token: secret, allowed_updates: ALLOWED_UPDATES };
    let _: bool = self.call("setWebhook", &body).await?;
    Ok(())
  }

  /// Required before `getUpdates` works on a bot that had a webhook.
  pub async fn delete_webhook(&self) -> Result<()> {
    let _: bool = self.call("deleteWebhook", &serde_json::json!({})).await?;
    Ok(())
  }

  /// Register the command menu shown by Telegram clients.
  pub async fn set_my_commands(&self) -> Result<()> {
    let commands = BOT_COMMANDS
      .iter()
      .map(|&(command, description)| BotCommand { command, description })
      .collect();
    let _: bool = self.call("setMyCommands", &SetMyCommands { commands }).await?;
    Ok(())
  }
}

impl Outbound for TelegramClient {
  fn send<'a>(&'a self, reply: &'a Reply) -> impl Future<Output = Result<()>> + Send + 'a {
    self.send_message(reply)
  }
}

impl UpdateSource for TelegramClient {
  fn poll(&self, offset: i64, timeout: u64) -> impl Future<Output = Result<Vec<Update>>> + Send + '_ {
    self.get_updates(offset, timeout)
  }
}
