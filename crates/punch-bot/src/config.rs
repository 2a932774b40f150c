//! Runtime configuration, layered from an optional TOML file and `PUNCH_*`
//! environment variables.
//!
//! ```toml
//! store_path = "/var/lib/punch/attendance.db"
//!
//! [telegram]
//! token = "123456:ABC..."
//! mode  = "webhook"
//! webhook_url = "https://punch.example.com/webhook"
//!
//! [office]
//! latitude      = 41.2995
//! longitude     = 69.2401
//! radius_meters = 150
//!
//! [schedule]
//! work_start    = "09:00"
//! grace_minutes = 15
//! timezone      = "Asia/Tashkent"
//! ```
//!
//! Nested keys map to variables with a `__` separator, e.g.
//! `PUNCH_TELEGRAM__TOKEN` or `PUNCH_OFFICE__RADIUS_METERS`.

use std::{path::{Path, PathBuf}, time::Duration};

use punch_core::{
  geo::{Coordinates, OfficeGeofence},
  schedule::WorkSchedule,
};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error(transparent)]
  Source(#[from] config::ConfigError),
  #[error("telegram.token is required")]
  MissingToken,
  #[error("store_path is required")]
  MissingStorePath,
  #[error("telegram.webhook_url is required in webhook mode")]
  MissingWebhookUrl,
  #[error("office.radius_meters must be a positive number, got {0}")]
  InvalidRadius(f64),
  #[error("office coordinates ({latitude}, {longitude}) are out of range")]
  InvalidOffice { latitude: f64, longitude: f64 },
}

// ─── Sections ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
  #[serde(default)]
  pub telegram:   TelegramConfig,
  #[serde(default)]
  pub server:     ServerConfig,
  pub store_path: Option<PathBuf>,
  #[serde(default)]
  pub office:     OfficeConfig,
  #[serde(default)]
  pub schedule:   WorkSchedule,
  #[serde(default)]
  pub session:    SessionConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
  #[default]
  Polling,
  Webhook,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
  pub token:             String,
  pub mode:              TransportMode,
  /// Public URL Telegram should post updates to (webhook mode).
  pub webhook_url:       Option<String>,
  pub webhook_secret:    Option<String>,
  pub poll_timeout_secs: u64,
  pub api_base:          String,
}

impl Default for TelegramConfig {
  fn default() -> Self {
    Self {
      token:             String::new(),
      mode:              TransportMode::default(),
      webhook_url:       None,
      webhook_secret:    None,
      poll_timeout_secs: 30,
      api_base:          "https://api.telegram.org".to_owned(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host: String,
  pub port: u16,
}

impl Default for ServerConfig {
  fn default() -> Self { Self { host: "0.0.0.0".to_owned(), port: 8080 } }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct OfficeConfig {
  pub latitude:      f64,
  pub longitude:     f64,
  pub radius_meters: f64,
}

impl Default for OfficeConfig {
  fn default() -> Self {
    Self { latitude: 41.2995, longitude: 69.2401, radius_meters: 150.0 }
  }
}

impl OfficeConfig {
  pub fn geofence(&self) -> OfficeGeofence {
    OfficeGeofence {
      center:        Coordinates::new(self.latitude, self.longitude),
      radius_meters: self.radius_meters,
    }
  }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
  /// Forget a session after this long without activity. Unset keeps sessions
  /// until restart.
  pub ttl_secs: Option<u64>,
}

impl SessionConfig {
  pub fn idle(&self) -> Option<Duration> { self.ttl_secs.map(Duration::from_secs) }
}

// ─── Loading ─────────────────────────────────────────────────────────────────

impl BotConfig {
  /// Read `path` (if it exists) and the environment. Does not validate.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(env_source())
      .build()?;
    Ok(settings.try_deserialize()?)
  }

  /// The database path, which every command needs.
  pub fn store_path(&self) -> Result<&Path, ConfigError> {
    self.store_path.as_deref().ok_or(ConfigError::MissingStorePath)
  }

  /// Checks that only matter when running the bot.
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.telegram.token.trim().is_empty() {
      return Err(ConfigError::MissingToken);
    }
    self.store_path()?;
    if self.telegram.mode == TransportMode::Webhook
      && self.telegram.webhook_url.as_deref().is_none_or(|u| u.trim().is_empty())
    {
      return Err(ConfigError::MissingWebhookUrl);
    }

    let office = &self.office;
    if !(office.radius_meters.is_finite() && office.radius_meters > 0.0) {
      return Err(ConfigError::InvalidRadius(office.radius_meters));
    }
    if !office.geofence().center.is_valid() {
      return Err(ConfigError::InvalidOffice {
        latitude:  office.latitude,
        longitude: office.longitude,
      });
    }
    Ok(())
  }
}

fn env_source() -> config::Environment {
  config::Environment::with_prefix("PUNCH")
    .prefix_separator("_")
    .separator("__")
    .try_parsing(true)
}

#[cfg(test)]
mod tests {
  use chrono::NaiveTime;
  use config::{File, FileFormat};

  use super::*;

  fn parse(toml: &str) -> BotConfig {
    config::Config::builder()
      .add_source(File::from_str(toml, FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  const MINIMAL: &str = r#"
    store_path = "punch.db"
    [telegram]
    token = "123:abc"
  "#;

  #[test]
  fn minimal_file_gets_defaults() {
    let cfg = parse(MINIMAL);
    cfg.validate().unwrap();

    assert_eq!(cfg.telegram.mode, TransportMode::Polling);
    assert_eq!(cfg.telegram.poll_timeout_secs, 30);
    assert_eq!(cfg.server.port, 8080);
    assert_eq!(cfg.office.radius_meters, 150.0);
    assert_eq!(cfg.schedule, WorkSchedule::default());
    assert_eq!(cfg.session.idle(), None);
  }

  #[test]
  fn full_file_overrides() {
    let cfg = parse(
      r#"
      store_path = "/tmp/punch.db"
      [telegram]
      token = "123:abc"
      mode = "webhook"
      webhook_url = "https://punch.example.com/webhook"
      webhook_secret = "s3cret"
      [server]
      port = 3000
      [office]
      latitude = 51.5
      longitude = -0.12
      radius_meters = 75.5
      [schedule]
      work_start = "08:30"
      grace_minutes = 5
      timezone = "Europe/London"
      [session]
      ttl_secs = 3600
      "#,
    );
    cfg.validate().unwrap();

    assert_eq!(cfg.telegram.mode, TransportMode::Webhook);
    assert_eq!(cfg.server.port, 3000);
    assert_eq!(cfg.office.geofence().center, Coordinates::new(51.5, -0.12));
    assert_eq!(cfg.schedule.work_start, NaiveTime::from_hms_opt(8, 30, 0).unwrap());
    assert_eq!(cfg.schedule.grace_minutes, 5);
    assert_eq!(cfg.schedule.work_end, NaiveTime::from_hms_opt(18, 0, 0).unwrap());
    assert_eq!(cfg.schedule.timezone, chrono_tz::Europe::London);
    assert_eq!(cfg.session.idle(), Some(Duration::from_secs(3600)));
  }

  #[test]
  fn rejects_unknown_timezone() {
    let result = config::Config::builder()
      .add_source(File::from_str("[schedule]\ntimezone = \"Mars/Olympus\"", FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize::<BotConfig>();
    assert!(result.is_err());
  }

  #[test]
  fn validation_failures() {
    let mut cfg = parse(MINIMAL);
    cfg.telegram.token.clear();
    assert!(matches!(cfg.validate(), Err(ConfigError::MissingToken)));

    let mut cfg = parse(MINIMAL);
    cfg.store_path = None;
    assert!(matches!(cfg.validate(), Err(ConfigError::MissingStorePath)));

    let mut cfg = parse(MINIMAL);
    cfg.telegram.mode = TransportMode::Webhook;
    assert!(matches!(cfg.validate(), Err(ConfigError::MissingWebhookUrl)));

    let mut cfg = parse(MINIMAL);
    cfg.office.radius_meters = 0.0;
    assert!(matches!(cfg.validate(), Err(ConfigError::InvalidRadius(_))));

    let mut cfg = parse(MINIMAL);
    cfg.office.latitude = 123.0;
    assert!(matches!(cfg.validate(), Err(ConfigError::InvalidOffice { .. })));
  }
}
