//! `punch`: Telegram attendance bot and its admin commands.
//!
//! ```text
//! punch --config punch.toml              # run the bot (same as `serve`)
//! punch employee add 123456789 "Aziz Karimov"
//! punch employee deactivate 123456789
//! punch report --date 2025-03-10
//! ```

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context as _, bail};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use punch_bot::{
  Bot,
  config::{BotConfig, TransportMode},
  dispatch::Dispatcher,
  session,
  telegram::TelegramClient,
  transport::{
    polling::{self, PollingOptions},
    webhook::{self, ServerOptions},
  },
};
use punch_core::employee::EmployeeId;
use punch_store_sqlite::SqliteStore;
use tokio::{net::TcpListener, sync::watch};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "punch", author, version, about = "Telegram attendance bot")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, value_name = "FILE", default_value = "punch.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Run the bot and its HTTP server (default).
  Serve,
  /// Manage the employee directory.
  #[command(subcommand)]
  Employee(EmployeeCommand),
  /// Print the attendance sheet for one day.
  Report {
    /// Day to report, `YYYY-MM-DD`. Defaults to today in the configured zone.
    #[arg(long)]
    date: Option<NaiveDate>,
  },
}

#[derive(Subcommand)]
enum EmployeeCommand {
  /// Register an employee, or reactivate and rename an existing one.
  Add { telegram_id: i64, name: String },
  /// Stop an employee from checking in or out.
  Deactivate { telegram_id: i64 },
  List,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = BotConfig::load(&cli.config)
    .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(cfg).await,
    Command::Employee(command) => employee(cfg, command).await,
    Command::Report { date } => report(cfg, date).await,
  }
}

async fn open_store(cfg: &BotConfig) -> anyhow::Result<SqliteStore> {
  let path = cfg.store_path()?;
  SqliteStore::open(path)
    .await
    .with_context(|| format!("failed to open store at {}", path.display()))
}

// ─── Serve ────────────────────────────────────────────────────────────────────

async fn serve(cfg: BotConfig) -> anyhow::Result<()> {
  cfg.validate().context("invalid configuration")?;

  let store = Arc::new(open_store(&cfg).await?);
  let client = TelegramClient::new(
    &cfg.telegram.api_base,
    &cfg.telegram.token,
    Duration::from_secs(cfg.telegram.poll_timeout_secs),
  )
  .context("failed to build Telegram client")?;

  let dispatcher = Dispatcher::new(
    store.clone(),
    store,
    session::build(cfg.session.idle()),
    cfg.office.geofence(),
    cfg.schedule.clone(),
  );
  let bot = Arc::new(Bot::new(dispatcher, client.clone()));

  if let Err(e) = client.set_my_commands().await {
    tracing::warn!(error = %e, "failed to register bot commands");
  }

  let (stop, shutdown) = watch::channel(false);
  let webhook_mode = cfg.telegram.mode == TransportMode::Webhook;

  let poller = if webhook_mode {
    let url = cfg
      .telegram
      .webhook_url
      .as_deref()
      .context("telegram.webhook_url is required in webhook mode")?;
    client
      .set_webhook(url, cfg.telegram.webhook_secret.as_deref())
      .await
      .context("failed to register webhook")?;
    tracing::info!(url, "webhook registered");
    None
  } else {
    client.delete_webhook().await.context("failed to remove webhook")?;
    let options = PollingOptions {
      timeout_secs: cfg.telegram.poll_timeout_secs,
      ..PollingOptions::default()
    };
    Some(tokio::spawn(polling::run(bot.clone(), client, options, shutdown)))
  };

  let app = webhook::router(bot, ServerOptions {
    port:    cfg.server.port,
    webhook: webhook_mode,
    secret:  cfg.telegram.webhook_secret.clone(),
  });

  let address = format!("{}:{}", cfg.server.host, cfg.server.port);
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(async move {
      if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "cannot listen for ctrl-c; running until killed");
        std::future::pending::<()>().await;
      }
      tracing::info!("shutting down");
      let _ = stop.send(true);
    })
    .await
    .context("server error")?;

  if let Some(poller) = poller {
    poller.await.context("polling task panicked")?;
  }
  Ok(())
}

// ─── Admin ────────────────────────────────────────────────────────────────────

async fn employee(cfg: BotConfig, command: EmployeeCommand) -> anyhow::Result<()> {
  let store = open_store(&cfg).await?;

  match command {
    EmployeeCommand::Add { telegram_id, name } => {
      let name = name.trim();
      if name.is_empty() {
        bail!("employee name must not be empty");
      }
      let employee = store.add_employee(EmployeeId(telegram_id), name).await?;
      println!("active  {}  {}", employee.id, employee.name);
    }
    EmployeeCommand::Deactivate { telegram_id } => {
      if !store.set_active(EmployeeId(telegram_id), false).await? {
        bail!("no employee with telegram id {telegram_id}");
      }
      println!("deactivated  {telegram_id}");
    }
    EmployeeCommand::List => {
      for employee in store.list_employees().await? {
        let state = if employee.active { "active" } else { "inactive" };
        println!("{state:<8}  {:>12}  {}", employee.id, employee.name);
      }
    }
  }
  Ok(())
}

async fn report(cfg: BotConfig, date: Option<NaiveDate>) -> anyhow::Result<()> {
  let store = open_store(&cfg).await?;
  let date = date.unwrap_or_else(|| cfg.schedule.local_date(Utc::now()));

  let records = store.list_attendance(date).await?;
  println!("{date}: {} record(s)", records.len());
  for record in records {
    let check_in = record.check_in();
    let (out, hours) = match record.check_out() {
      Some(o) => (clock(o.at, record.timezone), format!("{:.2}", o.elapsed_hours)),
      None => ("--:--".to_owned(), "-".to_owned()),
    };
    println!(
      "{:>12}  {:<24}  {:<3}  in {} ({})  out {}  hours {}",
      record.employee_id,
      record.employee_name,
      record.status(),
      clock(check_in.at, record.timezone),
      check_in.arrival,
      out,
      hours,
    );
  }
  Ok(())
}

fn clock(at: DateTime<Utc>, tz: Tz) -> String { at.with_timezone(&tz).format("%H:%M").to_string() }
