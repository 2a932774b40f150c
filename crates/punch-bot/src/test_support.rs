use std::{
  future::Future,
  sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
  },
};

use punch_core::{
  employee::EmployeeId,
  geo::{Coordinates, OfficeGeofence},
  schedule::WorkSchedule,
};
use punch_store_sqlite::SqliteStore;
use tokio::sync::mpsc;

use crate::{
  Bot, Error, Result,
  dispatch::Dispatcher,
  event::{Outbound, Reply},
  session::MemorySessions,
  telegram::types::Update,
};

pub const ALICE: EmployeeId = EmployeeId(1001);

pub type TestBot = Bot<SqliteStore, SqliteStore, Recorder>;

/// Captures replies instead of delivering them.
pub struct Recorder(mpsc::UnboundedSender<Reply>);

impl Outbound for Recorder {
  fn send<'a>(&'a self, reply: &'a Reply) -> impl Future<Output = Result<()>> + Send + 'a {
    let _ = self.0.send(reply.clone());
    std::future::ready(Ok(()))
  }
}

/// Refuses every reply, as Telegram does for a user who blocked the bot.
#[derive(Default)]
pub struct Refusing {
  pub attempts: AtomicUsize,
}

impl Outbound for Refusing {
  fn send<'a>(&'a self, _: &'a Reply) -> impl Future<Output = Result<()>> + Send + 'a {
    self.attempts.fetch_add(1, Ordering::SeqCst);
    std::future::ready(Err(Error::Api {
      method:      "sendMessage",
      description: "Forbidden: bot was blocked by the user".into(),
    }))
  }
}

/// A bot over an in-memory store with Alice registered.
pub async fn bot() -> (Arc<TestBot>, mpsc::UnboundedReceiver<Reply>) {
  let (tx, rx) = mpsc::unbounded_channel();
  (bot_with(Recorder(tx)).await, rx)
}

pub async fn bot_with<O: Outbound>(outbound: O) -> Arc<Bot<SqliteStore, SqliteStore, O>> {
  let store = SqliteStore::open_in_memory().await.unwrap();
  store.add_employee(ALICE, "Alice").await.unwrap();
  let store = Arc::new(store);

  let dispatcher = Dispatcher::new(
    store.clone(),
    store,
    Arc::new(MemorySessions::new()),
    OfficeGeofence { center: Coordinates::new(41.2995, 69.2401), radius_meters: 150.0 },
    WorkSchedule::default(),
  );

  Arc::new(Bot::new(dispatcher, outbound))
}

pub fn text_update(update_id: i64, from: i64, text: &str) -> Update {
  serde_json::from_value(serde_json::json!({
    "update_id": update_id,
    "message": {
      "message_id": update_id,
      "from": { "id": from, "first_name": "Test" },
      "chat": { "id": from },
      "date": 1741579200,
      "text": text
    }
  }))
  .unwrap()
}
