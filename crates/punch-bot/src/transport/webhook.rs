//! HTTP surface: service info, health check and, in webhook mode, the endpoint
//! Telegram posts updates to.

use std::sync::Arc;

use axum::{
  Json, Router,
  extract::State,
  http::{HeaderMap, StatusCode},
  routing::{get, post},
};
use chrono::Utc;
use punch_core::store::{AttendanceStore, EmployeeDirectory};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

use crate::{Bot, Error, Result, event::Outbound, telegram::types::Update};

/// Header Telegram echoes the `secret_token` given to `setWebhook` in.
pub const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

#[derive(Debug, Clone, Default)]
pub struct ServerOptions {
  /// Reported by `GET /`.
  pub port:    u16,
  /// Mount `POST /webhook`.
  pub webhook: bool,
  /// When set, `/webhook` requests must carry it in [`SECRET_HEADER`].
  pub secret:  Option<String>,
}

struct AppState<D, S, O> {
  bot:    Arc<Bot<D, S, O>>,
  port:   u16,
  secret: Option<Arc<str>>,
}

impl<D, S, O> Clone for AppState<D, S, O> {
  fn clone(&self) -> Self {
    Self { bot: self.bot.clone(), port: self.port, secret: self.secret.clone() }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

pub fn router<D, S, O>(bot: Arc<Bot<D, S, O>>, options: ServerOptions) -> Router
where
  D: EmployeeDirectory + 'static,
  S: AttendanceStore + 'static,
  O: Outbound + 'static,
{
  let state = AppState {
    bot,
    port: options.port,
    secret: options.secret.map(Arc::from),
  };

  let mut router = Router::new()
    .route("/",       get(info::<D, S, O>))
    .route("/health", get(health));
  if options.webhook {
    router = router.route("/webhook", post(webhook::<D, S, O>));
  }

  router.layer(TraceLayer::new_for_http()).with_state(state)
}

// ─── Handlers ────────────────────────────────────────────────────────────────

async fn info<D, S, O>(State(state): State<AppState<D, S, O>>) -> Json<Value> {
  Json(json!({
    "message": "Employee Attendance Bot API",
    "status":  "running",
    "port":    state.port,
  }))
}

async fn health() -> Json<Value> {
  Json(json!({ "status": "healthy", "timestamp": Utc::now().to_rfc3339() }))
}

/// Processes the update before answering so Telegram redelivers it if the
/// process dies midway.
async fn webhook<D, S, O>(
  State(state): State<AppState<D, S, O>>,
  headers: HeaderMap,
  Json(update): Json<Update>,
) -> Result<StatusCode>
where
  D: EmployeeDirectory + 'static,
  S: AttendanceStore + 'static,
  O: Outbound + 'static,
{
  if let Some(expected) = &state.secret {
    let given = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
    if given != Some(expected.as_ref()) {
      tracing::warn!("webhook call with missing or wrong secret token");
      return Err(Error::Unauthorized);
    }
  }

  state.bot.process(update).await;
  Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Method, Request, header},
  };
  use tower::ServiceExt;

  use super::*;
  use crate::{
    messages,
    test_support::{self, ALICE},
  };

  fn webhook_options() -> ServerOptions {
    ServerOptions { port: 8080, webhook: true, secret: Some("s3cret".into()) }
  }

  fn post_update(update: &Update, secret: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
      .method(Method::POST)
      .uri("/webhook")
      .header(header::CONTENT_TYPE, "application/json");
    if let Some(secret) = secret {
      builder = builder.header(SECRET_HEADER, secret);
    }
    builder.body(Body::from(serde_json::to_vec(update).unwrap())).unwrap()
  }

  async fn json_body(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  #[tokio::test]
  async fn health_reports_healthy() {
    let (bot, _) = test_support::bot().await;
    let app = router(bot, ServerOptions::default());

    let resp = app
      .oneshot(Request::get("/health").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = json_body(resp).await;
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].is_string());
  }

  #[tokio::test]
  async fn root_reports_port() {
    let (bot, _) = test_support::bot().await;
    let app = router(bot, webhook_options());

    let resp = app
      .oneshot(Request::get("/").body(Body::empty()).unwrap())
      .await
      .unwrap();
    let body = json_body(resp).await;
    assert_eq!(body["status"], "running");
    assert_eq!(body["port"], 8080);
  }

  #[tokio::test]
  async fn webhook_processes_update_and_replies() {
    let (bot, mut replies) = test_support::bot().await;
    let app = router(bot, webhook_options());

    let update = test_support::text_update(1, ALICE.0, "/start");
    let resp = app.oneshot(post_update(&update, Some("s3cret"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let reply = replies.try_recv().unwrap();
    assert_eq!(reply.text, messages::welcome("Alice"));
  }

  #[tokio::test]
  async fn webhook_rejects_wrong_secret() {
    let (bot, mut replies) = test_support::bot().await;
    let app = router(bot, webhook_options());

    let update = test_support::text_update(1, ALICE.0, "/start");
    let resp = app.clone().oneshot(post_update(&update, Some("nope"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app.oneshot(post_update(&update, None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    assert!(replies.try_recv().is_err());
  }

  #[tokio::test]
  async fn webhook_without_secret_accepts_any_caller() {
    let (bot, mut replies) = test_support::bot().await;
    let app = router(bot, ServerOptions { webhook: true, ..Default::default() });

    let update = test_support::text_update(1, 7, "/start");
    let resp = app.oneshot(post_update(&update, None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(replies.try_recv().unwrap().text, messages::NOT_REGISTERED);
  }

  #[tokio::test]
  async fn webhook_is_not_mounted_in_polling_mode() {
    let (bot, _) = test_support::bot().await;
    let app = router(bot, ServerOptions::default());

    let update = test_support::text_update(1, ALICE.0, "/start");
    let resp = app.oneshot(post_update(&update, None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }
}
