//! JSON REST API for aidash.
//!
//! Exposes an axum [`Router`] backed by any [`aidash_core::store::DashboardStore`]
//! and [`aidash_core::rate::RateSource`]. TLS and transport concerns are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", aidash_api::api_router(store.clone(), rates.clone()))
//! ```

pub mod backup;
pub mod dashboard;
pub mod error;
pub mod rate;
pub mod services;
pub mod subscriptions;

use std::sync::Arc;

use aidash_core::{rate::RateSource, store::DashboardStore};
use axum::{
  Router,
  routing::{delete, get, post},
};
use chrono::{Local, NaiveDate};

pub use error::ApiError;

// ─── State ───────────────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct ApiState<S, R> {
  pub store: Arc<S>,
  pub rates: Arc<R>,
}

impl<S, R> Clone for ApiState<S, R> {
  fn clone(&self) -> Self {
    Self { store: self.store.clone(), rates: self.rates.clone() }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `store`, refreshing exchange
/// rates from `rates`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, R>(store: Arc<S>, rates: Arc<R>) -> Router<()>
where
  S: DashboardStore + 'static,
  R: RateSource + 'static,
{
  Router::new()
    // Bookmarks
    .route("/services", get(services::list::<S, R>).post(services::create::<S, R>))
    .route("/services/search", get(services::search::<S, R>))
    .route("/services/{id}", delete(services::delete_one::<S, R>))
    // Subscriptions
    .route(
      "/subscriptions",
      get(subscriptions::list::<S, R>).post(subscriptions::create::<S, R>),
    )
    .route(
      "/subscriptions/{id}",
      get(subscriptions::get_one::<S, R>)
        .put(subscriptions::update_one::<S, R>)
        .delete(subscriptions::delete_one::<S, R>),
    )
    // Read model
    .route("/dashboard", get(dashboard::handler::<S, R>))
    // Exchange rate
    .route("/rate", get(rate::current::<S, R>))
    .route("/rate/refresh", post(rate::refresh::<S, R>))
    // Backup
    .route("/export", get(backup::export::<S, R>))
    .route("/import", post(backup::import::<S, R>))
    .with_state(ApiState { store, rates })
}

/// The date renewal status is computed against: `?today=` when given,
/// otherwise the server's local calendar date.
pub(crate) fn today_or(param: Option<NaiveDate>) -> NaiveDate {
  param.unwrap_or_else(|| Local::now().date_naive())
}

#[cfg(test)]
pub(crate) mod test_support {
  use aidash_core::rate::FixedRate;
  use aidash_store_sqlite::SqliteStore;
  use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
  };
  use serde_json::Value;
  use tower::ServiceExt as _;

  use super::*;

  /// A rate source whose lookups always fail.
  pub struct Offline;

  #[derive(Debug, thiserror::Error)]
  #[error("network unreachable")]
  pub struct Unreachable;

  impl RateSource for Offline {
    type Error = Unreachable;

    async fn fetch_krw_per_usd(&self) -> Result<f64, Unreachable> { Err(Unreachable) }
  }

  pub async fn store() -> Arc<SqliteStore> {
    Arc::new(SqliteStore::open_in_memory().await.unwrap())
  }

  pub fn app<R: RateSource + 'static>(store: Arc<SqliteStore>, rates: R) -> Router {
    api_router(store, Arc::new(rates))
  }

  pub fn fixed(krw_per_usd: f64) -> FixedRate { FixedRate(krw_per_usd) }

  pub async fn send(
    app: Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
      Some(json) => builder
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      // Extractor rejections are plain text.
      serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
  }
}
