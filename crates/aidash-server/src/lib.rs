//! HTTP server for the aidash dashboard.
//!
//! Mounts the JSON API from `aidash-api` under `/api`, adds request tracing,
//! and owns the live exchange-rate client and its refresh schedule.

pub mod error;
pub mod rates;

pub use error::{Error, Result};

use std::{path::PathBuf, sync::Arc, time::Duration};

use aidash_core::{cost::ExchangeRate, rate::FixedRate, store::DashboardStore};
use axum::{Router, routing::get};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use rates::{DEFAULT_RATE_URL, ExchangeRateClient, RateProvider};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `AIDASH_*` environment variables. Every key is optional.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
  pub host:              String,
  pub port:              u16,
  pub store_path:        PathBuf,
  /// Live rate endpoint. Empty disables lookups in favour of `default_rate`.
  pub rate_url:          String,
  pub rate_refresh_secs: u64,
  pub rate_timeout_secs: u64,
  /// KRW per USD used when live lookups are disabled.
  pub default_rate:      f64,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:              "127.0.0.1".to_string(),
      port:              8080,
      store_path:        PathBuf::from("~/.local/share/aidash/aidash.db"),
      rate_url:          DEFAULT_RATE_URL.to_string(),
      rate_refresh_secs: 3600,
      rate_timeout_secs: 10,
      default_rate:      ExchangeRate::DEFAULT.krw_per_usd(),
    }
  }
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn refresh_interval(&self) -> Duration {
    Duration::from_secs(self.rate_refresh_secs.max(1))
  }

  /// Build the configured rate source. Fails on an unusable `default_rate`
  /// or if the HTTP client cannot be constructed.
  pub fn rate_provider(&self) -> anyhow::Result<RateProvider> {
    if self.rate_url.trim().is_empty() {
      let rate = ExchangeRate::new(self.default_rate)?;
      return Ok(RateProvider::Fixed(FixedRate(rate.krw_per_usd())));
    }
    let client = ExchangeRateClient::new(
      self.rate_url.trim(),
      Duration::from_secs(self.rate_timeout_secs.max(1)),
    )?;
    Ok(RateProvider::Live(client))
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router.
pub fn router<S>(store: Arc<S>, rates: Arc<RateProvider>) -> Router
where
  S: DashboardStore + 'static,
{
  Router::new()
    .route("/health", get(|| async { "ok" }))
    .nest("/api", aidash_api::api_router(store, rates))
    .layer(TraceLayer::new_for_http())
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use aidash_store_sqlite::SqliteStore;
  use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
  };
  use serde_json::Value;
  use tower::ServiceExt as _;

  async fn app() -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    aidash_core::store::seed_default_services(&store).await.unwrap();
    router(Arc::new(store), Arc::new(RateProvider::Fixed(FixedRate(1300.0))))
  }

  async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
  }

  #[tokio::test]
  async fn health_check() {
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let resp = app().await.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn api_is_nested() {
    let (status, services) = get_json(app().await, "/api/services").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
      services.as_array().unwrap().len(),
      aidash_core::service::default_catalogue().len()
    );

    let (status, _) = get_json(app().await, "/services").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[test]
  fn config_defaults_and_overrides() {
    let cfg: ServerConfig = config::Config::builder()
      .add_source(config::File::from_str(
        "port = 9000\nrate_url = \"\"\ndefault_rate = 1250.0",
        config::FileFormat::Toml,
      ))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap();

    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.rate_refresh_secs, 3600);
    assert!(matches!(cfg.rate_provider().unwrap(), RateProvider::Fixed(FixedRate(r)) if r == 1250.0));
  }

  #[test]
  fn invalid_default_rate_is_rejected() {
    let cfg = ServerConfig { rate_url: String::new(), default_rate: 0.0, ..Default::default() };
    assert!(cfg.rate_provider().is_err());
  }

  #[test]
  fn live_provider_by_default() {
    let cfg = ServerConfig::default();
    assert!(matches!(cfg.rate_provider().unwrap(), RateProvider::Live(c) if c.url() == DEFAULT_RATE_URL));
  }
}
