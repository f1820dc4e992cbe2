//! Exchange-rate sources used by the server, and the background refresh task.

use std::{collections::HashMap, sync::Arc, time::Duration};

use aidash_core::{
  rate::{FixedRate, RateSource},
  store::{DashboardStore, refresh_rate},
};
use reqwest::Client;
use serde::Deserialize;
use tokio::task::JoinHandle;

use crate::{Error, Result};

/// The public endpoint queried when `rate_url` is not configured.
pub const DEFAULT_RATE_URL: &str = "https://api.exchangerate-api.com/v4/latest/USD";

// ─── Live client ─────────────────────────────────────────────────────────────

/// Shape of a `latest/USD` response; only the rate table is read.
#[derive(Debug, Deserialize)]
struct LatestRates {
  rates: HashMap<String, f64>,
}

/// Fetches KRW per USD from an exchangerate-api style endpoint.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ExchangeRateClient {
  client: Client,
  url:    String,
}

impl ExchangeRateClient {
  pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
    let client = Client::builder().timeout(timeout).build()?;
    Ok(Self { client, url: url.into() })
  }

  pub fn url(&self) -> &str { &self.url }
}

impl RateSource for ExchangeRateClient {
  type Error = Error;

  async fn fetch_krw_per_usd(&self) -> Result<f64> {
    tracing::debug!(url = %self.url, "requesting exchange rate");
    let resp = self.client.get(&self.url).send().await?;
    if !resp.status().is_success() {
      return Err(Error::Status(resp.status()));
    }
    let body: LatestRates = resp.json().await?;
    body.rates.get("KRW").copied().ok_or(Error::MissingCurrency("KRW"))
  }
}

// ─── Provider ────────────────────────────────────────────────────────────────

/// The rate source chosen by configuration: the live client, or a fixed
/// figure when `rate_url` is empty.
#[derive(Clone)]
pub enum RateProvider {
  Live(ExchangeRateClient),
  Fixed(FixedRate),
}

impl RateSource for RateProvider {
  type Error = Error;

  async fn fetch_krw_per_usd(&self) -> Result<f64> {
    match self {
      Self::Live(client) => client.fetch_krw_per_usd().await,
      Self::Fixed(FixedRate(rate)) => Ok(*rate),
    }
  }
}

// ─── Refresh task ────────────────────────────────────────────────────────────

/// Refresh the stored rate immediately and then every `every`.
///
/// A failed lookup is logged by [`refresh_rate`] and leaves the cached value
/// in place; only store failures are reported here.
pub fn spawn_refresh<S, R>(store: Arc<S>, source: Arc<R>, every: Duration) -> JoinHandle<()>
where
  S: DashboardStore + 'static,
  R: RateSource + 'static,
{
  tokio::spawn(async move {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
      ticker.tick().await;
      if let Err(e) = refresh_rate(store.as_ref(), source.as_ref()).await {
        tracing::error!(error = %e, "failed to store refreshed exchange rate");
      }
    }
  })
}

#[cfg(test)]
mod tests {
  use aidash_core::rate::RateOrigin;
  use aidash_store_sqlite::SqliteStore;
  use axum::{Json, Router, http::StatusCode, routing::get};
  use serde_json::json;
  use tokio::net::TcpListener;

  use super::*;

  /// Serve `router` on an ephemeral local port and return its base URL.
  async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
    format!("http://{addr}")
  }

  fn client(url: String) -> ExchangeRateClient {
    ExchangeRateClient::new(url, Duration::from_secs(5)).unwrap()
  }

  #[tokio::test]
  async fn reads_krw_from_rate_table() {
    let base = serve(Router::new().route(
      "/latest/USD",
      get(|| async { Json(json!({ "base": "USD", "rates": { "EUR": 0.92, "KRW": 1372.4 } })) }),
    ))
    .await;

    let rate = client(format!("{base}/latest/USD")).fetch_krw_per_usd().await.unwrap();
    assert_eq!(rate, 1372.4);
  }

  #[tokio::test]
  async fn missing_krw_is_an_error() {
    let base = serve(Router::new().route(
      "/latest/USD",
      get(|| async { Json(json!({ "rates": { "EUR": 0.92 } })) }),
    ))
    .await;

    let err = client(format!("{base}/latest/USD")).fetch_krw_per_usd().await.unwrap_err();
    assert!(matches!(err, Error::MissingCurrency("KRW")));
  }

  #[tokio::test]
  async fn error_status_is_reported() {
    let base = serve(Router::new().route(
      "/latest/USD",
      get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
    ))
    .await;

    let err = client(format!("{base}/latest/USD")).fetch_krw_per_usd().await.unwrap_err();
    assert!(matches!(err, Error::Status(s) if s == StatusCode::SERVICE_UNAVAILABLE));
  }

  #[tokio::test]
  async fn fixed_provider_never_touches_the_network() {
    let provider = RateProvider::Fixed(FixedRate(1250.0));
    assert_eq!(provider.fetch_krw_per_usd().await.unwrap(), 1250.0);
  }

  #[tokio::test]
  async fn refresh_task_stores_rate_on_first_tick() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let handle = spawn_refresh(
      store.clone(),
      Arc::new(RateProvider::Fixed(FixedRate(1410.0))),
      Duration::from_secs(3600),
    );

    let mut stored = None;
    for _ in 0..50 {
      stored = store.load_rate().await.unwrap();
      if stored.is_some() {
        break;
      }
      tokio::time::sleep(Duration::from_millis(20)).await;
    }
    handle.abort();

    let stored = stored.expect("rate was stored");
    assert_eq!(stored.rate.krw_per_usd(), 1410.0);
    assert_eq!(stored.origin, RateOrigin::Live);
  }
}
