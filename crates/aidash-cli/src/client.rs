//! Async HTTP client wrapping the aidash JSON API.

use std::time::Duration;

use aidash_core::{
  backup::ImportReport,
  dashboard::DashboardSnapshot,
  rate::RateSnapshot,
  service::{NewService, Service},
  subscription::{NewSubscription, Subscription},
};
use anyhow::{Context, Result, anyhow};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// Connection settings for the aidash API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub timeout:  Duration,
}

/// Async HTTP client for the aidash JSON REST API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

/// Turn a non-2xx response into an error carrying the server's message.
async fn check(resp: Response, what: &str) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  let message = resp
    .json::<serde_json::Value>()
    .await
    .ok()
    .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_owned))
    .unwrap_or_else(|| status.to_string());
  Err(anyhow!("{what} → {status}: {message}"))
}

async fn json<T: DeserializeOwned>(resp: Response, what: &str) -> Result<T> {
  check(resp, what)
    .await?
    .json()
    .await
    .with_context(|| format!("deserialising {what} response"))
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(config.timeout)
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!(
      "{}/api{}",
      self.config.base_url.trim_end_matches('/'),
      path
    )
  }

  // ── Read model ────────────────────────────────────────────────────────────

  /// `GET /api/dashboard`
  pub async fn dashboard(&self) -> Result<DashboardSnapshot> {
    let resp = self
      .client
      .get(self.url("/dashboard"))
      .send()
      .await
      .context("GET /dashboard failed")?;
    json(resp, "GET /dashboard").await
  }

  // ── Services ──────────────────────────────────────────────────────────────

  /// `GET /api/services`
  pub async fn list_services(&self) -> Result<Vec<Service>> {
    let resp = self
      .client
      .get(self.url("/services"))
      .send()
      .await
      .context("GET /services failed")?;
    json(resp, "GET /services").await
  }

  /// `POST /api/services`
  pub async fn add_service(&self, input: &NewService) -> Result<Service> {
    let resp = self
      .client
      .post(self.url("/services"))
      .json(input)
      .send()
      .await
      .context("POST /services failed")?;
    json(resp, "POST /services").await
  }

  /// `DELETE /api/services/:id`
  pub async fn delete_service(&self, id: Uuid) -> Result<()> {
    let resp = self
      .client
      .delete(self.url(&format!("/services/{id}")))
      .send()
      .await
      .context("DELETE /services failed")?;
    check(resp, "DELETE /services").await.map(drop)
  }

  // ── Subscriptions ─────────────────────────────────────────────────────────

  /// `POST /api/subscriptions`
  pub async fn add_subscription(&self, input: &NewSubscription) -> Result<Subscription> {
    let resp = self
      .client
      .post(self.url("/subscriptions"))
      .json(input)
      .send()
      .await
      .context("POST /subscriptions failed")?;
    json(resp, "POST /subscriptions").await
  }

  /// `PUT /api/subscriptions/:id`
  pub async fn update_subscription(
    &self,
    id: Uuid,
    input: &NewSubscription,
  ) -> Result<Subscription> {
    let resp = self
      .client
      .put(self.url(&format!("/subscriptions/{id}")))
      .json(input)
      .send()
      .await
      .context("PUT /subscriptions failed")?;
    json(resp, "PUT /subscriptions").await
  }

  /// `DELETE /api/subscriptions/:id`
  pub async fn delete_subscription(&self, id: Uuid) -> Result<()> {
    let resp = self
      .client
      .delete(self.url(&format!("/subscriptions/{id}")))
      .send()
      .await
      .context("DELETE /subscriptions failed")?;
    check(resp, "DELETE /subscriptions").await.map(drop)
  }

  // ── Exchange rate ─────────────────────────────────────────────────────────

  /// `POST /api/rate/refresh`
  pub async fn refresh_rate(&self) -> Result<RateSnapshot> {
    let resp = self
      .client
      .post(self.url("/rate/refresh"))
      .send()
      .await
      .context("POST /rate/refresh failed")?;
    json(resp, "POST /rate/refresh").await
  }

  // ── Backup ────────────────────────────────────────────────────────────────

  /// `GET /api/export`, returned as the raw pretty-printed document.
  pub async fn export(&self) -> Result<String> {
    let resp = self
      .client
      .get(self.url("/export"))
      .send()
      .await
      .context("GET /export failed")?;
    check(resp, "GET /export")
      .await?
      .text()
      .await
      .context("reading export body")
  }

  /// `POST /api/import`
  pub async fn import(&self, document: String) -> Result<ImportReport> {
    let resp = self
      .client
      .post(self.url("/import"))
      .header(reqwest::header::CONTENT_TYPE, "application/json")
      .body(document)
      .send()
      .await
      .context("POST /import failed")?;
    json(resp, "POST /import").await
  }
}
