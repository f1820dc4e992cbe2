//! Exchange-rate lookup with cached and default fallbacks.
//!
//! The calculators only ever see an [`ExchangeRate`]. Where it came from is
//! tracked here so the UI can say whether the figure is live or stale.

use std::{convert::Infallible, future::Future};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cost::ExchangeRate;

// ─── Source trait ────────────────────────────────────────────────────────────

/// Something that can report the current KRW per USD rate.
pub trait RateSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn fetch_krw_per_usd(&self) -> impl Future<Output = Result<f64, Self::Error>> + Send + '_;
}

/// A source that always reports the same figure. Used for offline mode.
#[derive(Debug, Clone, Copy)]
pub struct FixedRate(pub f64);

impl RateSource for FixedRate {
  type Error = Infallible;

  async fn fetch_krw_per_usd(&self) -> Result<f64, Infallible> { Ok(self.0) }
}

// ─── Snapshot ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateOrigin {
  /// Fetched just now.
  Live,
  /// A previously fetched value, reused because the lookup failed.
  Cached,
  /// Nothing was ever fetched.
  Default,
}

/// A rate together with when and how it was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateSnapshot {
  pub rate:       ExchangeRate,
  pub updated_at: Option<DateTime<Utc>>,
  pub origin:     RateOrigin,
}

impl RateSnapshot {
  pub fn live(rate: ExchangeRate, at: DateTime<Utc>) -> Self {
    Self { rate, updated_at: Some(at), origin: RateOrigin::Live }
  }

  pub fn fallback() -> Self {
    Self { rate: ExchangeRate::DEFAULT, updated_at: None, origin: RateOrigin::Default }
  }

  /// The stored snapshot, or the default rate if nothing was ever stored.
  pub fn cached_or_default(cached: Option<Self>) -> Self {
    cached
      .map(|c| Self { origin: RateOrigin::Cached, ..c })
      .unwrap_or_else(Self::fallback)
  }
}

impl Default for RateSnapshot {
  fn default() -> Self { Self::fallback() }
}

// ─── Resolution ──────────────────────────────────────────────────────────────

/// Ask `source` for a fresh rate; on failure (or an unusable figure) fall back
/// to `cached`, then to [`ExchangeRate::DEFAULT`].
pub async fn resolve_rate<R: RateSource>(
  source: &R,
  cached: Option<RateSnapshot>,
  now: DateTime<Utc>,
) -> RateSnapshot {
  match source.fetch_krw_per_usd().await {
    Ok(value) => match ExchangeRate::new(value) {
      Ok(rate) => {
        tracing::debug!(krw_per_usd = value, "exchange rate refreshed");
        RateSnapshot::live(rate, now)
      }
      Err(e) => {
        tracing::warn!(error = %e, "rate source returned an unusable value");
        RateSnapshot::cached_or_default(cached)
      }
    },
    Err(e) => {
      tracing::warn!(error = %e, "exchange rate lookup failed");
      RateSnapshot::cached_or_default(cached)
    }
  }
}
