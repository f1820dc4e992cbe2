//! The `DashboardStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `aidash-store-sqlite`).
//! Higher layers (`aidash-api`, `aidash-server`) depend on this abstraction,
//! not on any concrete backend. It is the single owner of dashboard state;
//! the calculators receive copies of what it returns.

use std::future::Future;

use chrono::Utc;
use uuid::Uuid;

use crate::{
  backup::{ImportPlan, ImportReport},
  rate::{RateOrigin, RateSource, RateSnapshot, resolve_rate},
  service::{NewService, Service, default_catalogue},
  subscription::{NewSubscription, Subscription},
};

/// Abstraction over an aidash storage backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait DashboardStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Services ──────────────────────────────────────────────────────────

  /// All bookmarks, in category display order then insertion order.
  fn list_services(
    &self,
  ) -> impl Future<Output = Result<Vec<Service>, Self::Error>> + Send + '_;

  /// Validate and persist a bookmark.
  fn add_service(
    &self,
    input: NewService,
  ) -> impl Future<Output = Result<Service, Self::Error>> + Send + '_;

  /// Returns `false` if no such bookmark existed.
  fn delete_service(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Subscriptions ─────────────────────────────────────────────────────

  /// All subscriptions in insertion order.
  fn list_subscriptions(
    &self,
  ) -> impl Future<Output = Result<Vec<Subscription>, Self::Error>> + Send + '_;

  fn get_subscription(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Subscription>, Self::Error>> + Send + '_;

  /// Validate and persist a subscription. The id and `created_at` are set by
  /// the store.
  fn add_subscription(
    &self,
    input: NewSubscription,
  ) -> impl Future<Output = Result<Subscription, Self::Error>> + Send + '_;

  /// Replace the editable fields of an existing subscription. Returns `None`
  /// if it does not exist.
  fn update_subscription(
    &self,
    id: Uuid,
    input: NewSubscription,
  ) -> impl Future<Output = Result<Option<Subscription>, Self::Error>> + Send + '_;

  /// Returns `false` if no such subscription existed.
  fn delete_subscription(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Exchange rate ─────────────────────────────────────────────────────

  /// The last successfully fetched rate, if any.
  fn load_rate(
    &self,
  ) -> impl Future<Output = Result<Option<RateSnapshot>, Self::Error>> + Send + '_;

  fn save_rate(
    &self,
    snapshot: RateSnapshot,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Bulk ──────────────────────────────────────────────────────────────

  /// Atomically replace every service and subscription with the content of
  /// `plan`. The cached rate is left alone.
  fn replace_all(
    &self,
    plan: ImportPlan,
  ) -> impl Future<Output = Result<ImportReport, Self::Error>> + Send + '_;
}

/// Seed the default bookmark catalogue if the store has no services yet.
/// Returns the number of services added.
pub async fn seed_default_services<S: DashboardStore>(store: &S) -> Result<usize, S::Error> {
  if !store.list_services().await?.is_empty() {
    return Ok(0);
  }
  let catalogue = default_catalogue();
  let count = catalogue.len();
  for entry in catalogue {
    store.add_service(entry).await?;
  }
  tracing::info!(count, "seeded default services");
  Ok(count)
}

/// Ask `source` for a fresh rate, falling back to the stored one, and persist
/// the outcome. A default-rate fallback is never written back.
pub async fn refresh_rate<S, R>(store: &S, source: &R) -> Result<RateSnapshot, S::Error>
where
  S: DashboardStore,
  R: RateSource,
{
  let cached = store.load_rate().await?;
  let snapshot = resolve_rate(source, cached, Utc::now()).await;
  if snapshot.origin != RateOrigin::Default {
    store.save_rate(snapshot).await?;
  }
  tracing::info!(
    krw_per_usd = snapshot.rate.krw_per_usd(),
    origin = ?snapshot.origin,
    "exchange rate resolved"
  );
  Ok(snapshot)
}

/// The rate the dashboard should use right now: the stored snapshot, or the
/// default when nothing was ever fetched.
pub async fn current_rate<S: DashboardStore>(store: &S) -> Result<RateSnapshot, S::Error> {
  Ok(store.load_rate().await?.unwrap_or_default())
}
