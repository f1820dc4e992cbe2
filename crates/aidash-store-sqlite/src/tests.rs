//! Integration tests for `SqliteStore` against an in-memory database.

use aidash_core::{
  backup::parse_backup,
  cost::ExchangeRate,
  rate::{FixedRate, RateOrigin, RateSnapshot, RateSource},
  service::{Category, NewService, default_catalogue},
  store::{DashboardStore, current_rate, refresh_rate, seed_default_services},
  subscription::{Currency, NewSubscription, Period},
};
use chrono::{NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn rate(krw_per_usd: f64) -> ExchangeRate { ExchangeRate::new(krw_per_usd).unwrap() }

fn sub(name: &str, price: f64, currency: Currency, period: Period) -> NewSubscription {
  NewSubscription {
    name: name.into(),
    price,
    currency,
    period,
    start_date: NaiveDate::from_ymd_opt(2024, 1, 15),
  }
}

// ─── Services ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_list_services() {
  let s = store().await;
  s.add_service(NewService::new("Suno", "https://suno.ai", Category::Music))
    .await
    .unwrap();
  s.add_service(NewService::new("Manus", "https://manus.im", Category::Agent))
    .await
    .unwrap();
  s.add_service(NewService::new("ChatGPT", "https://chat.openai.com", Category::Agent))
    .await
    .unwrap();

  let names: Vec<String> = s
    .list_services()
    .await
    .unwrap()
    .into_iter()
    .map(|s| s.name)
    .collect();
  assert_eq!(names, vec!["Manus", "ChatGPT", "Suno"]);
}

#[tokio::test]
async fn add_service_rejects_invalid_url() {
  let s = store().await;
  let err = s
    .add_service(NewService::new("Bad", "javascript:alert(1)", Category::Agent))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(aidash_core::Error::InvalidUrl { .. })));
  assert!(s.list_services().await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_service_reports_existence() {
  let s = store().await;
  let added = s
    .add_service(NewService::new("Wan", "https://wan.video/", Category::Video))
    .await
    .unwrap();

  assert!(s.delete_service(added.service_id).await.unwrap());
  assert!(!s.delete_service(added.service_id).await.unwrap());
  assert!(s.list_services().await.unwrap().is_empty());
}

#[tokio::test]
async fn seeding_only_fills_an_empty_store() {
  let s = store().await;
  let added = seed_default_services(&s).await.unwrap();
  assert_eq!(added, default_catalogue().len());
  assert_eq!(seed_default_services(&s).await.unwrap(), 0);
  assert_eq!(s.list_services().await.unwrap().len(), added);
}

// ─── Subscriptions ───────────────────────────────────────────────────────────

#[tokio::test]
async fn subscription_round_trip() {
  let s = store().await;
  let added = s
    .add_subscription(sub("  Midjourney ", 30.0, Currency::Usd, Period::Monthly))
    .await
    .unwrap();
  assert_eq!(added.name, "Midjourney");

  let fetched = s.get_subscription(added.subscription_id).await.unwrap().unwrap();
  assert_eq!(fetched.name, "Midjourney");
  assert_eq!(fetched.price, 30.0);
  assert_eq!(fetched.currency, Currency::Usd);
  assert_eq!(fetched.period, Period::Monthly);
  assert_eq!(fetched.start_date, NaiveDate::from_ymd_opt(2024, 1, 15));
  assert_eq!(fetched.created_at, added.created_at);
}

#[tokio::test]
async fn subscriptions_list_in_insertion_order() {
  let s = store().await;
  for name in ["b", "a", "c"] {
    s.add_subscription(sub(name, 1.0, Currency::Usd, Period::Monthly))
      .await
      .unwrap();
  }
  let names: Vec<String> = s
    .list_subscriptions()
    .await
    .unwrap()
    .into_iter()
    .map(|s| s.name)
    .collect();
  assert_eq!(names, vec!["b", "a", "c"]);
}

#[tokio::test]
async fn subscription_without_start_date_is_stored() {
  let s = store().await;
  let mut input = sub("Legacy", 5.0, Currency::Krw, Period::Yearly);
  input.start_date = None;
  let added = s.add_subscription(input).await.unwrap();
  let fetched = s.get_subscription(added.subscription_id).await.unwrap().unwrap();
  assert_eq!(fetched.start_date, None);
}

#[tokio::test]
async fn add_subscription_rejects_non_positive_price() {
  let s = store().await;
  let err = s
    .add_subscription(sub("Free", 0.0, Currency::Usd, Period::Monthly))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(aidash_core::Error::InvalidPrice(_))));
}

#[tokio::test]
async fn update_subscription_keeps_identity() {
  let s = store().await;
  let added = s
    .add_subscription(sub("Runway", 15.0, Currency::Usd, Period::Monthly))
    .await
    .unwrap();

  let updated = s
    .update_subscription(added.subscription_id, sub("Runway", 144.0, Currency::Usd, Period::Yearly))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(updated.subscription_id, added.subscription_id);
  assert_eq!(updated.created_at, added.created_at);
  assert_eq!(updated.period, Period::Yearly);

  let fetched = s.get_subscription(added.subscription_id).await.unwrap().unwrap();
  assert_eq!(fetched.price, 144.0);
  assert_eq!(fetched.period, Period::Yearly);
}

#[tokio::test]
async fn update_missing_subscription_returns_none() {
  let s = store().await;
  let result = s
    .update_subscription(Uuid::new_v4(), sub("x", 1.0, Currency::Usd, Period::Monthly))
    .await
    .unwrap();
  assert!(result.is_none());
}

#[tokio::test]
async fn delete_subscription() {
  let s = store().await;
  let added = s
    .add_subscription(sub("Suno", 10.0, Currency::Usd, Period::Monthly))
    .await
    .unwrap();
  assert!(s.delete_subscription(added.subscription_id).await.unwrap());
  assert!(s.get_subscription(added.subscription_id).await.unwrap().is_none());
  assert!(!s.delete_subscription(added.subscription_id).await.unwrap());
}

// ─── Exchange rate ───────────────────────────────────────────────────────────

#[tokio::test]
async fn rate_cache_starts_empty_and_overwrites() {
  let s = store().await;
  assert!(s.load_rate().await.unwrap().is_none());

  let first = RateSnapshot::live(rate(1350.0), Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap());
  s.save_rate(first).await.unwrap();
  let second = RateSnapshot::live(rate(1382.5), Utc.with_ymd_and_hms(2024, 6, 2, 9, 0, 0).unwrap());
  s.save_rate(second).await.unwrap();

  let loaded = s.load_rate().await.unwrap().unwrap();
  assert_eq!(loaded, second);
  assert_eq!(loaded.origin, RateOrigin::Live);
}

struct Unreachable;

impl RateSource for Unreachable {
  type Error = std::io::Error;

  async fn fetch_krw_per_usd(&self) -> Result<f64, std::io::Error> {
    Err(std::io::Error::other("connection refused"))
  }
}

#[tokio::test]
async fn refresh_persists_live_rate() {
  let s = store().await;
  assert_eq!(current_rate(&s).await.unwrap().origin, RateOrigin::Default);

  let snap = refresh_rate(&s, &FixedRate(1388.0)).await.unwrap();
  assert_eq!(snap.origin, RateOrigin::Live);

  let stored = s.load_rate().await.unwrap().unwrap();
  assert_eq!(stored.rate.krw_per_usd(), 1388.0);
  assert_eq!(current_rate(&s).await.unwrap(), stored);
}

#[tokio::test]
async fn failed_refresh_falls_back_to_cache() {
  let s = store().await;
  let cached = RateSnapshot::live(rate(1360.0), Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap());
  s.save_rate(cached).await.unwrap();

  let snap = refresh_rate(&s, &Unreachable).await.unwrap();
  assert_eq!(snap.origin, RateOrigin::Cached);
  assert_eq!(snap.rate, cached.rate);
  assert_eq!(snap.updated_at, cached.updated_at);
}

#[tokio::test]
async fn default_rate_is_never_stored() {
  let s = store().await;
  let snap = refresh_rate(&s, &Unreachable).await.unwrap();
  assert_eq!(snap.origin, RateOrigin::Default);
  assert_eq!(snap.rate, ExchangeRate::DEFAULT);
  assert!(s.load_rate().await.unwrap().is_none());
}

// ─── Bulk replace ────────────────────────────────────────────────────────────

#[tokio::test]
async fn replace_all_swaps_contents_and_keeps_rate() {
  let s = store().await;
  seed_default_services(&s).await.unwrap();
  s.add_subscription(sub("Old", 1.0, Currency::Usd, Period::Monthly))
    .await
    .unwrap();
  let cached = RateSnapshot::live(rate(1400.0), Utc::now());
  s.save_rate(cached).await.unwrap();

  let plan = parse_backup(
    r#"{
      "services": { "music": [ { "name": "Suno", "url": "https://suno.ai" } ] },
      "subscriptions": [
        { "name": "Vrew", "price": 99000, "currency": "KRW", "period": "yearly", "startDate": "2024-03-01" },
        { "name": "Broken", "price": -1, "currency": "USD", "period": "monthly" }
      ]
    }"#,
  )
  .unwrap();

  let report = s.replace_all(plan).await.unwrap();
  assert_eq!((report.services, report.subscriptions, report.skipped.len()), (1, 1, 1));

  let services = s.list_services().await.unwrap();
  assert_eq!(services.len(), 1);
  assert_eq!(services[0].name, "Suno");

  let subs = s.list_subscriptions().await.unwrap();
  assert_eq!(subs.len(), 1);
  assert_eq!(subs[0].name, "Vrew");
  assert_eq!(subs[0].currency, Currency::Krw);

  assert_eq!(s.load_rate().await.unwrap(), Some(cached));
}
