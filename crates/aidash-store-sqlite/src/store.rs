//! [`SqliteStore`]: the SQLite implementation of [`DashboardStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use aidash_core::{
  backup::{ImportPlan, ImportReport},
  rate::RateSnapshot,
  service::{NewService, Service},
  store::DashboardStore,
  subscription::{NewSubscription, Subscription},
};

use crate::{
  encode::{
    RawService, RawSubscription, SERVICE_COLUMNS, SUBSCRIPTION_COLUMNS, ServiceParams,
    SubscriptionParams, decode_rate, encode_rate, encode_uuid,
  },
  schema::{RATE_KEY, SCHEMA},
  Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An aidash store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── DashboardStore impl ─────────────────────────────────────────────────────

impl DashboardStore for SqliteStore {
  type Error = crate::Error;

  // ── Services ──────────────────────────────────────────────────────────────

  async fn list_services(&self) -> Result<Vec<Service>> {
    let raws: Vec<RawService> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {SERVICE_COLUMNS} FROM services ORDER BY rowid"))?;
        let rows = stmt
          .query_map([], RawService::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut services = raws
      .into_iter()
      .map(RawService::into_service)
      .collect::<Result<Vec<_>>>()?;
    // Stable, so insertion order survives within a category.
    services.sort_by_key(|s| s.category);
    Ok(services)
  }

  async fn add_service(&self, input: NewService) -> Result<Service> {
    let service = input.validate()?.into_service(Uuid::new_v4(), Utc::now());
    let params = ServiceParams::new(&service);

    self
      .conn
      .call(move |conn| {
        params.insert(conn)?;
        Ok(())
      })
      .await?;

    tracing::debug!(service_id = %service.service_id, name = %service.name, "added service");
    Ok(service)
  }

  async fn delete_service(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM services WHERE service_id = ?1", rusqlite::params![id_str])?)
      })
      .await?;
    Ok(deleted > 0)
  }

  // ── Subscriptions ─────────────────────────────────────────────────────────

  async fn list_subscriptions(&self) -> Result<Vec<Subscription>> {
    let raws: Vec<RawSubscription> = self
      .conn
      .call(|conn| {
        let mut stmt = conn
          .prepare(&format!("SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions ORDER BY rowid"))?;
        let rows = stmt
          .query_map([], RawSubscription::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubscription::into_subscription).collect()
  }

  async fn get_subscription(&self, id: Uuid) -> Result<Option<Subscription>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawSubscription> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE subscription_id = ?1"),
            rusqlite::params![id_str],
            RawSubscription::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSubscription::into_subscription).transpose()
  }

  async fn add_subscription(&self, input: NewSubscription) -> Result<Subscription> {
    let sub = input.validate()?.into_subscription(Uuid::new_v4(), Utc::now());
    let params = SubscriptionParams::new(&sub);

    self
      .conn
      .call(move |conn| {
        params.insert(conn)?;
        Ok(())
      })
      .await?;

    tracing::debug!(subscription_id = %sub.subscription_id, name = %sub.name, "added subscription");
    Ok(sub)
  }

  async fn update_subscription(
    &self,
    id:    Uuid,
    input: NewSubscription,
  ) -> Result<Option<Subscription>> {
    let Some(existing) = self.get_subscription(id).await? else {
      return Ok(None);
    };
    let updated = input.validate()?.into_subscription(id, existing.created_at);
    let params = SubscriptionParams::new(&updated);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE subscriptions
             SET name = ?2, price = ?3, currency = ?4, period = ?5, start_date = ?6
           WHERE subscription_id = ?1",
          rusqlite::params![
            params.subscription_id,
            params.name,
            params.price,
            params.currency,
            params.period,
            params.start_date,
          ],
        )?)
      })
      .await?;

    Ok((changed > 0).then_some(updated))
  }

  async fn delete_subscription(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM subscriptions WHERE subscription_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;
    Ok(deleted > 0)
  }

  // ── Exchange rate ─────────────────────────────────────────────────────────

  async fn load_rate(&self) -> Result<Option<RateSnapshot>> {
    let value: Option<String> = self
      .conn
      .call(|conn| {
        Ok(conn
          .query_row(
            "SELECT value FROM settings WHERE key = ?1",
            rusqlite::params![RATE_KEY],
            |r| r.get(0),
          )
          .optional()?)
      })
      .await?;

    match value.as_deref().map(decode_rate).transpose() {
      Ok(snapshot) => Ok(snapshot),
      // A corrupt cache entry behaves like an empty cache.
      Err(e) => {
        tracing::warn!(error = %e, "ignoring unreadable cached exchange rate");
        Ok(None)
      }
    }
  }

  async fn save_rate(&self, snapshot: RateSnapshot) -> Result<()> {
    let value = encode_rate(&snapshot)?;
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO settings (key, value) VALUES (?1, ?2)
           ON CONFLICT(key) DO UPDATE SET value = excluded.value",
          rusqlite::params![RATE_KEY, value],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Bulk ──────────────────────────────────────────────────────────────────

  async fn replace_all(&self, plan: ImportPlan) -> Result<ImportReport> {
    let report = plan.report();
    let now = Utc::now();

    let services: Vec<ServiceParams> = plan
      .services
      .into_iter()
      .map(|s| ServiceParams::new(&s.into_service(Uuid::new_v4(), now)))
      .collect();
    let subscriptions: Vec<SubscriptionParams> = plan
      .subscriptions
      .into_iter()
      .map(|s| SubscriptionParams::new(&s.into_subscription(Uuid::new_v4(), now)))
      .collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM services", [])?;
        tx.execute("DELETE FROM subscriptions", [])?;
        for s in &services {
          s.insert(&tx)?;
        }
        for s in &subscriptions {
          s.insert(&tx)?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::info!(
      services = report.services,
      subscriptions = report.subscriptions,
      skipped = report.skipped.len(),
      "replaced dashboard contents from backup"
    );
    Ok(report)
  }
}
