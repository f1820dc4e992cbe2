//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, calendar dates are `YYYY-MM-DD`, UUIDs
//! are hyphenated lowercase strings, and enums use their wire names.

use aidash_core::{
  rate::RateSnapshot,
  service::{Category, Service},
  subscription::{Currency, Period, Subscription},
};
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Rate snapshot ───────────────────────────────────────────────────────────

pub fn encode_rate(snapshot: &RateSnapshot) -> Result<String> {
  Ok(serde_json::to_string(snapshot)?)
}

pub fn decode_rate(s: &str) -> Result<RateSnapshot> { Ok(serde_json::from_str(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `services` row.
pub struct RawService {
  pub service_id: String,
  pub name:       String,
  pub url:        String,
  pub category:   String,
  pub created_at: String,
}

impl RawService {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      service_id: row.get(0)?,
      name:       row.get(1)?,
      url:        row.get(2)?,
      category:   row.get(3)?,
      created_at: row.get(4)?,
    })
  }

  pub fn into_service(self) -> Result<Service> {
    Ok(Service {
      service_id: decode_uuid(&self.service_id)?,
      name:       self.name,
      url:        self.url,
      category:   Category::parse(&self.category)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const SERVICE_COLUMNS: &str = "service_id, name, url, category, created_at";

/// Raw values read directly from a `subscriptions` row.
pub struct RawSubscription {
  pub subscription_id: String,
  pub name:            String,
  pub price:           f64,
  pub currency:        String,
  pub period:          String,
  pub start_date:      Option<String>,
  pub created_at:      String,
}

impl RawSubscription {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      subscription_id: row.get(0)?,
      name:            row.get(1)?,
      price:           row.get(2)?,
      currency:        row.get(3)?,
      period:          row.get(4)?,
      start_date:      row.get(5)?,
      created_at:      row.get(6)?,
    })
  }

  pub fn into_subscription(self) -> Result<Subscription> {
    Ok(Subscription {
      subscription_id: decode_uuid(&self.subscription_id)?,
      name:            self.name,
      price:           self.price,
      currency:        Currency::parse(&self.currency)?,
      period:          Period::parse(&self.period)?,
      start_date:      self.start_date.as_deref().map(decode_date).transpose()?,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}

pub const SUBSCRIPTION_COLUMNS: &str =
  "subscription_id, name, price, currency, period, start_date, created_at";

/// Owned column values for a `subscriptions` INSERT, ready to move into a
/// `conn.call` closure.
pub struct SubscriptionParams {
  pub subscription_id: String,
  pub name:            String,
  pub price:           f64,
  pub currency:        &'static str,
  pub period:          &'static str,
  pub start_date:      Option<String>,
  pub created_at:      String,
}

impl SubscriptionParams {
  pub fn new(sub: &Subscription) -> Self {
    Self {
      subscription_id: encode_uuid(sub.subscription_id),
      name:            sub.name.clone(),
      price:           sub.price,
      currency:        sub.currency.into(),
      period:          sub.period.into(),
      start_date:      sub.start_date.map(encode_date),
      created_at:      encode_dt(sub.created_at),
    }
  }

  pub fn insert(&self, conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.execute(
      &format!(
        "INSERT INTO subscriptions ({SUBSCRIPTION_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
      ),
      rusqlite::params![
        self.subscription_id,
        self.name,
        self.price,
        self.currency,
        self.period,
        self.start_date,
        self.created_at,
      ],
    )?;
    Ok(())
  }
}

/// Owned column values for a `services` INSERT.
pub struct ServiceParams {
  pub service_id: String,
  pub name:       String,
  pub url:        String,
  pub category:   &'static str,
  pub created_at: String,
}

impl ServiceParams {
  pub fn new(service: &Service) -> Self {
    Self {
      service_id: encode_uuid(service.service_id),
      name:       service.name.clone(),
      url:        service.url.clone(),
      category:   service.category.into(),
      created_at: encode_dt(service.created_at),
    }
  }

  pub fn insert(&self, conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.execute(
      &format!("INSERT INTO services ({SERVICE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)"),
      rusqlite::params![
        self.service_id,
        self.name,
        self.url,
        self.category,
        self.created_at,
      ],
    )?;
    Ok(())
  }
}
