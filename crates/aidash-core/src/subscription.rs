//! Subscription records: the input to the renewal and cost calculators.
//!
//! Records are owned by the store. The calculators only read them and never
//! keep references across calls.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Enums ───────────────────────────────────────────────────────────────────

/// The currency a subscription is billed in.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
  EnumIter,
  IntoStaticStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Currency {
  /// Records written before currencies existed were always in dollars.
  #[default]
  Usd,
  Krw,
}

impl Currency {
  pub fn symbol(self) -> &'static str {
    match self {
      Self::Usd => "$",
      Self::Krw => "₩",
    }
  }

  /// Parse a currency at an input boundary.
  pub fn parse(s: &str) -> Result<Self> {
    s.trim()
      .parse()
      .map_err(|_| Error::UnknownCurrency(s.to_owned()))
  }
}

/// Billing cadence.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
  EnumIter,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Period {
  Monthly,
  Yearly,
}

impl Period {
  /// Number of calendar months in one billing period.
  pub fn months(self) -> u32 {
    match self {
      Self::Monthly => 1,
      Self::Yearly => 12,
    }
  }

  /// Parse a period at an input boundary.
  pub fn parse(s: &str) -> Result<Self> {
    s.trim()
      .parse()
      .map_err(|_| Error::UnknownPeriod(s.to_owned()))
  }
}

// ─── Subscription ────────────────────────────────────────────────────────────

/// A recurring subscription as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
  pub subscription_id: Uuid,
  pub name:            String,
  /// Always positive; denominated in `currency`.
  pub price:           f64,
  #[serde(default)]
  pub currency:        Currency,
  pub period:          Period,
  /// Older exports call this field `renewalDate`.
  #[serde(default, alias = "renewalDate")]
  pub start_date:      Option<NaiveDate>,
  pub created_at:      DateTime<Utc>,
}

// ─── NewSubscription ─────────────────────────────────────────────────────────

/// Input for adding or editing a subscription. `subscription_id` and
/// `created_at` are assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubscription {
  pub name:       String,
  pub price:      f64,
  #[serde(default)]
  pub currency:   Currency,
  pub period:     Period,
  #[serde(default)]
  pub start_date: Option<NaiveDate>,
}

impl NewSubscription {
  /// Check the record invariants and return a normalised copy (trimmed name).
  ///
  /// A missing start date is allowed here; it only disables renewal
  /// tracking. Use [`Self::validate_entry`] for interactive input.
  pub fn validate(self) -> Result<Self> {
    let name = self.name.trim().to_owned();
    if name.is_empty() {
      return Err(Error::EmptyName);
    }
    if !self.price.is_finite() || self.price <= 0.0 {
      return Err(Error::InvalidPrice(self.price));
    }
    Ok(Self { name, ..self })
  }

  /// [`Self::validate`], and additionally require a start date.
  pub fn validate_entry(self) -> Result<Self> {
    let checked = self.validate()?;
    if checked.start_date.is_none() {
      return Err(Error::MissingStartDate);
    }
    Ok(checked)
  }

  /// Materialise into a stored record.
  pub fn into_subscription(
    self,
    subscription_id: Uuid,
    created_at: DateTime<Utc>,
  ) -> Subscription {
    Subscription {
      subscription_id,
      name: self.name,
      price: self.price,
      currency: self.currency,
      period: self.period,
      start_date: self.start_date,
      created_at,
    }
  }
}
