//! Dual-currency cost normalisation and portfolio totals.
//!
//! Nothing here rounds. Rounding is a display concern handled by
//! [`crate::dashboard::format_usd`] and [`crate::dashboard::format_krw`].

use std::{iter::Sum, ops::Add};

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  subscription::{Currency, Period, Subscription},
};

// ─── ExchangeRate ────────────────────────────────────────────────────────────

/// KRW per 1 USD. Always positive and finite.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct ExchangeRate(f64);

impl ExchangeRate {
  /// Used when no live or cached rate is available.
  pub const DEFAULT: Self = Self(1300.0);

  pub fn new(krw_per_usd: f64) -> Result<Self> {
    if krw_per_usd.is_finite() && krw_per_usd > 0.0 {
      Ok(Self(krw_per_usd))
    } else {
      Err(Error::InvalidExchangeRate(krw_per_usd))
    }
  }

  pub fn krw_per_usd(self) -> f64 { self.0 }
}

impl Default for ExchangeRate {
  fn default() -> Self { Self::DEFAULT }
}

impl TryFrom<f64> for ExchangeRate {
  type Error = Error;

  fn try_from(value: f64) -> Result<Self> { Self::new(value) }
}

impl From<ExchangeRate> for f64 {
  fn from(rate: ExchangeRate) -> f64 { rate.0 }
}

// ─── CostBreakdown ───────────────────────────────────────────────────────────

/// Monthly and yearly cost in both currencies. Used both for a single
/// subscription and for the portfolio total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
  pub monthly_usd: f64,
  pub monthly_krw: f64,
  pub yearly_usd:  f64,
  pub yearly_krw:  f64,
}

impl Add for CostBreakdown {
  type Output = Self;

  fn add(self, rhs: Self) -> Self {
    Self {
      monthly_usd: self.monthly_usd + rhs.monthly_usd,
      monthly_krw: self.monthly_krw + rhs.monthly_krw,
      yearly_usd:  self.yearly_usd + rhs.yearly_usd,
      yearly_krw:  self.yearly_krw + rhs.yearly_krw,
    }
  }
}

impl Sum for CostBreakdown {
  fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
    iter.fold(Self::default(), Add::add)
  }
}

// ─── Calculations ────────────────────────────────────────────────────────────

/// A price expressed in both currencies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DualAmount {
  pub usd: f64,
  pub krw: f64,
}

impl DualAmount {
  pub fn in_currency(self, currency: Currency) -> f64 {
    match currency {
      Currency::Usd => self.usd,
      Currency::Krw => self.krw,
    }
  }
}

/// Convert `price` (denominated in `currency`) into both currencies.
pub fn convert(price: f64, currency: Currency, rate: ExchangeRate) -> DualAmount {
  let r = rate.krw_per_usd();
  match currency {
    Currency::Usd => DualAmount { usd: price, krw: price * r },
    Currency::Krw => DualAmount { usd: price / r, krw: price },
  }
}

/// Per-subscription monthly and yearly cost in both currencies.
pub fn normalize(sub: &Subscription, rate: ExchangeRate) -> CostBreakdown {
  let base = convert(sub.price, sub.currency, rate);
  match sub.period {
    Period::Monthly => CostBreakdown {
      monthly_usd: base.usd,
      monthly_krw: base.krw,
      yearly_usd:  base.usd * 12.0,
      yearly_krw:  base.krw * 12.0,
    },
    Period::Yearly => CostBreakdown {
      monthly_usd: base.usd / 12.0,
      monthly_krw: base.krw / 12.0,
      yearly_usd:  base.usd,
      yearly_krw:  base.krw,
    },
  }
}

/// Component-wise sum of [`normalize`] over `subs`. Zero for an empty slice.
pub fn aggregate(subs: &[Subscription], rate: ExchangeRate) -> CostBreakdown {
  subs.iter().map(|s| normalize(s, rate)).sum()
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use uuid::Uuid;

  use super::*;

  const EPS: f64 = 1e-6;

  fn close(a: f64, b: f64) -> bool { (a - b).abs() <= EPS * a.abs().max(b.abs()).max(1.0) }

  fn sub(price: f64, currency: Currency, period: Period) -> Subscription {
    Subscription {
      subscription_id: Uuid::new_v4(),
      name: "test".into(),
      price,
      currency,
      period,
      start_date: None,
      created_at: Utc::now(),
    }
  }

  fn rate(r: f64) -> ExchangeRate { ExchangeRate::new(r).unwrap() }

  #[test]
  fn usd_monthly_scenario() {
    let c = normalize(&sub(10.0, Currency::Usd, Period::Monthly), rate(1300.0));
    assert!(close(c.monthly_usd, 10.0));
    assert!(close(c.monthly_krw, 13_000.0));
    assert!(close(c.yearly_usd, 120.0));
    assert!(close(c.yearly_krw, 156_000.0));
  }

  #[test]
  fn krw_yearly_scenario() {
    let c = normalize(&sub(120_000.0, Currency::Krw, Period::Yearly), rate(1200.0));
    assert!(close(c.monthly_krw, 10_000.0));
    assert!((c.monthly_usd - 8.33).abs() < 0.01);
    assert!(close(c.yearly_krw, 120_000.0));
    assert!(close(c.yearly_usd, 100.0));
  }

  #[test]
  fn currency_round_trip() {
    let r = rate(1387.25);
    for period in [Period::Monthly, Period::Yearly] {
      let a = normalize(&sub(17.5, Currency::Usd, period), r);
      let b = normalize(&sub(17.5 * 1387.25, Currency::Krw, period), r);
      assert!(close(a.monthly_krw, b.monthly_krw));
      assert!(close(a.monthly_usd, b.monthly_usd));
      assert!(close(a.yearly_krw, b.yearly_krw));
    }
  }

  #[test]
  fn empty_aggregate_is_zero() {
    assert_eq!(aggregate(&[], rate(1300.0)), CostBreakdown::default());
  }

  #[test]
  fn aggregate_is_linear() {
    let r = rate(1310.0);
    let a = sub(20.0, Currency::Usd, Period::Monthly);
    let b = sub(99_000.0, Currency::Krw, Period::Yearly);

    let both = aggregate(&[a.clone(), b.clone()], r);
    let split = aggregate(&[a], r) + aggregate(&[b], r);
    assert!(close(both.monthly_usd, split.monthly_usd));
    assert!(close(both.monthly_krw, split.monthly_krw));
    assert!(close(both.yearly_usd, split.yearly_usd));
    assert!(close(both.yearly_krw, split.yearly_krw));
  }

  #[test]
  fn totals_are_consistent_across_currency_and_cadence() {
    let r = rate(1355.5);
    let subs = vec![
      sub(20.0, Currency::Usd, Period::Monthly),
      sub(200.0, Currency::Usd, Period::Yearly),
      sub(14_900.0, Currency::Krw, Period::Monthly),
      sub(129_000.0, Currency::Krw, Period::Yearly),
    ];
    let t = aggregate(&subs, r);
    assert!(close(t.monthly_krw, t.monthly_usd * r.krw_per_usd()));
    assert!(close(t.yearly_krw, t.yearly_usd * r.krw_per_usd()));
    assert!(close(t.yearly_usd, t.monthly_usd * 12.0));
    assert!(close(t.yearly_krw, t.monthly_krw * 12.0));
  }

  #[test]
  fn invalid_rates_are_rejected() {
    for r in [0.0, -1.0, f64::NAN, f64::INFINITY] {
      assert!(matches!(ExchangeRate::new(r), Err(Error::InvalidExchangeRate(_))));
    }
    assert!(serde_json::from_str::<ExchangeRate>("0").is_err());
    assert_eq!(serde_json::from_str::<ExchangeRate>("1450.5").unwrap(), rate(1450.5));
  }

  #[test]
  fn default_rate_is_1300() {
    assert_eq!(ExchangeRate::default().krw_per_usd(), 1300.0);
  }
}
