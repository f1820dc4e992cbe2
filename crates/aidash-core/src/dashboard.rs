//! The read model consumed by every presentation layer.
//!
//! A [`DashboardSnapshot`] is never stored. It is rebuilt from the current
//! subscriptions, rate and date whenever something changes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  cost::{self, CostBreakdown, DualAmount},
  rate::RateSnapshot,
  renewal::{self, RenewalStatus},
  subscription::{Currency, Period, Subscription},
};

// ─── Rows ────────────────────────────────────────────────────────────────────

/// One line of the subscriptions table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRow {
  pub subscription_id: Uuid,
  pub name:            String,
  pub currency:        Currency,
  pub period:          Period,
  pub start_date:      Option<NaiveDate>,
  /// The billed price in both currencies, before cadence normalisation.
  pub price:           DualAmount,
  pub next_renewal:    Option<NaiveDate>,
  pub status:          RenewalStatus,
  pub status_label:    String,
  pub cost:            CostBreakdown,
}

impl SubscriptionRow {
  pub fn build(sub: &Subscription, snapshot: &RateSnapshot, today: NaiveDate) -> Self {
    let (next_renewal, status) = renewal::project(sub, today);
    Self {
      subscription_id: sub.subscription_id,
      name: sub.name.clone(),
      currency: sub.currency,
      period: sub.period,
      start_date: sub.start_date,
      price: cost::convert(sub.price, sub.currency, snapshot.rate),
      next_renewal,
      status,
      status_label: status.label(),
      cost: cost::normalize(sub, snapshot.rate),
    }
  }
}

/// A subscription's slice of the monthly spend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostShare {
  pub subscription_id: Uuid,
  pub name:            String,
  pub monthly_usd:     f64,
  /// In `0.0..=1.0`; all zero when the total spend is zero.
  pub fraction:        f64,
}

// ─── Snapshot ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
  pub as_of:  NaiveDate,
  pub rate:   RateSnapshot,
  pub rows:   Vec<SubscriptionRow>,
  pub totals: CostBreakdown,
  pub shares: Vec<CostShare>,
}

/// Build the full read model. Rows keep the order of `subs`.
pub fn build_snapshot(
  subs: &[Subscription],
  rate: RateSnapshot,
  today: NaiveDate,
) -> DashboardSnapshot {
  let rows: Vec<SubscriptionRow> = subs
    .iter()
    .map(|s| SubscriptionRow::build(s, &rate, today))
    .collect();

  let totals = cost::aggregate(subs, rate.rate);
  let shares = cost_shares(&rows, totals.monthly_usd);

  DashboardSnapshot { as_of: today, rate, rows, totals, shares }
}

fn cost_shares(rows: &[SubscriptionRow], total_monthly_usd: f64) -> Vec<CostShare> {
  rows
    .iter()
    .map(|row| CostShare {
      subscription_id: row.subscription_id,
      name:            row.name.clone(),
      monthly_usd:     row.cost.monthly_usd,
      fraction:        if total_monthly_usd > 0.0 {
        row.cost.monthly_usd / total_monthly_usd
      } else {
        0.0
      },
    })
    .collect()
}

// ─── Formatting ──────────────────────────────────────────────────────────────

/// Insert `,` every three digits of a non-negative integer string.
fn group_thousands(digits: &str) -> String {
  let mut out = String::with_capacity(digits.len() + digits.len() / 3);
  for (i, ch) in digits.chars().enumerate() {
    if i > 0 && (digits.len() - i) % 3 == 0 {
      out.push(',');
    }
    out.push(ch);
  }
  out
}

/// `$1,234.50`
pub fn format_usd(amount: f64) -> String {
  let fixed = format!("{:.2}", amount.abs());
  let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
  let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
  format!("{sign}{}{}.{frac}", Currency::Usd.symbol(), group_thousands(whole))
}

/// `₩13,000`, rounded to the nearest won.
pub fn format_krw(amount: f64) -> String {
  let rounded = amount.round();
  let sign = if rounded < 0.0 { "-" } else { "" };
  let whole = format!("{:.0}", rounded.abs());
  format!("{sign}{}{}", Currency::Krw.symbol(), group_thousands(&whole))
}

/// Format an amount in its own currency.
pub fn format_amount(amount: f64, currency: Currency) -> String {
  match currency {
    Currency::Usd => format_usd(amount),
    Currency::Krw => format_krw(amount),
  }
}
