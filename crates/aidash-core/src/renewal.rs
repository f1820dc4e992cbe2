//! Renewal-date projection and urgency classification.
//!
//! Both functions take `today` explicitly; nothing here reads the clock, so a
//! status is always recomputed from the current date rather than cached.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::subscription::{Period, Subscription};

/// Renewals at most this many days away are imminent.
pub const WEEK_WINDOW_DAYS: i64 = 7;
/// Renewals at most this many days away are upcoming.
pub const MONTH_WINDOW_DAYS: i64 = 30;

// ─── Calendar arithmetic ─────────────────────────────────────────────────────

/// Advance `date` by `months` calendar months, keeping the day of month.
///
/// A day that does not exist in the target month spills over into the next
/// one (Jan 31 + 1 month = Mar 3 in a common year, Feb 29 + 12 months =
/// Mar 1). Returns `None` only when the result is outside chrono's range.
pub fn add_months_overflowing(date: NaiveDate, months: u32) -> Option<NaiveDate> {
  let total = date.year() as i64 * 12 + date.month0() as i64 + months as i64;
  let year = i32::try_from(total.div_euclid(12)).ok()?;
  let month = total.rem_euclid(12) as u32 + 1;
  NaiveDate::from_ymd_opt(year, month, 1)?
    .checked_add_days(Days::new(u64::from(date.day() - 1)))
}

// ─── Schedule ────────────────────────────────────────────────────────────────

/// The successive renewal dates of a subscription, starting one period after
/// `start`. Each date is derived from the previous one, so month-end spill
/// over carries forward.
#[derive(Debug, Clone)]
pub struct RenewalSchedule {
  current: Option<NaiveDate>,
  period:  Period,
}

impl RenewalSchedule {
  pub fn new(start: NaiveDate, period: Period) -> Self {
    Self { current: Some(start), period }
  }
}

impl Iterator for RenewalSchedule {
  type Item = NaiveDate;

  fn next(&mut self) -> Option<NaiveDate> {
    let next = add_months_overflowing(self.current?, self.period.months());
    self.current = next;
    next
  }
}

/// The first renewal strictly after `today`.
///
/// The start date itself is never a renewal: a subscription started in the
/// future first renews one period after it starts. Runs in time linear in
/// the number of periods elapsed since `start`.
pub fn next_renewal_date(
  start_date: Option<NaiveDate>,
  period: Period,
  today: NaiveDate,
) -> Option<NaiveDate> {
  RenewalSchedule::new(start_date?, period).find(|d| *d > today)
}

// ─── Status ──────────────────────────────────────────────────────────────────

/// How close the next renewal is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "days", rename_all = "snake_case")]
pub enum RenewalStatus {
  /// More than a month away, or not tracked at all.
  Active,
  UpcomingWithinMonth(i64),
  UpcomingWithinWeek(i64),
  Expired,
}

/// Coarse urgency, for colouring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  Normal,
  Warning,
  Critical,
}

impl RenewalStatus {
  /// Days until renewal, where the status carries a countdown.
  pub fn days(self) -> Option<i64> {
    match self {
      Self::UpcomingWithinMonth(d) | Self::UpcomingWithinWeek(d) => Some(d),
      Self::Active | Self::Expired => None,
    }
  }

  pub fn label(self) -> String {
    match self {
      Self::Active => "Active".to_owned(),
      Self::Expired => "Expired".to_owned(),
      Self::UpcomingWithinMonth(d) | Self::UpcomingWithinWeek(d) => match d {
        0 => "Renews today".to_owned(),
        1 => "Renews in 1 day".to_owned(),
        d => format!("Renews in {d} days"),
      },
    }
  }

  pub fn severity(self) -> Severity {
    match self {
      Self::Active | Self::UpcomingWithinMonth(_) => Severity::Normal,
      Self::UpcomingWithinWeek(_) => Severity::Warning,
      Self::Expired => Severity::Critical,
    }
  }
}

/// Classify a renewal relative to `today`. `None` means the subscription has
/// no start date and is reported as [`RenewalStatus::Active`].
pub fn renewal_status(next_renewal: Option<NaiveDate>, today: NaiveDate) -> RenewalStatus {
  let Some(next) = next_renewal else {
    return RenewalStatus::Active;
  };

  // Both sides are whole days, so the ceiling is the plain difference.
  let diff_days = next.signed_duration_since(today).num_days();
  match diff_days {
    d if d < 0 => RenewalStatus::Expired,
    d if d <= WEEK_WINDOW_DAYS => RenewalStatus::UpcomingWithinWeek(d),
    d if d <= MONTH_WINDOW_DAYS => RenewalStatus::UpcomingWithinMonth(d),
    _ => RenewalStatus::Active,
  }
}

/// Next renewal and its status for a stored subscription.
pub fn project(sub: &Subscription, today: NaiveDate) -> (Option<NaiveDate>, RenewalStatus) {
  let next = next_renewal_date(sub.start_date, sub.period, today);
  (next, renewal_status(next, today))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn d(y: i32, m: u32, day: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, day).unwrap() }

  // ── Calendar arithmetic ─────────────────────────────────────────────────

  #[test]
  fn month_end_spills_into_next_month() {
    assert_eq!(add_months_overflowing(d(2023, 1, 31), 1), Some(d(2023, 3, 3)));
    assert_eq!(add_months_overflowing(d(2024, 1, 31), 1), Some(d(2024, 3, 2)));
    assert_eq!(add_months_overflowing(d(2024, 3, 31), 1), Some(d(2024, 5, 1)));
    assert_eq!(add_months_overflowing(d(2024, 2, 29), 12), Some(d(2025, 3, 1)));
  }

  #[test]
  fn month_addition_crosses_year_boundary() {
    assert_eq!(add_months_overflowing(d(2024, 12, 15), 1), Some(d(2025, 1, 15)));
    assert_eq!(add_months_overflowing(d(2024, 11, 30), 3), Some(d(2025, 3, 2)));
  }

  #[test]
  fn spill_over_accumulates_across_steps() {
    let dates: Vec<_> = RenewalSchedule::new(d(2023, 1, 31), Period::Monthly).take(3).collect();
    assert_eq!(dates, vec![d(2023, 3, 3), d(2023, 4, 3), d(2023, 5, 3)]);
  }

  // ── next_renewal_date ───────────────────────────────────────────────────

  #[test]
  fn monthly_scenario() {
    let next = next_renewal_date(Some(d(2024, 1, 15)), Period::Monthly, d(2024, 3, 1));
    assert_eq!(next, Some(d(2024, 3, 15)));
  }

  #[test]
  fn yearly_scenario() {
    let next = next_renewal_date(Some(d(2024, 1, 15)), Period::Yearly, d(2025, 6, 1));
    assert_eq!(next, Some(d(2026, 1, 15)));
  }

  #[test]
  fn renewal_on_today_rolls_to_next_period() {
    let next = next_renewal_date(Some(d(2024, 1, 15)), Period::Monthly, d(2024, 3, 15));
    assert_eq!(next, Some(d(2024, 4, 15)));
  }

  #[test]
  fn start_today_or_in_future_renews_one_period_later() {
    let today = d(2024, 5, 10);
    assert_eq!(next_renewal_date(Some(today), Period::Monthly, today), Some(d(2024, 6, 10)));
    assert_eq!(
      next_renewal_date(Some(d(2024, 8, 1)), Period::Yearly, today),
      Some(d(2025, 8, 1)),
    );
  }

  #[test]
  fn missing_start_date_has_no_renewal() {
    assert_eq!(next_renewal_date(None, Period::Monthly, d(2024, 1, 1)), None);
  }

  #[test]
  fn result_is_after_today_and_previous_renewal_is_not() {
    let today = d(2025, 10, 16);
    let starts = [
      d(2019, 1, 31),
      d(2020, 2, 29),
      d(2023, 12, 31),
      d(2024, 7, 4),
      d(2025, 10, 15),
      d(2025, 10, 16),
    ];
    for start in starts {
      for period in [Period::Monthly, Period::Yearly] {
        let next = next_renewal_date(Some(start), period, today).unwrap();
        assert!(next > today, "{start} {period}: {next}");

        let previous = RenewalSchedule::new(start, period)
          .take_while(|r| *r < next)
          .last()
          .unwrap_or(start);
        assert!(previous <= today, "{start} {period}: previous {previous}");
      }
    }
  }

  #[test]
  fn next_renewal_is_idempotent() {
    let args = (Some(d(2021, 8, 31)), Period::Monthly, d(2025, 2, 28));
    let a = next_renewal_date(args.0, args.1, args.2);
    let b = next_renewal_date(args.0, args.1, args.2);
    assert_eq!(a, b);
  }

  // ── renewal_status ──────────────────────────────────────────────────────

  #[test]
  fn status_buckets() {
    let today = d(2024, 6, 1);
    let at = |days: u64| Some(today.checked_add_days(Days::new(days)).unwrap());

    assert_eq!(renewal_status(None, today), RenewalStatus::Active);
    assert_eq!(renewal_status(at(0), today), RenewalStatus::UpcomingWithinWeek(0));
    assert_eq!(renewal_status(at(3), today), RenewalStatus::UpcomingWithinWeek(3));
    assert_eq!(renewal_status(at(7), today), RenewalStatus::UpcomingWithinWeek(7));
    assert_eq!(renewal_status(at(8), today), RenewalStatus::UpcomingWithinMonth(8));
    assert_eq!(renewal_status(at(30), today), RenewalStatus::UpcomingWithinMonth(30));
    assert_eq!(renewal_status(at(31), today), RenewalStatus::Active);
  }

  #[test]
  fn past_renewal_is_expired() {
    let today = d(2024, 6, 1);
    assert_eq!(renewal_status(Some(d(2024, 5, 31)), today), RenewalStatus::Expired);
  }

  #[test]
  fn labels_and_severity() {
    assert_eq!(RenewalStatus::UpcomingWithinWeek(3).label(), "Renews in 3 days");
    assert_eq!(RenewalStatus::UpcomingWithinWeek(1).label(), "Renews in 1 day");
    assert_eq!(RenewalStatus::UpcomingWithinWeek(0).label(), "Renews today");
    assert_eq!(RenewalStatus::Expired.label(), "Expired");
    assert_eq!(RenewalStatus::UpcomingWithinWeek(2).severity(), Severity::Warning);
    assert_eq!(RenewalStatus::UpcomingWithinMonth(12).severity(), Severity::Normal);
    assert_eq!(RenewalStatus::UpcomingWithinMonth(12).days(), Some(12));
    assert_eq!(RenewalStatus::Active.days(), None);
  }

  #[test]
  fn status_serialises_with_countdown() {
    let json = serde_json::to_value(RenewalStatus::UpcomingWithinWeek(3)).unwrap();
    assert_eq!(json, serde_json::json!({ "status": "upcoming_within_week", "days": 3 }));
    let json = serde_json::to_value(RenewalStatus::Active).unwrap();
    assert_eq!(json, serde_json::json!({ "status": "active" }));
  }
}
