//! The JSON backup document used for export and import.
//!
//! Export writes everything. Import is lenient per record: a bad entry is
//! skipped and reported, the rest of the document still loads. Only a
//! document without a `services` or `subscriptions` section is rejected
//! outright.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
  Error, Result,
  service::{Category, NewService, Service},
  subscription::{Currency, NewSubscription, Period, Subscription},
};

// ─── Document ────────────────────────────────────────────────────────────────

/// A bookmark as written to a backup; ids are not preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceEntry {
  pub name: String,
  pub url:  String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
  pub services:      BTreeMap<Category, Vec<ServiceEntry>>,
  pub subscriptions: Vec<NewSubscription>,
  pub export_date:   DateTime<Utc>,
}

impl BackupDocument {
  pub fn new(services: &[Service], subscriptions: &[Subscription], now: DateTime<Utc>) -> Self {
    let mut grouped: BTreeMap<Category, Vec<ServiceEntry>> = BTreeMap::new();
    for s in services {
      grouped.entry(s.category).or_default().push(ServiceEntry {
        name: s.name.clone(),
        url:  s.url.clone(),
      });
    }

    let subscriptions = subscriptions
      .iter()
      .map(|s| NewSubscription {
        name:       s.name.clone(),
        price:      s.price,
        currency:   s.currency,
        period:     s.period,
        start_date: s.start_date,
      })
      .collect();

    Self { services: grouped, subscriptions, export_date: now }
  }

  pub fn to_json_pretty(&self) -> Result<String> { Ok(serde_json::to_string_pretty(self)?) }
}

/// `ai-dashboard-backup-2024-06-01.json`
pub fn backup_file_name(date: NaiveDate) -> String {
  format!("ai-dashboard-backup-{}.json", date.format("%Y-%m-%d"))
}

// ─── Import ──────────────────────────────────────────────────────────────────

/// A record left out of an import, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRecord {
  /// `"services.<category>[i]"` or `"subscriptions[i]"`.
  pub location: String,
  pub reason:   String,
}

/// The validated content of a backup, ready to replace the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportPlan {
  pub services:      Vec<NewService>,
  pub subscriptions: Vec<NewSubscription>,
  pub skipped:       Vec<SkippedRecord>,
}

/// What an import did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
  pub services:      usize,
  pub subscriptions: usize,
  pub skipped:       Vec<SkippedRecord>,
}

impl ImportPlan {
  pub fn report(&self) -> ImportReport {
    ImportReport {
      services:      self.services.len(),
      subscriptions: self.subscriptions.len(),
      skipped:       self.skipped.clone(),
    }
  }
}

/// Parse and validate a backup document.
pub fn parse_backup(json: &str) -> Result<ImportPlan> {
  let doc: Value = serde_json::from_str(json)?;
  let services = doc
    .get("services")
    .filter(|v| !v.is_null())
    .ok_or(Error::IncompleteBackup("services"))?;
  let subscriptions = doc
    .get("subscriptions")
    .filter(|v| !v.is_null())
    .ok_or(Error::IncompleteBackup("subscriptions"))?;

  let mut plan = ImportPlan::default();
  collect_services(services, &mut plan);
  collect_subscriptions(subscriptions, &mut plan);

  if !plan.skipped.is_empty() {
    tracing::warn!(skipped = plan.skipped.len(), "backup contained invalid records");
  }
  Ok(plan)
}

fn skip(plan: &mut ImportPlan, location: String, reason: impl ToString) {
  plan.skipped.push(SkippedRecord { location, reason: reason.to_string() });
}

fn collect_services(section: &Value, plan: &mut ImportPlan) {
  let Some(by_category) = section.as_object() else {
    skip(plan, "services".into(), "expected an object keyed by category");
    return;
  };

  for (key, entries) in by_category {
    let category = match Category::parse(key) {
      Ok(c) => c,
      Err(e) => {
        skip(plan, format!("services.{key}"), e);
        continue;
      }
    };
    let Some(entries) = entries.as_array() else {
      skip(plan, format!("services.{key}"), "expected a list");
      continue;
    };

    for (i, entry) in entries.iter().enumerate() {
      let location = format!("services.{key}[{i}]");
      let parsed = serde_json::from_value::<ServiceEntry>(entry.clone())
        .map_err(Error::from)
        .and_then(|e| NewService::new(e.name, e.url, category).validate());
      match parsed {
        Ok(s) => plan.services.push(s),
        Err(e) => skip(plan, location, e),
      }
    }
  }
}

/// A subscription as found in a backup, before legacy fields are resolved.
/// Records edited by older versions can carry both `startDate` and
/// `renewalDate`; the former wins. A `null` currency means dollars.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSubscription {
  name:         String,
  price:        f64,
  #[serde(default)]
  currency:     Option<Currency>,
  period:       Period,
  #[serde(default)]
  start_date:   Option<NaiveDate>,
  #[serde(default)]
  renewal_date: Option<NaiveDate>,
}

impl From<RawSubscription> for NewSubscription {
  fn from(raw: RawSubscription) -> Self {
    Self {
      name:       raw.name,
      price:      raw.price,
      currency:   raw.currency.unwrap_or_default(),
      period:     raw.period,
      start_date: raw.start_date.or(raw.renewal_date),
    }
  }
}

fn collect_subscriptions(section: &Value, plan: &mut ImportPlan) {
  let Some(records) = section.as_array() else {
    skip(plan, "subscriptions".into(), "expected a list");
    return;
  };

  for (i, record) in records.iter().enumerate() {
    let parsed = serde_json::from_value::<RawSubscription>(record.clone())
      .map_err(Error::from)
      .and_then(|raw| NewSubscription::from(raw).validate());
    match parsed {
      Ok(s) => plan.subscriptions.push(s),
      Err(e) => skip(plan, format!("subscriptions[{i}]"), e),
    }
  }
}
