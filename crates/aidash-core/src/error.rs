//! Error types for `aidash-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("subscription not found: {0}")]
  SubscriptionNotFound(Uuid),

  #[error("name must not be empty")]
  EmptyName,

  #[error("price must be a positive number, got {0}")]
  InvalidPrice(f64),

  #[error("a start date is required")]
  MissingStartDate,

  #[error("exchange rate must be a positive finite number, got {0}")]
  InvalidExchangeRate(f64),

  #[error("invalid service url {url:?}: {reason}")]
  InvalidUrl { url: String, reason: String },

  #[error("unknown currency: {0:?}")]
  UnknownCurrency(String),

  #[error("unknown billing period: {0:?}")]
  UnknownPeriod(String),

  #[error("unknown service category: {0:?}")]
  UnknownCategory(String),

  #[error("backup document is missing {0:?}")]
  IncompleteBackup(&'static str),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
