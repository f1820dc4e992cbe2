//! Error type for the live exchange-rate client.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("rate request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("rate service answered {0}")]
  Status(reqwest::StatusCode),

  #[error("rate response has no {0} entry")]
  MissingCurrency(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
