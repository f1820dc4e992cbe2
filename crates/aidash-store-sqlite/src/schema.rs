//! SQL schema for the aidash SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Rows are listed in `rowid` order, which is insertion order.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS services (
    service_id  TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    url         TEXT NOT NULL,
    category    TEXT NOT NULL,   -- 'agent' | 'image' | 'video' | 'tts' | 'music' | 'editing'
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS subscriptions (
    subscription_id TEXT PRIMARY KEY,
    name            TEXT NOT NULL,
    price           REAL NOT NULL CHECK (price > 0),
    currency        TEXT NOT NULL DEFAULT 'USD',   -- 'USD' | 'KRW'
    period          TEXT NOT NULL,                 -- 'monthly' | 'yearly'
    start_date      TEXT,                          -- YYYY-MM-DD or NULL
    created_at      TEXT NOT NULL
);

-- Small JSON documents keyed by name (currently only the cached rate).
CREATE TABLE IF NOT EXISTS settings (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS services_category_idx ON services(category);

PRAGMA user_version = 1;
";

/// `settings` key holding the last fetched [`aidash_core::rate::RateSnapshot`].
pub const RATE_KEY: &str = "exchange_rate";
