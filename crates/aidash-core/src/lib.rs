//! Core types and calculations for the aidash subscription dashboard.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! The renewal and cost modules are pure functions of their arguments; the
//! current date and exchange rate are always passed in.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod backup;
pub mod cost;
pub mod dashboard;
pub mod error;
pub mod rate;
pub mod renewal;
pub mod service;
pub mod store;
pub mod subscription;

pub use error::{Error, Result};
