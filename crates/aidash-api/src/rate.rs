//! Handlers for `/rate` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/rate` | The rate the dashboard currently uses |
//! | `POST` | `/rate/refresh` | Fetch a fresh rate, falling back to the cached one |

use aidash_core::{
  rate::{RateSnapshot, RateSource},
  store::{DashboardStore, current_rate, refresh_rate},
};
use axum::{Json, extract::State};

use crate::{ApiState, error::ApiError};

/// `GET /rate`
pub async fn current<S, R>(
  State(state): State<ApiState<S, R>>,
) -> Result<Json<RateSnapshot>, ApiError>
where
  S: DashboardStore,
  R: RateSource,
{
  let snapshot = current_rate(state.store.as_ref()).await.map_err(ApiError::store)?;
  Ok(Json(snapshot))
}

/// `POST /rate/refresh`
pub async fn refresh<S, R>(
  State(state): State<ApiState<S, R>>,
) -> Result<Json<RateSnapshot>, ApiError>
where
  S: DashboardStore,
  R: RateSource,
{
  let snapshot = refresh_rate(state.store.as_ref(), state.rates.as_ref())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(snapshot))
}

#[cfg(test)]
mod tests {
  use crate::test_support::{Offline, app, fixed, send, store};

  #[tokio::test]
  async fn refresh_persists_live_rate() {
    let store = store().await;

    let (_, before) = send(app(store.clone(), fixed(1385.5)), "GET", "/rate", None).await;
    assert_eq!(before["origin"], "default");
    assert!(before["updated_at"].is_null());

    let (status, live) = send(app(store.clone(), fixed(1385.5)), "POST", "/rate/refresh", None).await;
    assert_eq!(status, 200);
    assert_eq!(live["origin"], "live");
    assert_eq!(live["rate"], 1385.5);

    let (_, after) = send(app(store, fixed(1385.5)), "GET", "/rate", None).await;
    assert_eq!(after["rate"], 1385.5);
    assert_eq!(after["updated_at"], live["updated_at"]);
  }

  #[tokio::test]
  async fn failed_refresh_falls_back_to_cache_then_default() {
    let store = store().await;

    let (_, first) = send(app(store.clone(), Offline), "POST", "/rate/refresh", None).await;
    assert_eq!(first["origin"], "default");
    assert_eq!(first["rate"], 1300.0);

    send(app(store.clone(), fixed(1400.0)), "POST", "/rate/refresh", None).await;
    let (_, second) = send(app(store, Offline), "POST", "/rate/refresh", None).await;
    assert_eq!(second["origin"], "cached");
    assert_eq!(second["rate"], 1400.0);
  }

  #[tokio::test]
  async fn unusable_live_value_is_ignored() {
    let (_, snap) = send(app(store().await, fixed(-5.0)), "POST", "/rate/refresh", None).await;
    assert_eq!(snap["origin"], "default");
  }
}
