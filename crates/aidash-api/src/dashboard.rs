//! Handler for `GET /dashboard`, the full read model.

use aidash_core::{
  dashboard::{DashboardSnapshot, build_snapshot},
  rate::RateSource,
  store::{DashboardStore, current_rate},
};
use axum::{
  Json,
  extract::{Query, State},
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::{ApiState, error::ApiError, today_or};

#[derive(Debug, Default, Deserialize)]
pub struct DashboardParams {
  /// Evaluate renewals as of this date instead of today.
  pub today: Option<NaiveDate>,
}

/// `GET /dashboard[?today=YYYY-MM-DD]`
pub async fn handler<S, R>(
  State(state): State<ApiState<S, R>>,
  Query(params): Query<DashboardParams>,
) -> Result<Json<DashboardSnapshot>, ApiError>
where
  S: DashboardStore,
  R: RateSource,
{
  let subs = state
    .store
    .list_subscriptions()
    .await
    .map_err(ApiError::store)?;
  let rate = current_rate(state.store.as_ref()).await.map_err(ApiError::store)?;
  Ok(Json(build_snapshot(&subs, rate, today_or(params.today))))
}
