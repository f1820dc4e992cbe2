//! Handlers for `/subscriptions` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/subscriptions` | Insertion order |
//! | `POST`   | `/subscriptions` | Body: [`NewSubscription`]; returns 201 + stored record |
//! | `GET`    | `/subscriptions/:id` | 404 if not found |
//! | `PUT`    | `/subscriptions/:id` | Body: [`NewSubscription`]; full replace |
//! | `DELETE` | `/subscriptions/:id` | 204, or 404 if not found |
//!
//! New and edited subscriptions must carry a start date; records without one
//! only arrive through backup import.

use aidash_core::{
  Error as CoreError,
  rate::RateSource,
  store::DashboardStore,
  subscription::{NewSubscription, Subscription},
};
use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

fn not_found(id: Uuid) -> ApiError {
  ApiError::NotFound(CoreError::SubscriptionNotFound(id).to_string())
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /subscriptions`
pub async fn list<S, R>(
  State(state): State<ApiState<S, R>>,
) -> Result<Json<Vec<Subscription>>, ApiError>
where
  S: DashboardStore,
  R: RateSource,
{
  let subs = state
    .store
    .list_subscriptions()
    .await
    .map_err(ApiError::store)?;
  Ok(Json(subs))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /subscriptions`
pub async fn create<S, R>(
  State(state): State<ApiState<S, R>>,
  Json(body): Json<NewSubscription>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DashboardStore,
  R: RateSource,
{
  let input = body.validate_entry()?;
  let sub = state
    .store
    .add_subscription(input)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(sub)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /subscriptions/:id`
pub async fn get_one<S, R>(
  State(state): State<ApiState<S, R>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Subscription>, ApiError>
where
  S: DashboardStore,
  R: RateSource,
{
  let sub = state
    .store
    .get_subscription(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_found(id))?;
  Ok(Json(sub))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /subscriptions/:id`
pub async fn update_one<S, R>(
  State(state): State<ApiState<S, R>>,
  Path(id): Path<Uuid>,
  Json(body): Json<NewSubscription>,
) -> Result<Json<Subscription>, ApiError>
where
  S: DashboardStore,
  R: RateSource,
{
  let input = body.validate_entry()?;
  let sub = state
    .store
    .update_subscription(id, input)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_found(id))?;
  Ok(Json(sub))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /subscriptions/:id`
pub async fn delete_one<S, R>(
  State(state): State<ApiState<S, R>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: DashboardStore,
  R: RateSource,
{
  let deleted = state
    .store
    .delete_subscription(id)
    .await
    .map_err(ApiError::store)?;
  if !deleted {
    return Err(not_found(id));
  }
  Ok(StatusCode::NO_CONTENT)
}
