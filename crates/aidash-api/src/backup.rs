//! Handlers for backup export and import.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/export` | Pretty JSON download named `ai-dashboard-backup-<date>.json` |
//! | `POST` | `/import` | Body: a backup document; replaces all services and subscriptions |

use aidash_core::{
  backup::{BackupDocument, ImportReport, backup_file_name, parse_backup},
  rate::RateSource,
  store::DashboardStore,
};
use axum::{
  Json,
  extract::State,
  http::header,
  response::IntoResponse,
};
use chrono::Utc;

use crate::{ApiState, error::ApiError};

/// `GET /export`
pub async fn export<S, R>(
  State(state): State<ApiState<S, R>>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DashboardStore,
  R: RateSource,
{
  let services = state.store.list_services().await.map_err(ApiError::store)?;
  let subs = state
    .store
    .list_subscriptions()
    .await
    .map_err(ApiError::store)?;

  let now = Utc::now();
  let body = BackupDocument::new(&services, &subs, now)
    .to_json_pretty()
    .map_err(ApiError::store)?;
  let disposition = format!(
    "attachment; filename=\"{}\"",
    backup_file_name(now.date_naive())
  );

  Ok((
    [
      (header::CONTENT_TYPE, "application/json".to_owned()),
      (header::CONTENT_DISPOSITION, disposition),
    ],
    body,
  ))
}

/// `POST /import`
///
/// The body is taken as raw text so that malformed records can be skipped
/// individually instead of failing the whole request.
pub async fn import<S, R>(
  State(state): State<ApiState<S, R>>,
  body: String,
) -> Result<Json<ImportReport>, ApiError>
where
  S: DashboardStore,
  R: RateSource,
{
  let plan = parse_backup(&body)?;
  let report = state.store.replace_all(plan).await.map_err(ApiError::store)?;
  Ok(Json(report))
}
