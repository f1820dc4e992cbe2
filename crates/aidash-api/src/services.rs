//! Handlers for `/services` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/services` | All bookmarks, category order |
//! | `GET`    | `/services/search` | `?q=<term>`; grouped by category |
//! | `POST`   | `/services` | Body: `{"name":"..","url":"..","category":"agent"}` |
//! | `DELETE` | `/services/:id` | 404 if not found |

use aidash_core::{
  rate::RateSource,
  service::{Category, NewService, Service, search_services},
  store::DashboardStore,
};
use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /services`
pub async fn list<S, R>(
  State(state): State<ApiState<S, R>>,
) -> Result<Json<Vec<Service>>, ApiError>
where
  S: DashboardStore,
  R: RateSource,
{
  let services = state.store.list_services().await.map_err(ApiError::store)?;
  Ok(Json(services))
}

// ─── Search ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SearchParams {
  #[serde(default)]
  pub q: String,
}

/// One category of search results, owning its services.
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchGroup {
  pub category: Category,
  pub title:    String,
  pub services: Vec<Service>,
}

/// `GET /services/search?q=<term>`
pub async fn search<S, R>(
  State(state): State<ApiState<S, R>>,
  Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SearchGroup>>, ApiError>
where
  S: DashboardStore,
  R: RateSource,
{
  let services = state.store.list_services().await.map_err(ApiError::store)?;
  let groups = search_services(&services, &params.q)
    .into_iter()
    .map(|g| SearchGroup {
      category: g.category,
      title:    g.category.title().to_owned(),
      services: g.services.into_iter().cloned().collect(),
    })
    .collect();
  Ok(Json(groups))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /services`
pub async fn create<S, R>(
  State(state): State<ApiState<S, R>>,
  Json(body): Json<NewService>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DashboardStore,
  R: RateSource,
{
  let input = body.validate()?;
  let service = state
    .store
    .add_service(input)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(service)))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /services/:id`
pub async fn delete_one<S, R>(
  State(state): State<ApiState<S, R>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: DashboardStore,
  R: RateSource,
{
  let deleted = state.store.delete_service(id).await.map_err(ApiError::store)?;
  if !deleted {
    return Err(ApiError::NotFound(format!("service {id} not found")));
  }
  Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use crate::test_support::{app, fixed, send, store};

  #[tokio::test]
  async fn create_list_search_delete() {
    let store = store().await;

    let (status, created) = send(
      app(store.clone(), fixed(1300.0)),
      "POST",
      "/services",
      Some(json!({ "name": "Suno", "url": "https://suno.ai", "category": "music" })),
    )
    .await;
    assert_eq!(status, 201);
    let id = created["serviceId"].as_str().unwrap().to_owned();

    let (_, listed) = send(app(store.clone(), fixed(1300.0)), "GET", "/services", None).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (_, groups) =
      send(app(store.clone(), fixed(1300.0)), "GET", "/services/search?q=SUN", None).await;
    assert_eq!(groups[0]["category"], "music");
    assert_eq!(groups[0]["title"], "Music");
    assert_eq!(groups[0]["services"][0]["name"], "Suno");

    let (status, _) =
      send(app(store.clone(), fixed(1300.0)), "DELETE", &format!("/services/{id}"), None).await;
    assert_eq!(status, 204);
    let (status, body) =
      send(app(store, fixed(1300.0)), "DELETE", &format!("/services/{id}"), None).await;
    assert_eq!(status, 404);
    assert!(body["error"].as_str().unwrap().contains("not found"));
  }

  #[tokio::test]
  async fn invalid_url_is_a_bad_request() {
    let (status, body) = send(
      app(store().await, fixed(1300.0)),
      "POST",
      "/services",
      Some(json!({ "name": "x", "url": "ftp://example.com", "category": "agent" })),
    )
    .await;
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap().contains("ftp://example.com"));
  }

  #[tokio::test]
  async fn search_without_term_returns_every_group() {
    let store = store().await;
    aidash_core::store::seed_default_services(store.as_ref()).await.unwrap();
    let (_, groups) = send(app(store, fixed(1300.0)), "GET", "/services/search", None).await;
    assert_eq!(groups.as_array().unwrap().len(), 6);
  }
}
