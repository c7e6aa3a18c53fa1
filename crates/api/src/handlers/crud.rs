//! Uniform CRUD handlers, generic over any [`CrudService`]
//!
//! Each resource mounts these through [`routes`]; reads need a valid
//! token, mutations need the `write` scope.

use crate::AppState;
use athena_common::{
    auth::{AuthContext, SCOPE_WRITE},
    errors::Result,
    pagination::{Page, PageRequest},
};
use athena_core::services::CrudService;
use axum::{
    extract::{FromRef, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::info;
use uuid::Uuid;

/// `POST /` + `GET /` + `GET|PUT|DELETE /{id}` for `S`
pub fn routes<S>() -> Router<AppState>
where
    S: CrudService + FromRef<AppState>,
{
    Router::new()
        .route("/", get(list::<S>).post(create::<S>))
        .route("/{id}", get(get_one::<S>).put(update::<S>).delete(delete::<S>))
}

pub async fn create<S>(
    State(service): State<S>,
    auth: AuthContext,
    Json(request): Json<S::Create>,
) -> Result<(StatusCode, Json<S::Model>)>
where
    S: CrudService + FromRef<AppState>,
{
    auth.require_scope(SCOPE_WRITE)?;
    let created = service.create(request).await?;
    info!(resource = S::RESOURCE, user_id = %auth.user_id, "Created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list<S>(
    State(service): State<S>,
    _auth: AuthContext,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<S::Model>>>
where
    S: CrudService + FromRef<AppState>,
{
    Ok(Json(service.find_all(page).await?))
}

pub async fn get_one<S>(State(service): State<S>, _auth: AuthContext, Path(id): Path<Uuid>) -> Result<Json<S::Model>>
where
    S: CrudService + FromRef<AppState>,
{
    Ok(Json(service.find_by_id(id).await?))
}

pub async fn update<S>(
    State(service): State<S>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(request): Json<S::Update>,
) -> Result<Json<S::Model>>
where
    S: CrudService + FromRef<AppState>,
{
    auth.require_scope(SCOPE_WRITE)?;
    let updated = service.update(id, request).await?;
    info!(resource = S::RESOURCE, id = %id, user_id = %auth.user_id, "Updated");
    Ok(Json(updated))
}

pub async fn delete<S>(State(service): State<S>, auth: AuthContext, Path(id): Path<Uuid>) -> Result<StatusCode>
where
    S: CrudService + FromRef<AppState>,
{
    auth.require_scope(SCOPE_WRITE)?;
    service.delete(id).await?;
    info!(resource = S::RESOURCE, id = %id, user_id = %auth.user_id, "Deleted");
    Ok(StatusCode::NO_CONTENT)
}
