//! Users and what they own (alerts, saved searches), plus the job audit log

use super::crud;
use crate::AppState;
use athena_common::{
    auth::{AuthContext, SCOPE_ADMIN, SCOPE_WRITE},
    errors::Result,
};
use athena_core::db::models::{Alert, SavedSearch, SyncLog, User};
use athena_core::services::user::{CreateUser, UpdateUser};
use athena_core::services::{AlertService, CrudService, SavedSearchService, SyncLogService, UserService};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

const DEFAULT_RECENT_LIMIT: u64 = 10;

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    #[serde(default = "default_recent_limit")]
    pub limit: u64,
}

fn default_recent_limit() -> u64 {
    DEFAULT_RECENT_LIMIT
}

#[derive(Debug, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

/// Registration is public; deleting needs `admin`
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(crud::list::<UserService>).post(register))
        .route(
            "/{id}",
            get(crud::get_one::<UserService>).put(update_user).delete(delete_user),
        )
        .route("/email/{email}", get(user_by_email))
        .route("/username/{username}", get(user_by_username))
}

pub fn alert_routes() -> Router<AppState> {
    crud::routes::<AlertService>()
        .route("/user/{id}", get(alerts_for_user))
        .route("/user/{id}/active", get(active_alerts_for_user))
        .route("/type/{alert_type}", get(alerts_by_type))
        .route("/{id}/trigger", post(trigger_alert))
}

pub fn saved_search_routes() -> Router<AppState> {
    crud::routes::<SavedSearchService>()
        .route("/user/{id}", get(searches_for_user))
        .route("/user/{id}/active", get(active_searches_for_user))
        .route("/{id}/execute", post(execute_search))
}

pub fn sync_log_routes() -> Router<AppState> {
    crud::routes::<SyncLogService>()
        .route("/status/{status}", get(logs_by_status))
        .route("/sync-type/{sync_type}", get(logs_by_type))
        .route("/date-range", get(logs_in_range))
        .route("/recent", get(recent_logs))
        .route("/failed", get(failed_logs))
}

async fn register(
    State(service): State<UserService>,
    Json(mut request): Json<CreateUser>,
) -> Result<(StatusCode, Json<User>)> {
    // Admins are promoted by other admins, never at sign-up
    request.is_admin = None;
    let user = service.create(request).await?;
    info!(user_id = %user.id, "User registered");
    Ok((StatusCode::CREATED, Json(user)))
}

async fn update_user(
    State(service): State<UserService>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateUser>,
) -> Result<Json<User>> {
    auth.require_scope(SCOPE_WRITE)?;
    if auth.user_id != id || request.is_admin.is_some() || request.is_active.is_some() {
        auth.require_scope(SCOPE_ADMIN)?;
    }
    Ok(Json(service.update(id, request).await?))
}

async fn delete_user(State(service): State<UserService>, auth: AuthContext, Path(id): Path<Uuid>) -> Result<StatusCode> {
    auth.require_scope(SCOPE_ADMIN)?;
    service.delete(id).await?;
    info!(user_id = %id, deleted_by = %auth.user_id, "User deactivated");
    Ok(StatusCode::NO_CONTENT)
}

async fn user_by_email(
    State(service): State<UserService>,
    _auth: AuthContext,
    Path(email): Path<String>,
) -> Result<Json<User>> {
    Ok(Json(service.find_by_email(&email).await?))
}

async fn user_by_username(
    State(service): State<UserService>,
    _auth: AuthContext,
    Path(username): Path<String>,
) -> Result<Json<User>> {
    Ok(Json(service.find_by_username(&username).await?))
}

async fn alerts_for_user(
    State(service): State<AlertService>,
    _auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Alert>>> {
    Ok(Json(service.find_by_user(id).await?))
}

async fn active_alerts_for_user(
    State(service): State<AlertService>,
    _auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Alert>>> {
    Ok(Json(service.find_active_by_user(id).await?))
}

async fn alerts_by_type(
    State(service): State<AlertService>,
    _auth: AuthContext,
    Path(alert_type): Path<String>,
) -> Result<Json<Vec<Alert>>> {
    Ok(Json(service.find_by_type(&alert_type).await?))
}

async fn trigger_alert(State(service): State<AlertService>, auth: AuthContext, Path(id): Path<Uuid>) -> Result<StatusCode> {
    auth.require_scope(SCOPE_WRITE)?;
    service.record_trigger(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn searches_for_user(
    State(service): State<SavedSearchService>,
    _auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<SavedSearch>>> {
    Ok(Json(service.find_by_user(id).await?))
}

async fn active_searches_for_user(
    State(service): State<SavedSearchService>,
    _auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<SavedSearch>>> {
    Ok(Json(service.find_active_by_user(id).await?))
}

async fn execute_search(
    State(service): State<SavedSearchService>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    auth.require_scope(SCOPE_WRITE)?;
    service.record_execution(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn logs_by_status(
    State(service): State<SyncLogService>,
    _auth: AuthContext,
    Path(status): Path<String>,
) -> Result<Json<Vec<SyncLog>>> {
    Ok(Json(service.find_by_status(&status).await?))
}

async fn logs_by_type(
    State(service): State<SyncLogService>,
    _auth: AuthContext,
    Path(sync_type): Path<String>,
) -> Result<Json<Vec<SyncLog>>> {
    Ok(Json(service.find_by_sync_type(&sync_type).await?))
}

async fn logs_in_range(
    State(service): State<SyncLogService>,
    _auth: AuthContext,
    Query(range): Query<TimeRange>,
) -> Result<Json<Vec<SyncLog>>> {
    Ok(Json(service.find_by_started_between(range.start, range.end).await?))
}

async fn recent_logs(
    State(service): State<SyncLogService>,
    _auth: AuthContext,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<SyncLog>>> {
    Ok(Json(service.find_recent(query.limit).await?))
}

async fn failed_logs(State(service): State<SyncLogService>, _auth: AuthContext) -> Result<Json<Vec<SyncLog>>> {
    Ok(Json(service.find_failed().await?))
}
