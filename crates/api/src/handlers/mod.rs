//! API handlers module

pub mod accounts;
pub mod auth;
pub mod crud;
pub mod docs;
pub mod health;
pub mod intel;
pub mod opportunities;
pub mod reference;

use athena_common::errors::AppError;
use axum::http::Uri;

/// JSON 404 for unmatched paths
pub async fn not_found(uri: Uri) -> AppError {
    AppError::not_found("Route", uri.path())
}
