//! Login

use crate::AppState;
use athena_common::{
    auth::scopes_for,
    errors::Result,
    validation::{not_blank, validate_request},
};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Username or email
    #[validate(custom(function = "not_blank"))]
    pub username: String,

    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<Json<TokenResponse>> {
    validate_request(&request)?;

    let user = match state
        .services
        .users
        .authenticate(&request.username, &request.password)
        .await
    {
        Ok(user) => user,
        Err(e) => {
            warn!(login = %request.username, "Login failed");
            return Err(e);
        }
    };

    let access_token = state
        .jwt
        .generate_token(user.id, &user.username, scopes_for(user.is_admin))?;

    // Best effort
    if let Err(e) = state.services.users.record_login(user.id).await {
        warn!(user_id = %user.id, error = %e, "Failed to record login time");
    }

    info!(user_id = %user.id, "User logged in");
    Ok(Json(TokenResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt.expiration_secs(),
    }))
}
