//! Authentication and authorization utilities
//!
//! Provides:
//! - JWT token generation and validation
//! - Argon2 password hashing
//! - Bearer-token extraction into an `AuthContext`

use crate::errors::{AppError, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

pub const SCOPE_READ: &str = "read";
pub const SCOPE_WRITE: &str = "write";
pub const SCOPE_ADMIN: &str = "admin";

/// Extracted authentication context available to handlers
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Authenticated user
    pub user_id: Uuid,

    pub username: String,

    /// Scopes/permissions
    pub scopes: Vec<String>,

    /// Request ID for tracing
    pub request_id: String,
}

impl AuthContext {
    /// Check if the context has a specific scope
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope || s == SCOPE_ADMIN)
    }

    /// Require a specific scope, returning error if not present
    pub fn require_scope(&self, scope: &str) -> Result<()> {
        if self.has_scope(scope) {
            Ok(())
        } else {
            Err(AppError::Forbidden {
                message: format!("Missing required scope: {}", scope),
            })
        }
    }
}

/// Scopes granted to a user at login
pub fn scopes_for(is_admin: bool) -> Vec<String> {
    let mut scopes = vec![SCOPE_READ.to_string(), SCOPE_WRITE.to_string()];
    if is_admin {
        scopes.push(SCOPE_ADMIN.to_string());
    }
    scopes
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID)
    pub sub: String,

    pub username: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    #[serde(default)]
    pub scopes: Vec<String>,
}

/// JWT token manager
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration_secs: i64,
}

impl JwtManager {
    /// Create a new JWT manager with the given secret
    pub fn new(secret: &str, expiration_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiration_secs: expiration_secs as i64,
        }
    }

    pub fn expiration_secs(&self) -> i64 {
        self.expiration_secs
    }

    /// Generate a new JWT token
    pub fn generate_token(&self, user_id: Uuid, username: &str, scopes: Vec<String>) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.expiration_secs);

        let claims = JwtClaims {
            sub: user_id.to_string(),
            username: username.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            scopes,
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| AppError::Internal {
            message: format!("Failed to generate token: {}", e),
        })
    }

    /// Validate and decode a JWT token
    pub fn validate_token(&self, token: &str) -> Result<JwtClaims> {
        decode::<JwtClaims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::ExpiredToken,
                _ => AppError::InvalidToken,
            })
    }
}

/// Hash a password into a PHC string
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal {
            message: format!("Failed to hash password: {}", e),
        })
}

/// Verify a password against a stored PHC string
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Extract token from Authorization header
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Axum extractor for AuthContext
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
    Arc<JwtManager>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let request_id = parts
            .headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized {
                message: "Missing Authorization header".to_string(),
            })?;

        let token = extract_bearer_token(auth_header).ok_or_else(|| AppError::Unauthorized {
            message: "Expected a Bearer token".to_string(),
        })?;

        let jwt = Arc::<JwtManager>::from_ref(state);
        let claims = jwt.validate_token(token)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::InvalidToken)?;

        Ok(AuthContext {
            user_id,
            username: claims.username,
            scopes: claims.scopes,
            request_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_password_hashing() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse battery", &hash));
        assert!(!verify_password("wrong password", &hash));
        assert!(!verify_password("correct horse battery", "not-a-phc-string"));
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("abc.def.ghi"), None);
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test_secret", 3600);
        let user_id = Uuid::new_v4();
        let scopes = scopes_for(false);

        let token = manager.generate_token(user_id, "analyst", scopes.clone()).unwrap();
        let claims = manager.validate_token(&token).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.username, "analyst");
        assert_eq!(claims.scopes, scopes);
    }

    #[test]
    fn test_jwt_wrong_secret_rejected() {
        let issuer = JwtManager::new("secret-a", 3600);
        let verifier = JwtManager::new("secret-b", 3600);
        let token = issuer.generate_token(Uuid::new_v4(), "analyst", vec![]).unwrap();

        let err = assert_err!(verifier.validate_token(&token));
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[test]
    fn test_jwt_expired() {
        let manager = JwtManager::new("test_secret", 3600);
        let now = Utc::now();
        // Past the default 60s leeway
        let claims = JwtClaims {
            sub: Uuid::new_v4().to_string(),
            username: "analyst".into(),
            exp: (now - Duration::seconds(600)).timestamp(),
            iat: (now - Duration::seconds(4200)).timestamp(),
            scopes: vec![],
        };
        let token = encode(&Header::default(), &claims, &manager.encoding_key).unwrap();

        let err = assert_err!(manager.validate_token(&token));
        assert!(matches!(err, AppError::ExpiredToken));
    }

    #[test]
    fn test_scopes() {
        let ctx = AuthContext {
            user_id: Uuid::new_v4(),
            username: "analyst".into(),
            scopes: scopes_for(false),
            request_id: "req-1".into(),
        };
        assert_ok!(ctx.require_scope(SCOPE_WRITE));
        assert_err!(ctx.require_scope(SCOPE_ADMIN));

        let admin = AuthContext {
            scopes: scopes_for(true),
            ..ctx
        };
        assert!(admin.has_scope(SCOPE_ADMIN));
        assert!(admin.has_scope("anything"));
    }
}
