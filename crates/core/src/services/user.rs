//! User accounts and credential checks

use super::{now, CrudService};
use crate::db::models::{User, UserActiveModel, UserColumn, UserEntity};
use crate::db::query::{fetch_page, find_required};
use crate::db::DbPool;
use async_trait::async_trait;
use athena_common::auth::{hash_password, verify_password};
use athena_common::errors::{AppError, Result};
use athena_common::pagination::{Page, PageRequest};
use athena_common::validation::{not_blank, validate_request};
use sea_orm::sea_query::Condition;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUser {
    #[validate(email, length(max = 255))]
    pub email: String,

    #[validate(custom(function = "not_blank"), length(min = 3, max = 100))]
    pub username: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    #[validate(length(max = 100))]
    pub first_name: Option<String>,

    #[validate(length(max = 100))]
    pub last_name: Option<String>,

    pub is_admin: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateUser {
    #[validate(email, length(max = 255))]
    pub email: Option<String>,

    #[validate(custom(function = "not_blank"), length(min = 3, max = 100))]
    pub username: Option<String>,

    #[validate(length(min = 8, max = 128))]
    pub password: Option<String>,

    #[validate(length(max = 100))]
    pub first_name: Option<String>,

    #[validate(length(max = 100))]
    pub last_name: Option<String>,

    pub is_active: Option<bool>,

    pub is_admin: Option<bool>,
}

#[derive(Clone)]
pub struct UserService {
    pool: DbPool,
}

impl UserService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<User> {
        UserEntity::find()
            .filter(UserColumn::Email.eq(email))
            .one(self.pool.read())
            .await?
            .ok_or_else(|| AppError::not_found(Self::RESOURCE, email))
    }

    pub async fn find_by_username(&self, username: &str) -> Result<User> {
        UserEntity::find()
            .filter(UserColumn::Username.eq(username))
            .one(self.pool.read())
            .await?
            .ok_or_else(|| AppError::not_found(Self::RESOURCE, username))
    }

    /// Check a username-or-email and password pair.
    ///
    /// Unknown logins, wrong passwords and inactive accounts all fail
    /// with `InvalidCredentials` so callers cannot probe for accounts.
    pub async fn authenticate(&self, login: &str, password: &str) -> Result<User> {
        let login = login.trim();
        let user = UserEntity::find()
            .filter(
                Condition::any()
                    .add(UserColumn::Username.eq(login))
                    .add(UserColumn::Email.eq(login)),
            )
            .one(self.pool.read())
            .await?;

        let Some(user) = user else {
            return Err(AppError::InvalidCredentials);
        };

        let stored_hash = user.password_hash.clone();
        let password = password.to_string();
        let valid = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
            .await
            .map_err(|e| AppError::Internal {
                message: format!("Password verification task failed: {}", e),
            })?;

        if !valid {
            return Err(AppError::InvalidCredentials);
        }
        if !user.is_active {
            warn!(user_id = %user.id, "Login attempt for inactive user");
            return Err(AppError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Stamp `last_login_at` with the current time
    pub async fn record_login(&self, id: Uuid) -> Result<User> {
        let existing = find_required::<UserEntity>(self.pool.write(), id, Self::RESOURCE).await?;

        let timestamp = now();
        let mut user: UserActiveModel = existing.into();
        user.last_login_at = Set(Some(timestamp));
        user.updated_at = Set(timestamp);
        user.update(self.pool.write()).await.map_err(Into::into)
    }

    async fn ensure_email_free(&self, email: &str) -> Result<()> {
        let taken = UserEntity::find()
            .filter(UserColumn::Email.eq(email))
            .one(self.pool.write())
            .await?
            .is_some();
        if taken {
            return Err(AppError::duplicate(Self::RESOURCE, "email", email));
        }
        Ok(())
    }

    async fn ensure_username_free(&self, username: &str) -> Result<()> {
        let taken = UserEntity::find()
            .filter(UserColumn::Username.eq(username))
            .one(self.pool.write())
            .await?
            .is_some();
        if taken {
            return Err(AppError::duplicate(Self::RESOURCE, "username", username));
        }
        Ok(())
    }
}

async fn hash_in_background(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal {
            message: format!("Password hashing task failed: {}", e),
        })?
}

#[async_trait]
impl CrudService for UserService {
    type Model = User;
    type Create = CreateUser;
    type Update = UpdateUser;

    const RESOURCE: &'static str = "User";

    async fn create(&self, request: CreateUser) -> Result<User> {
        validate_request(&request)?;
        self.ensure_email_free(&request.email).await?;
        self.ensure_username_free(&request.username).await?;

        let password_hash = hash_in_background(request.password).await?;

        let timestamp = now();
        let user = UserActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(request.email),
            username: Set(request.username),
            password_hash: Set(password_hash),
            first_name: Set(request.first_name),
            last_name: Set(request.last_name),
            is_active: Set(true),
            is_admin: Set(request.is_admin.unwrap_or(false)),
            last_login_at: Set(None),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
        };

        let user = user.insert(self.pool.write()).await?;
        info!(user_id = %user.id, username = %user.username, "Registered user");
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<User> {
        find_required::<UserEntity>(self.pool.read(), id, Self::RESOURCE).await
    }

    async fn find_all(&self, page: PageRequest) -> Result<Page<User>> {
        let select = UserEntity::find().order_by_desc(UserColumn::CreatedAt);
        fetch_page(self.pool.read(), select, &page).await
    }

    async fn update(&self, id: Uuid, request: UpdateUser) -> Result<User> {
        validate_request(&request)?;
        let existing = find_required::<UserEntity>(self.pool.write(), id, Self::RESOURCE).await?;

        if let Some(ref email) = request.email {
            if *email != existing.email {
                self.ensure_email_free(email).await?;
            }
        }
        if let Some(ref username) = request.username {
            if *username != existing.username {
                self.ensure_username_free(username).await?;
            }
        }

        let password_hash = match request.password {
            Some(password) => Some(hash_in_background(password).await?),
            None => None,
        };

        let mut user: UserActiveModel = existing.into();
        if let Some(email) = request.email {
            user.email = Set(email);
        }
        if let Some(username) = request.username {
            user.username = Set(username);
        }
        if let Some(password_hash) = password_hash {
            user.password_hash = Set(password_hash);
        }
        if let Some(first_name) = request.first_name {
            user.first_name = Set(Some(first_name));
        }
        if let Some(last_name) = request.last_name {
            user.last_name = Set(Some(last_name));
        }
        if let Some(is_active) = request.is_active {
            user.is_active = Set(is_active);
        }
        if let Some(is_admin) = request.is_admin {
            user.is_admin = Set(is_admin);
        }
        user.updated_at = Set(now());

        user.update(self.pool.write()).await.map_err(Into::into)
    }

    /// Soft delete
    async fn delete(&self, id: Uuid) -> Result<()> {
        let existing = find_required::<UserEntity>(self.pool.write(), id, Self::RESOURCE).await?;

        let mut user: UserActiveModel = existing.into();
        user.is_active = Set(false);
        user.updated_at = Set(now());
        user.update(self.pool.write()).await?;

        info!(user_id = %id, "Deactivated user");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing;
    use serde_json::json;

    fn create(body: serde_json::Value) -> CreateUser {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_registration_rules() {
        let valid = create(json!({
            "email": "analyst@athena.local",
            "username": "analyst",
            "password": "correct-horse"
        }));
        assert!(validate_request(&valid).is_ok());

        let short_password = create(json!({
            "email": "analyst@athena.local",
            "username": "analyst",
            "password": "short"
        }));
        let err = validate_request(&short_password).unwrap_err();
        assert!(matches!(err, AppError::Validation { field: Some(ref f), .. } if f == "password"));

        let bad_email = create(json!({
            "email": "analyst",
            "username": "ab",
            "password": "correct-horse"
        }));
        match validate_request(&bad_email).unwrap_err() {
            AppError::Validation { message, field } => {
                assert_eq!(field.as_deref(), Some("email"));
                assert!(message.contains("username"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_hash_in_background() {
        let hash = hash_in_background("correct-horse".to_string()).await.unwrap();
        assert!(verify_password("correct-horse", &hash));
    }

    #[tokio::test]
    async fn test_authenticate_rejects_inactive_user() {
        let hash = hash_password("correct-horse").unwrap();
        let active = testing::user("analyst", &hash);
        let mut inactive = active.clone();
        inactive.is_active = false;

        let pool = testing::pool(
            testing::postgres()
                .append_query_results([[active.clone()]])
                .append_query_results([[inactive.clone()]])
                .append_query_results([[active.clone()]]),
        );
        let service = UserService::new(pool);

        let user = service.authenticate(" analyst ", "correct-horse").await.unwrap();
        assert_eq!(user.id, active.id);

        let err = service.authenticate("analyst", "correct-horse").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));

        let err = service.authenticate("analyst", "wrong-horse").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_authenticate_unknown_login() {
        let pool = testing::pool(testing::postgres().append_query_results([Vec::<User>::new()]));

        let err = UserService::new(pool).authenticate("nobody", "correct-horse").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_update_rejects_taken_email() {
        let existing = testing::user("analyst", "$argon2id$placeholder");
        let other = testing::user("manager", "$argon2id$placeholder");

        let pool = testing::pool(
            testing::postgres()
                .append_query_results([[existing.clone()]])
                .append_query_results([[other.clone()]]),
        );
        let request = UpdateUser {
            email: Some(other.email.clone()),
            ..Default::default()
        };

        let err = UserService::new(pool.clone()).update(existing.id, request).await.unwrap_err();
        assert!(matches!(err, AppError::Duplicate { ref field, .. } if field == "email"));
        assert!(!testing::executed_sql(pool).contains("UPDATE"));
    }
}
