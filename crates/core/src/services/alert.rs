//! User alert service

use super::{now, CrudService};
use crate::db::models::{Alert, AlertActiveModel, AlertColumn, AlertEntity, UserEntity};
use crate::db::query::{fetch_page, find_required};
use crate::db::DbPool;
use async_trait::async_trait;
use athena_common::errors::Result;
use athena_common::pagination::{Page, PageRequest};
use athena_common::validation::{not_blank, validate_request};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAlert {
    pub user_id: Uuid,

    #[validate(custom(function = "not_blank"), length(max = 50))]
    pub alert_type: String,

    pub criteria: Value,

    #[validate(custom(function = "not_blank"), length(max = 50))]
    pub frequency: String,

    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateAlert {
    #[validate(custom(function = "not_blank"), length(max = 50))]
    pub alert_type: Option<String>,

    pub criteria: Option<Value>,

    #[validate(custom(function = "not_blank"), length(max = 50))]
    pub frequency: Option<String>,

    pub is_active: Option<bool>,
}

#[derive(Clone)]
pub struct AlertService {
    pool: DbPool,
}

impl AlertService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Alert>> {
        AlertEntity::find()
            .filter(AlertColumn::UserId.eq(user_id))
            .order_by_desc(AlertColumn::CreatedAt)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    pub async fn find_active_by_user(&self, user_id: Uuid) -> Result<Vec<Alert>> {
        AlertEntity::find()
            .filter(AlertColumn::UserId.eq(user_id))
            .filter(AlertColumn::IsActive.eq(true))
            .order_by_desc(AlertColumn::CreatedAt)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_type(&self, alert_type: &str) -> Result<Vec<Alert>> {
        AlertEntity::find()
            .filter(AlertColumn::AlertType.eq(alert_type))
            .order_by_desc(AlertColumn::CreatedAt)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    /// Stamp `last_triggered` with the current time
    pub async fn record_trigger(&self, id: Uuid) -> Result<Alert> {
        let existing = find_required::<AlertEntity>(self.pool.write(), id, Self::RESOURCE).await?;

        let timestamp = now();
        let mut alert: AlertActiveModel = existing.into();
        alert.last_triggered = Set(Some(timestamp));
        alert.updated_at = Set(timestamp);
        alert.update(self.pool.write()).await.map_err(Into::into)
    }

    /// Alerts created in `[from, to)`
    pub async fn count_created_between(&self, from: DateTimeWithTimeZone, to: DateTimeWithTimeZone) -> Result<u64> {
        AlertEntity::find()
            .filter(AlertColumn::CreatedAt.gte(from))
            .filter(AlertColumn::CreatedAt.lt(to))
            .count(self.pool.read())
            .await
            .map_err(Into::into)
    }
}

#[async_trait]
impl CrudService for AlertService {
    type Model = Alert;
    type Create = CreateAlert;
    type Update = UpdateAlert;

    const RESOURCE: &'static str = "Alert";

    async fn create(&self, request: CreateAlert) -> Result<Alert> {
        validate_request(&request)?;
        find_required::<UserEntity>(self.pool.read(), request.user_id, "User").await?;

        let timestamp = now();
        let alert = AlertActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(request.user_id),
            alert_type: Set(request.alert_type),
            criteria: Set(request.criteria),
            frequency: Set(request.frequency),
            is_active: Set(request.is_active.unwrap_or(true)),
            last_triggered: Set(None),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
        };

        alert.insert(self.pool.write()).await.map_err(Into::into)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Alert> {
        find_required::<AlertEntity>(self.pool.read(), id, Self::RESOURCE).await
    }

    async fn find_all(&self, page: PageRequest) -> Result<Page<Alert>> {
        let select = AlertEntity::find().order_by_desc(AlertColumn::CreatedAt);
        fetch_page(self.pool.read(), select, &page).await
    }

    async fn update(&self, id: Uuid, request: UpdateAlert) -> Result<Alert> {
        validate_request(&request)?;
        let existing = find_required::<AlertEntity>(self.pool.write(), id, Self::RESOURCE).await?;

        let mut alert: AlertActiveModel = existing.into();
        if let Some(alert_type) = request.alert_type {
            alert.alert_type = Set(alert_type);
        }
        if let Some(criteria) = request.criteria {
            alert.criteria = Set(criteria);
        }
        if let Some(frequency) = request.frequency {
            alert.frequency = Set(frequency);
        }
        if let Some(is_active) = request.is_active {
            alert.is_active = Set(is_active);
        }
        alert.updated_at = Set(now());

        alert.update(self.pool.write()).await.map_err(Into::into)
    }

    /// Soft delete
    async fn delete(&self, id: Uuid) -> Result<()> {
        let existing = find_required::<AlertEntity>(self.pool.write(), id, Self::RESOURCE).await?;

        let mut alert: AlertActiveModel = existing.into();
        alert.is_active = Set(false);
        alert.updated_at = Set(now());
        alert.update(self.pool.write()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use athena_common::errors::AppError;
    use serde_json::json;

    #[test]
    fn test_create_requires_fields() {
        let missing = serde_json::from_value::<CreateAlert>(json!({
            "user_id": Uuid::new_v4(),
            "alert_type": "NAICS_MATCH"
        }));
        assert!(missing.is_err());

        let blank: CreateAlert = serde_json::from_value(json!({
            "user_id": Uuid::new_v4(),
            "alert_type": "NAICS_MATCH",
            "criteria": {"naics": ["541512"]},
            "frequency": " "
        }))
        .unwrap();
        let err = validate_request(&blank).unwrap_err();
        assert!(matches!(err, AppError::Validation { field: Some(ref f), .. } if f == "frequency"));
    }
}
