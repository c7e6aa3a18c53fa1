//! Contract vehicle reference data (GSA schedules, GWACs, IDIQs)

use super::{now, CrudService};
use crate::db::models::{ContractVehicle, ContractVehicleActiveModel, ContractVehicleColumn, ContractVehicleEntity};
use crate::db::query::{fetch_page, find_required};
use crate::db::DbPool;
use async_trait::async_trait;
use athena_common::errors::{AppError, Result};
use athena_common::pagination::{Page, PageRequest};
use athena_common::validation::{not_blank, validate_request};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateContractVehicle {
    #[validate(custom(function = "not_blank"), length(max = 50))]
    pub code: String,

    #[validate(custom(function = "not_blank"), length(max = 255))]
    pub name: String,

    pub description: Option<String>,

    #[validate(length(max = 50))]
    pub category: Option<String>,

    #[validate(length(max = 255))]
    pub managing_agency: Option<String>,

    #[validate(url)]
    pub url: Option<String>,

    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateContractVehicle {
    #[validate(custom(function = "not_blank"), length(max = 50))]
    pub code: Option<String>,

    #[validate(custom(function = "not_blank"), length(max = 255))]
    pub name: Option<String>,

    pub description: Option<String>,

    #[validate(length(max = 50))]
    pub category: Option<String>,

    #[validate(length(max = 255))]
    pub managing_agency: Option<String>,

    #[validate(url)]
    pub url: Option<String>,

    pub is_active: Option<bool>,
}

#[derive(Clone)]
pub struct ContractVehicleService {
    pool: DbPool,
}

impl ContractVehicleService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_code(&self, code: &str) -> Result<ContractVehicle> {
        ContractVehicleEntity::find()
            .filter(ContractVehicleColumn::Code.eq(code))
            .one(self.pool.read())
            .await?
            .ok_or_else(|| AppError::not_found(Self::RESOURCE, code))
    }

    async fn ensure_code_free(&self, code: &str) -> Result<()> {
        let taken = ContractVehicleEntity::find()
            .filter(ContractVehicleColumn::Code.eq(code))
            .one(self.pool.write())
            .await?
            .is_some();
        if taken {
            return Err(AppError::duplicate(Self::RESOURCE, "code", code));
        }
        Ok(())
    }
}

#[async_trait]
impl CrudService for ContractVehicleService {
    type Model = ContractVehicle;
    type Create = CreateContractVehicle;
    type Update = UpdateContractVehicle;

    const RESOURCE: &'static str = "ContractVehicle";

    async fn create(&self, request: CreateContractVehicle) -> Result<ContractVehicle> {
        validate_request(&request)?;
        self.ensure_code_free(&request.code).await?;

        let timestamp = now();
        let vehicle = ContractVehicleActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(request.code),
            name: Set(request.name),
            description: Set(request.description),
            category: Set(request.category),
            managing_agency: Set(request.managing_agency),
            url: Set(request.url),
            is_active: Set(request.is_active.unwrap_or(true)),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
        };

        vehicle.insert(self.pool.write()).await.map_err(Into::into)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<ContractVehicle> {
        find_required::<ContractVehicleEntity>(self.pool.read(), id, Self::RESOURCE).await
    }

    async fn find_all(&self, page: PageRequest) -> Result<Page<ContractVehicle>> {
        let select = ContractVehicleEntity::find().order_by_desc(ContractVehicleColumn::CreatedAt);
        fetch_page(self.pool.read(), select, &page).await
    }

    async fn update(&self, id: Uuid, request: UpdateContractVehicle) -> Result<ContractVehicle> {
        validate_request(&request)?;
        let existing = find_required::<ContractVehicleEntity>(self.pool.write(), id, Self::RESOURCE).await?;

        if let Some(ref code) = request.code {
            if *code != existing.code {
                self.ensure_code_free(code).await?;
            }
        }

        let mut vehicle: ContractVehicleActiveModel = existing.into();
        if let Some(code) = request.code {
            vehicle.code = Set(code);
        }
        if let Some(name) = request.name {
            vehicle.name = Set(name);
        }
        if let Some(description) = request.description {
            vehicle.description = Set(Some(description));
        }
        if let Some(category) = request.category {
            vehicle.category = Set(Some(category));
        }
        if let Some(managing_agency) = request.managing_agency {
            vehicle.managing_agency = Set(Some(managing_agency));
        }
        if let Some(url) = request.url {
            vehicle.url = Set(Some(url));
        }
        if let Some(is_active) = request.is_active {
            vehicle.is_active = Set(is_active);
        }
        vehicle.updated_at = Set(now());

        vehicle.update(self.pool.write()).await.map_err(Into::into)
    }

    /// Soft delete
    async fn delete(&self, id: Uuid) -> Result<()> {
        let existing = find_required::<ContractVehicleEntity>(self.pool.write(), id, Self::RESOURCE).await?;

        let mut vehicle: ContractVehicleActiveModel = existing.into();
        vehicle.is_active = Set(false);
        vehicle.updated_at = Set(now());
        vehicle.update(self.pool.write()).await?;
        Ok(())
    }
}
