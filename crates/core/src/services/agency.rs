//! Federal agency service

use super::{now, CrudService};
use crate::db::models::{Agency, AgencyActiveModel, AgencyColumn, AgencyEntity};
use crate::db::query::{contains_ignore_case, equals_ignore_case, fetch_page, find_required};
use crate::db::DbPool;
use async_trait::async_trait;
use athena_common::errors::{AppError, Result};
use athena_common::pagination::{Page, PageRequest};
use athena_common::validation::{not_blank, validate_request};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// Longest generated abbreviation
const MAX_ABBREVIATION_LEN: usize = 10;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAgency {
    #[validate(custom(function = "not_blank"), length(max = 500))]
    pub name: String,

    #[validate(length(max = 50))]
    pub abbreviation: Option<String>,

    pub parent_agency_id: Option<Uuid>,

    #[validate(length(max = 200))]
    pub department: Option<String>,

    #[validate(length(max = 50))]
    pub tier: Option<String>,

    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateAgency {
    #[validate(custom(function = "not_blank"), length(max = 500))]
    pub name: Option<String>,

    #[validate(length(max = 50))]
    pub abbreviation: Option<String>,

    pub parent_agency_id: Option<Uuid>,

    #[validate(length(max = 200))]
    pub department: Option<String>,

    #[validate(length(max = 50))]
    pub tier: Option<String>,

    pub is_active: Option<bool>,
}

#[derive(Clone)]
pub struct AgencyService {
    pool: DbPool,
}

impl AgencyService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_abbreviation(&self, abbreviation: &str) -> Result<Agency> {
        AgencyEntity::find()
            .filter(AgencyColumn::Abbreviation.eq(abbreviation))
            .one(self.pool.read())
            .await?
            .ok_or_else(|| AppError::not_found(Self::RESOURCE, abbreviation))
    }

    pub async fn search_by_name(&self, name: &str) -> Result<Vec<Agency>> {
        AgencyEntity::find()
            .filter(contains_ignore_case(AgencyColumn::Name, name))
            .order_by_asc(AgencyColumn::Name)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    pub async fn find_active(&self) -> Result<Vec<Agency>> {
        AgencyEntity::find()
            .filter(AgencyColumn::IsActive.eq(true))
            .order_by_asc(AgencyColumn::Name)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    pub async fn find_sub_agencies(&self, parent_id: Uuid) -> Result<Vec<Agency>> {
        AgencyEntity::find()
            .filter(AgencyColumn::ParentAgencyId.eq(parent_id))
            .order_by_asc(AgencyColumn::Name)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_department(&self, department: &str) -> Result<Vec<Agency>> {
        AgencyEntity::find()
            .filter(AgencyColumn::Department.eq(department))
            .order_by_asc(AgencyColumn::Name)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    /// Look up an agency by name (case-insensitive), creating it when absent.
    ///
    /// New agencies get generated initials as their abbreviation and use
    /// the name as department.
    pub async fn find_or_create_by_name(&self, name: &str, tier: Option<&str>) -> Result<Agency> {
        let existing = AgencyEntity::find()
            .filter(equals_ignore_case(AgencyColumn::Name, name))
            .one(self.pool.write())
            .await?;

        if let Some(agency) = existing {
            return Ok(agency);
        }

        let agency = self
            .create(CreateAgency {
                name: name.trim().to_string(),
                abbreviation: Some(abbreviate(name)).filter(|a| !a.is_empty()),
                parent_agency_id: None,
                department: Some(name.trim().to_string()),
                tier: tier.map(str::to_string),
                is_active: Some(true),
            })
            .await?;

        info!(agency_id = %agency.id, name = %agency.name, "Created agency");
        Ok(agency)
    }

    async fn ensure_parent_exists(&self, parent_id: Option<Uuid>) -> Result<()> {
        if let Some(parent_id) = parent_id {
            find_required::<AgencyEntity>(self.pool.read(), parent_id, Self::RESOURCE).await?;
        }
        Ok(())
    }
}

/// Uppercased initials of each word, at most ten characters
pub fn abbreviate(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .take(MAX_ABBREVIATION_LEN)
        .collect()
}

#[async_trait]
impl CrudService for AgencyService {
    type Model = Agency;
    type Create = CreateAgency;
    type Update = UpdateAgency;

    const RESOURCE: &'static str = "Agency";

    async fn create(&self, request: CreateAgency) -> Result<Agency> {
        validate_request(&request)?;
        self.ensure_parent_exists(request.parent_agency_id).await?;

        let timestamp = now();
        let agency = AgencyActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name),
            abbreviation: Set(request.abbreviation),
            parent_agency_id: Set(request.parent_agency_id),
            department: Set(request.department),
            tier: Set(request.tier),
            is_active: Set(request.is_active.unwrap_or(true)),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
        };

        agency.insert(self.pool.write()).await.map_err(Into::into)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Agency> {
        find_required::<AgencyEntity>(self.pool.read(), id, Self::RESOURCE).await
    }

    async fn find_all(&self, page: PageRequest) -> Result<Page<Agency>> {
        let select = AgencyEntity::find().order_by_desc(AgencyColumn::CreatedAt);
        fetch_page(self.pool.read(), select, &page).await
    }

    async fn update(&self, id: Uuid, request: UpdateAgency) -> Result<Agency> {
        validate_request(&request)?;
        let existing = find_required::<AgencyEntity>(self.pool.write(), id, Self::RESOURCE).await?;

        if request.parent_agency_id == Some(id) {
            return Err(AppError::Validation {
                message: "parent_agency_id: agency cannot be its own parent".to_string(),
                field: Some("parent_agency_id".to_string()),
            });
        }
        self.ensure_parent_exists(request.parent_agency_id).await?;

        let mut agency: AgencyActiveModel = existing.into();
        if let Some(name) = request.name {
            agency.name = Set(name);
        }
        if let Some(abbreviation) = request.abbreviation {
            agency.abbreviation = Set(Some(abbreviation));
        }
        if let Some(parent_agency_id) = request.parent_agency_id {
            agency.parent_agency_id = Set(Some(parent_agency_id));
        }
        if let Some(department) = request.department {
            agency.department = Set(Some(department));
        }
        if let Some(tier) = request.tier {
            agency.tier = Set(Some(tier));
        }
        if let Some(is_active) = request.is_active {
            agency.is_active = Set(is_active);
        }
        agency.updated_at = Set(now());

        agency.update(self.pool.write()).await.map_err(Into::into)
    }

    /// Soft delete
    async fn delete(&self, id: Uuid) -> Result<()> {
        let existing = find_required::<AgencyEntity>(self.pool.write(), id, Self::RESOURCE).await?;

        let mut agency: AgencyActiveModel = existing.into();
        agency.is_active = Set(false);
        agency.updated_at = Set(now());
        agency.update(self.pool.write()).await?;

        info!(agency_id = %id, "Deactivated agency");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing;

    #[test]
    fn test_abbreviate() {
        assert_eq!(abbreviate("Department of Defense"), "DOD");
        assert_eq!(abbreviate("  General   Services Administration "), "GSA");
        assert_eq!(abbreviate("a b c d e f g h i j k l"), "ABCDEFGHIJ");
        assert_eq!(abbreviate(""), "");
    }

    #[test]
    fn test_create_requires_name() {
        let request = CreateAgency {
            name: "   ".into(),
            abbreviation: None,
            parent_agency_id: None,
            department: None,
            tier: None,
            is_active: None,
        };
        let err = validate_request(&request).unwrap_err();
        assert!(matches!(err, AppError::Validation { field: Some(ref f), .. } if f == "name"));
    }

    #[test]
    fn test_update_accepts_empty_body() {
        let request: UpdateAgency = serde_json::from_str("{}").unwrap();
        assert!(validate_request(&request).is_ok());
    }

    #[tokio::test]
    async fn test_delete_deactivates_instead_of_removing() {
        let existing = testing::agency("Department of Energy");
        let mut deactivated = existing.clone();
        deactivated.is_active = false;

        let pool = testing::pool(
            testing::postgres()
                .append_query_results([[existing.clone()]])
                .append_query_results([[deactivated]]),
        );
        AgencyService::new(pool.clone()).delete(existing.id).await.unwrap();

        let sql = testing::executed_sql(pool);
        assert!(sql.contains(r#"UPDATE "agencies" SET "is_active" = $1"#));
        assert!(sql.contains("Bool(Some(false))"));
        assert!(sql.contains(r#""updated_at" = $"#));
        assert!(!sql.contains("DELETE"));
    }

    #[tokio::test]
    async fn test_delete_missing_agency_is_not_found() {
        let pool = testing::pool(testing::postgres().append_query_results([Vec::<Agency>::new()]));

        let err = AgencyService::new(pool.clone()).delete(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { ref resource_type, .. } if resource_type == "Agency"));
        assert!(!testing::executed_sql(pool).contains("UPDATE"));
    }
}
