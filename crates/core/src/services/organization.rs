//! Contractor organization service

use super::{now, CrudService};
use crate::db::models::{Organization, OrganizationActiveModel, OrganizationColumn, OrganizationEntity};
use crate::db::query::{contains_ignore_case, delete_required, fetch_page, find_required};
use crate::db::DbPool;
use async_trait::async_trait;
use athena_common::errors::{AppError, Result};
use athena_common::pagination::{Page, PageRequest};
use athena_common::validation::{not_blank, validate_request};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

const DEFAULT_COUNTRY_CODE: &str = "US";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOrganization {
    #[validate(custom(function = "not_blank"), length(max = 500))]
    pub name: String,

    #[validate(length(max = 12))]
    pub uei: Option<String>,

    #[validate(length(max = 5))]
    pub cage_code: Option<String>,

    #[validate(length(max = 9))]
    pub duns: Option<String>,

    pub sam_url: Option<String>,

    #[validate(length(max = 6))]
    pub primary_naics: Option<String>,

    #[validate(length(max = 100))]
    pub business_type: Option<String>,

    pub is_small_business: Option<bool>,

    pub is_woman_owned: Option<bool>,

    pub is_veteran_owned: Option<bool>,

    pub is_8a_certified: Option<bool>,

    pub street_address: Option<String>,

    #[validate(length(max = 100))]
    pub city: Option<String>,

    #[validate(length(max = 2))]
    pub state_code: Option<String>,

    #[validate(length(max = 10))]
    pub zip_code: Option<String>,

    #[validate(length(max = 2))]
    pub country_code: Option<String>,

    pub website_url: Option<String>,

    #[validate(length(max = 20))]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateOrganization {
    #[validate(custom(function = "not_blank"), length(max = 500))]
    pub name: Option<String>,

    #[validate(length(max = 12))]
    pub uei: Option<String>,

    #[validate(length(max = 5))]
    pub cage_code: Option<String>,

    #[validate(length(max = 9))]
    pub duns: Option<String>,

    pub sam_url: Option<String>,

    #[validate(length(max = 6))]
    pub primary_naics: Option<String>,

    #[validate(length(max = 100))]
    pub business_type: Option<String>,

    pub is_small_business: Option<bool>,

    pub is_woman_owned: Option<bool>,

    pub is_veteran_owned: Option<bool>,

    pub is_8a_certified: Option<bool>,

    pub street_address: Option<String>,

    #[validate(length(max = 100))]
    pub city: Option<String>,

    #[validate(length(max = 2))]
    pub state_code: Option<String>,

    #[validate(length(max = 10))]
    pub zip_code: Option<String>,

    #[validate(length(max = 2))]
    pub country_code: Option<String>,

    pub website_url: Option<String>,

    #[validate(length(max = 20))]
    pub phone: Option<String>,
}

#[derive(Clone)]
pub struct OrganizationService {
    pool: DbPool,
}

impl OrganizationService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_uei(&self, uei: &str) -> Result<Organization> {
        OrganizationEntity::find()
            .filter(OrganizationColumn::Uei.eq(uei))
            .one(self.pool.read())
            .await?
            .ok_or_else(|| AppError::not_found(Self::RESOURCE, uei))
    }

    pub async fn find_by_cage_code(&self, cage_code: &str) -> Result<Organization> {
        OrganizationEntity::find()
            .filter(OrganizationColumn::CageCode.eq(cage_code))
            .one(self.pool.read())
            .await?
            .ok_or_else(|| AppError::not_found(Self::RESOURCE, cage_code))
    }

    pub async fn search_by_name(&self, name: &str) -> Result<Vec<Organization>> {
        OrganizationEntity::find()
            .filter(contains_ignore_case(OrganizationColumn::Name, name))
            .order_by_asc(OrganizationColumn::Name)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_primary_naics(&self, naics: &str) -> Result<Vec<Organization>> {
        OrganizationEntity::find()
            .filter(OrganizationColumn::PrimaryNaics.eq(naics))
            .order_by_asc(OrganizationColumn::Name)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    pub async fn find_small_businesses(&self) -> Result<Vec<Organization>> {
        OrganizationEntity::find()
            .filter(OrganizationColumn::IsSmallBusiness.eq(true))
            .order_by_asc(OrganizationColumn::Name)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    async fn ensure_uei_free(&self, uei: &str) -> Result<()> {
        let taken = OrganizationEntity::find()
            .filter(OrganizationColumn::Uei.eq(uei))
            .one(self.pool.write())
            .await?
            .is_some();
        if taken {
            return Err(AppError::duplicate(Self::RESOURCE, "uei", uei));
        }
        Ok(())
    }
}

#[async_trait]
impl CrudService for OrganizationService {
    type Model = Organization;
    type Create = CreateOrganization;
    type Update = UpdateOrganization;

    const RESOURCE: &'static str = "Organization";

    async fn create(&self, request: CreateOrganization) -> Result<Organization> {
        validate_request(&request)?;
        if let Some(ref uei) = request.uei {
            self.ensure_uei_free(uei).await?;
        }

        let timestamp = now();
        let organization = OrganizationActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name),
            uei: Set(request.uei),
            cage_code: Set(request.cage_code),
            duns: Set(request.duns),
            sam_url: Set(request.sam_url),
            primary_naics: Set(request.primary_naics),
            business_type: Set(request.business_type),
            is_small_business: Set(request.is_small_business.unwrap_or(false)),
            is_woman_owned: Set(request.is_woman_owned.unwrap_or(false)),
            is_veteran_owned: Set(request.is_veteran_owned.unwrap_or(false)),
            is_8a_certified: Set(request.is_8a_certified.unwrap_or(false)),
            street_address: Set(request.street_address),
            city: Set(request.city),
            state_code: Set(request.state_code),
            zip_code: Set(request.zip_code),
            country_code: Set(request
                .country_code
                .unwrap_or_else(|| DEFAULT_COUNTRY_CODE.to_string())),
            website_url: Set(request.website_url),
            phone: Set(request.phone),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
        };

        organization.insert(self.pool.write()).await.map_err(Into::into)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Organization> {
        find_required::<OrganizationEntity>(self.pool.read(), id, Self::RESOURCE).await
    }

    async fn find_all(&self, page: PageRequest) -> Result<Page<Organization>> {
        let select = OrganizationEntity::find().order_by_desc(OrganizationColumn::CreatedAt);
        fetch_page(self.pool.read(), select, &page).await
    }

    async fn update(&self, id: Uuid, request: UpdateOrganization) -> Result<Organization> {
        validate_request(&request)?;
        let existing = find_required::<OrganizationEntity>(self.pool.write(), id, Self::RESOURCE).await?;

        if let Some(ref uei) = request.uei {
            if existing.uei.as_deref() != Some(uei.as_str()) {
                self.ensure_uei_free(uei).await?;
            }
        }

        let mut organization: OrganizationActiveModel = existing.into();
        if let Some(name) = request.name {
            organization.name = Set(name);
        }
        if let Some(uei) = request.uei {
            organization.uei = Set(Some(uei));
        }
        if let Some(cage_code) = request.cage_code {
            organization.cage_code = Set(Some(cage_code));
        }
        if let Some(duns) = request.duns {
            organization.duns = Set(Some(duns));
        }
        if let Some(sam_url) = request.sam_url {
            organization.sam_url = Set(Some(sam_url));
        }
        if let Some(primary_naics) = request.primary_naics {
            organization.primary_naics = Set(Some(primary_naics));
        }
        if let Some(business_type) = request.business_type {
            organization.business_type = Set(Some(business_type));
        }
        if let Some(flag) = request.is_small_business {
            organization.is_small_business = Set(flag);
        }
        if let Some(flag) = request.is_woman_owned {
            organization.is_woman_owned = Set(flag);
        }
        if let Some(flag) = request.is_veteran_owned {
            organization.is_veteran_owned = Set(flag);
        }
        if let Some(flag) = request.is_8a_certified {
            organization.is_8a_certified = Set(flag);
        }
        if let Some(street_address) = request.street_address {
            organization.street_address = Set(Some(street_address));
        }
        if let Some(city) = request.city {
            organization.city = Set(Some(city));
        }
        if let Some(state_code) = request.state_code {
            organization.state_code = Set(Some(state_code));
        }
        if let Some(zip_code) = request.zip_code {
            organization.zip_code = Set(Some(zip_code));
        }
        if let Some(country_code) = request.country_code {
            organization.country_code = Set(country_code);
        }
        if let Some(website_url) = request.website_url {
            organization.website_url = Set(Some(website_url));
        }
        if let Some(phone) = request.phone {
            organization.phone = Set(Some(phone));
        }
        organization.updated_at = Set(now());

        organization.update(self.pool.write()).await.map_err(Into::into)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        delete_required::<OrganizationEntity>(self.pool.write(), id, Self::RESOURCE).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identifier_lengths() {
        let request: CreateOrganization = serde_json::from_value(json!({
            "name": "Acme Federal LLC",
            "uei": "ABCDEFGHJKLMN",
            "cage_code": "1ABC2"
        }))
        .unwrap();
        let err = validate_request(&request).unwrap_err();
        assert!(matches!(err, AppError::Validation { field: Some(ref f), .. } if f == "uei"));
    }
}
