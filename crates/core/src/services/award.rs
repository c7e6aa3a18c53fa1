//! Contract award service

use super::{now, CrudService};
use crate::db::models::{Award, AwardActiveModel, AwardColumn, AwardEntity};
use crate::db::query::{fetch_page, find_required};
use crate::db::DbPool;
use async_trait::async_trait;
use athena_common::errors::{AppError, Result};
use athena_common::pagination::{Page, PageRequest};
use athena_common::validation::{not_blank, validate_request};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationError};

const DEFAULT_CURRENCY: &str = "USD";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAward {
    #[validate(custom(function = "not_blank"), length(max = 255))]
    pub contract_number: String,

    pub opportunity_id: Option<Uuid>,

    #[validate(length(max = 500))]
    pub title: Option<String>,

    pub organization_id: Option<Uuid>,

    #[validate(length(max = 500))]
    pub awardee_name: Option<String>,

    #[validate(length(max = 12))]
    pub awardee_uei: Option<String>,

    #[validate(length(max = 9))]
    pub awardee_duns: Option<String>,

    pub award_date: Option<NaiveDate>,

    #[validate(custom(function = "non_negative"))]
    pub award_amount: Option<Decimal>,

    #[validate(length(equal = 3))]
    pub currency: Option<String>,

    pub start_date: Option<NaiveDate>,

    pub end_date: Option<NaiveDate>,

    pub agency_id: Option<Uuid>,

    #[validate(length(max = 500))]
    pub awarding_office: Option<String>,

    #[validate(length(max = 100))]
    pub award_type: Option<String>,

    #[validate(length(max = 6))]
    pub naics_code: Option<String>,

    #[validate(length(max = 100))]
    pub set_aside: Option<String>,

    pub description: Option<String>,

    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateAward {
    #[validate(custom(function = "not_blank"), length(max = 255))]
    pub contract_number: Option<String>,

    pub opportunity_id: Option<Uuid>,

    #[validate(length(max = 500))]
    pub title: Option<String>,

    pub organization_id: Option<Uuid>,

    #[validate(length(max = 500))]
    pub awardee_name: Option<String>,

    #[validate(length(max = 12))]
    pub awardee_uei: Option<String>,

    #[validate(length(max = 9))]
    pub awardee_duns: Option<String>,

    pub award_date: Option<NaiveDate>,

    #[validate(custom(function = "non_negative"))]
    pub award_amount: Option<Decimal>,

    #[validate(length(equal = 3))]
    pub currency: Option<String>,

    pub start_date: Option<NaiveDate>,

    pub end_date: Option<NaiveDate>,

    pub agency_id: Option<Uuid>,

    #[validate(length(max = 500))]
    pub awarding_office: Option<String>,

    #[validate(length(max = 100))]
    pub award_type: Option<String>,

    #[validate(length(max = 6))]
    pub naics_code: Option<String>,

    #[validate(length(max = 100))]
    pub set_aside: Option<String>,

    pub description: Option<String>,

    pub is_active: Option<bool>,
}

fn non_negative(amount: &Decimal) -> std::result::Result<(), ValidationError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        let mut err = ValidationError::new("non_negative");
        err.message = Some("must not be negative".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Clone)]
pub struct AwardService {
    pool: DbPool,
}

impl AwardService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_contract_number(&self, contract_number: &str) -> Result<Award> {
        AwardEntity::find()
            .filter(AwardColumn::ContractNumber.eq(contract_number))
            .one(self.pool.read())
            .await?
            .ok_or_else(|| AppError::not_found(Self::RESOURCE, contract_number))
    }

    pub async fn find_active(&self) -> Result<Vec<Award>> {
        AwardEntity::find()
            .filter(AwardColumn::IsActive.eq(true))
            .order_by_desc(AwardColumn::AwardDate)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    /// Awards dated within `[start, end]`
    pub async fn find_by_award_date_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Award>> {
        AwardEntity::find()
            .filter(AwardColumn::AwardDate.between(start, end))
            .order_by_desc(AwardColumn::AwardDate)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_naics(&self, naics_code: &str) -> Result<Vec<Award>> {
        AwardEntity::find()
            .filter(AwardColumn::NaicsCode.eq(naics_code))
            .order_by_desc(AwardColumn::AwardDate)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_awardee_uei(&self, uei: &str) -> Result<Vec<Award>> {
        AwardEntity::find()
            .filter(AwardColumn::AwardeeUei.eq(uei))
            .order_by_desc(AwardColumn::AwardDate)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    async fn ensure_contract_number_free(&self, contract_number: &str, current: Option<Uuid>) -> Result<()> {
        let mut select = AwardEntity::find().filter(AwardColumn::ContractNumber.eq(contract_number));
        if let Some(id) = current {
            select = select.filter(AwardColumn::Id.ne(id));
        }
        if select.one(self.pool.write()).await?.is_some() {
            return Err(AppError::duplicate(Self::RESOURCE, "contract_number", contract_number));
        }
        Ok(())
    }
}

#[async_trait]
impl CrudService for AwardService {
    type Model = Award;
    type Create = CreateAward;
    type Update = UpdateAward;

    const RESOURCE: &'static str = "Award";

    async fn create(&self, request: CreateAward) -> Result<Award> {
        validate_request(&request)?;
        self.ensure_contract_number_free(&request.contract_number, None).await?;

        let timestamp = now();
        let award = AwardActiveModel {
            id: Set(Uuid::new_v4()),
            opportunity_id: Set(request.opportunity_id),
            contract_number: Set(request.contract_number),
            title: Set(request.title),
            organization_id: Set(request.organization_id),
            awardee_name: Set(request.awardee_name),
            awardee_uei: Set(request.awardee_uei),
            awardee_duns: Set(request.awardee_duns),
            award_date: Set(request.award_date),
            award_amount: Set(request.award_amount),
            currency: Set(request.currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_string())),
            start_date: Set(request.start_date),
            end_date: Set(request.end_date),
            agency_id: Set(request.agency_id),
            awarding_office: Set(request.awarding_office),
            award_type: Set(request.award_type),
            naics_code: Set(request.naics_code),
            set_aside: Set(request.set_aside),
            description: Set(request.description),
            is_active: Set(request.is_active.unwrap_or(true)),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
        };

        award.insert(self.pool.write()).await.map_err(Into::into)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Award> {
        find_required::<AwardEntity>(self.pool.read(), id, Self::RESOURCE).await
    }

    async fn find_all(&self, page: PageRequest) -> Result<Page<Award>> {
        let select = AwardEntity::find().order_by_desc(AwardColumn::CreatedAt);
        fetch_page(self.pool.read(), select, &page).await
    }

    async fn update(&self, id: Uuid, request: UpdateAward) -> Result<Award> {
        validate_request(&request)?;
        let existing = find_required::<AwardEntity>(self.pool.write(), id, Self::RESOURCE).await?;

        if let Some(ref contract_number) = request.contract_number {
            if *contract_number != existing.contract_number {
                self.ensure_contract_number_free(contract_number, Some(id)).await?;
            }
        }

        let mut award: AwardActiveModel = existing.into();
        if let Some(contract_number) = request.contract_number {
            award.contract_number = Set(contract_number);
        }
        if let Some(opportunity_id) = request.opportunity_id {
            award.opportunity_id = Set(Some(opportunity_id));
        }
        if let Some(title) = request.title {
            award.title = Set(Some(title));
        }
        if let Some(organization_id) = request.organization_id {
            award.organization_id = Set(Some(organization_id));
        }
        if let Some(awardee_name) = request.awardee_name {
            award.awardee_name = Set(Some(awardee_name));
        }
        if let Some(awardee_uei) = request.awardee_uei {
            award.awardee_uei = Set(Some(awardee_uei));
        }
        if let Some(awardee_duns) = request.awardee_duns {
            award.awardee_duns = Set(Some(awardee_duns));
        }
        if let Some(award_date) = request.award_date {
            award.award_date = Set(Some(award_date));
        }
        if let Some(award_amount) = request.award_amount {
            award.award_amount = Set(Some(award_amount));
        }
        if let Some(currency) = request.currency {
            award.currency = Set(currency);
        }
        if let Some(start_date) = request.start_date {
            award.start_date = Set(Some(start_date));
        }
        if let Some(end_date) = request.end_date {
            award.end_date = Set(Some(end_date));
        }
        if let Some(agency_id) = request.agency_id {
            award.agency_id = Set(Some(agency_id));
        }
        if let Some(awarding_office) = request.awarding_office {
            award.awarding_office = Set(Some(awarding_office));
        }
        if let Some(award_type) = request.award_type {
            award.award_type = Set(Some(award_type));
        }
        if let Some(naics_code) = request.naics_code {
            award.naics_code = Set(Some(naics_code));
        }
        if let Some(set_aside) = request.set_aside {
            award.set_aside = Set(Some(set_aside));
        }
        if let Some(description) = request.description {
            award.description = Set(Some(description));
        }
        if let Some(is_active) = request.is_active {
            award.is_active = Set(is_active);
        }
        award.updated_at = Set(now());

        award.update(self.pool.write()).await.map_err(Into::into)
    }

    /// Soft delete
    async fn delete(&self, id: Uuid) -> Result<()> {
        let existing = find_required::<AwardEntity>(self.pool.write(), id, Self::RESOURCE).await?;

        let mut award: AwardActiveModel = existing.into();
        award.is_active = Set(false);
        award.updated_at = Set(now());
        award.update(self.pool.write()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(body: serde_json::Value) -> CreateAward {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_award_amount_must_not_be_negative() {
        let negative = request(json!({"contract_number": "W91-24-C-0001", "award_amount": -10.5}));
        assert!(validate_request(&negative).is_err());

        let positive = request(json!({"contract_number": "W91-24-C-0001", "award_amount": 1250000.00}));
        assert!(validate_request(&positive).is_ok());
    }

    #[test]
    fn test_currency_is_three_letters() {
        let bad = request(json!({"contract_number": "W91-24-C-0001", "currency": "US"}));
        let err = validate_request(&bad).unwrap_err();
        assert!(matches!(err, AppError::Validation { field: Some(ref f), .. } if f == "currency"));
    }
}
