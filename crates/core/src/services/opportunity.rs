//! Contract opportunity service

use super::{now, CrudService};
use crate::db::models::{AgencyEntity, Opportunity, OpportunityActiveModel, OpportunityColumn, OpportunityEntity};
use crate::db::query::{contains_ignore_case, fetch_page, find_required};
use crate::db::DbPool;
use async_trait::async_trait;
use athena_common::errors::{AppError, Result};
use athena_common::pagination::{Page, PageRequest};
use athena_common::validation::{not_blank, validate_request};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

pub const DEFAULT_COUNTRY: &str = "US";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOpportunity {
    #[validate(custom(function = "not_blank"), length(max = 255))]
    pub notice_id: String,

    #[validate(custom(function = "not_blank"))]
    pub title: String,

    #[validate(length(max = 255))]
    pub solicitation_number: Option<String>,

    pub agency_id: Option<Uuid>,

    #[validate(length(max = 500))]
    pub office_name: Option<String>,

    #[validate(custom(function = "not_blank"), length(max = 50))]
    pub notice_type: String,

    #[validate(length(max = 50))]
    pub base_type: Option<String>,

    #[validate(length(max = 50))]
    pub archive_type: Option<String>,

    pub archive_date: Option<NaiveDate>,

    #[validate(length(max = 6))]
    pub naics_code: Option<String>,

    #[validate(length(max = 10))]
    pub classification_code: Option<String>,

    #[validate(length(max = 100))]
    pub set_aside: Option<String>,

    pub posted_date: Option<NaiveDate>,

    pub response_deadline: Option<DateTimeWithTimeZone>,

    pub description: Option<String>,

    pub additional_info_link: Option<String>,

    pub ui_link: Option<String>,

    #[validate(length(max = 255))]
    pub point_of_contact: Option<String>,

    #[validate(length(max = 100))]
    pub place_of_performance_city: Option<String>,

    #[validate(length(max = 2))]
    pub place_of_performance_state: Option<String>,

    #[validate(length(max = 10))]
    pub place_of_performance_zip: Option<String>,

    #[validate(length(max = 2))]
    pub place_of_performance_country: Option<String>,

    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateOpportunity {
    #[validate(custom(function = "not_blank"), length(max = 255))]
    pub notice_id: Option<String>,

    #[validate(custom(function = "not_blank"))]
    pub title: Option<String>,

    #[validate(length(max = 255))]
    pub solicitation_number: Option<String>,

    pub agency_id: Option<Uuid>,

    #[validate(length(max = 500))]
    pub office_name: Option<String>,

    #[validate(custom(function = "not_blank"), length(max = 50))]
    pub notice_type: Option<String>,

    #[validate(length(max = 50))]
    pub base_type: Option<String>,

    #[validate(length(max = 50))]
    pub archive_type: Option<String>,

    pub archive_date: Option<NaiveDate>,

    #[validate(length(max = 6))]
    pub naics_code: Option<String>,

    #[validate(length(max = 10))]
    pub classification_code: Option<String>,

    #[validate(length(max = 100))]
    pub set_aside: Option<String>,

    pub posted_date: Option<NaiveDate>,

    pub response_deadline: Option<DateTimeWithTimeZone>,

    pub description: Option<String>,

    pub additional_info_link: Option<String>,

    pub ui_link: Option<String>,

    #[validate(length(max = 255))]
    pub point_of_contact: Option<String>,

    #[validate(length(max = 100))]
    pub place_of_performance_city: Option<String>,

    #[validate(length(max = 2))]
    pub place_of_performance_state: Option<String>,

    #[validate(length(max = 10))]
    pub place_of_performance_zip: Option<String>,

    #[validate(length(max = 2))]
    pub place_of_performance_country: Option<String>,

    pub is_active: Option<bool>,
}

#[derive(Clone)]
pub struct OpportunityService {
    pool: DbPool,
}

impl OpportunityService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_notice_id(&self, notice_id: &str) -> Result<Opportunity> {
        OpportunityEntity::find()
            .filter(OpportunityColumn::NoticeId.eq(notice_id))
            .one(self.pool.read())
            .await?
            .ok_or_else(|| AppError::not_found(Self::RESOURCE, notice_id))
    }

    pub async fn find_active(&self) -> Result<Vec<Opportunity>> {
        OpportunityEntity::find()
            .filter(OpportunityColumn::IsActive.eq(true))
            .order_by_desc(OpportunityColumn::PostedDate)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_naics(&self, naics_code: &str) -> Result<Vec<Opportunity>> {
        OpportunityEntity::find()
            .filter(OpportunityColumn::NaicsCode.eq(naics_code))
            .order_by_desc(OpportunityColumn::PostedDate)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_notice_type(&self, notice_type: &str) -> Result<Vec<Opportunity>> {
        OpportunityEntity::find()
            .filter(OpportunityColumn::NoticeType.eq(notice_type))
            .order_by_desc(OpportunityColumn::PostedDate)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_agency(&self, agency_id: Uuid) -> Result<Vec<Opportunity>> {
        OpportunityEntity::find()
            .filter(OpportunityColumn::AgencyId.eq(agency_id))
            .order_by_desc(OpportunityColumn::PostedDate)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    /// Opportunities posted strictly after `date`
    pub async fn find_posted_after(&self, date: NaiveDate) -> Result<Vec<Opportunity>> {
        OpportunityEntity::find()
            .filter(OpportunityColumn::PostedDate.gt(date))
            .order_by_desc(OpportunityColumn::PostedDate)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    /// Opportunities whose response deadline falls strictly before `instant`
    pub async fn find_expiring_before(&self, instant: DateTimeWithTimeZone) -> Result<Vec<Opportunity>> {
        OpportunityEntity::find()
            .filter(OpportunityColumn::ResponseDeadline.lt(instant))
            .order_by_asc(OpportunityColumn::ResponseDeadline)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    /// Active opportunities due within the next `days_ahead` days, soonest first
    pub async fn find_upcoming_deadlines(&self, days_ahead: i64) -> Result<Vec<Opportunity>> {
        let (start, end) = deadline_window(Utc::now(), days_ahead)?;

        OpportunityEntity::find()
            .filter(OpportunityColumn::IsActive.eq(true))
            .filter(OpportunityColumn::ResponseDeadline.between(start, end))
            .order_by_asc(OpportunityColumn::ResponseDeadline)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    pub async fn search_by_title(&self, title: &str) -> Result<Vec<Opportunity>> {
        OpportunityEntity::find()
            .filter(contains_ignore_case(OpportunityColumn::Title, title))
            .order_by_desc(OpportunityColumn::PostedDate)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    pub async fn exists_by_notice_id(&self, notice_id: &str) -> Result<bool> {
        let count = OpportunityEntity::find()
            .filter(OpportunityColumn::NoticeId.eq(notice_id))
            .count(self.pool.write())
            .await?;
        Ok(count > 0)
    }

    /// Opportunities created in `[from, to)`
    pub async fn count_created_between(&self, from: DateTimeWithTimeZone, to: DateTimeWithTimeZone) -> Result<u64> {
        OpportunityEntity::find()
            .filter(OpportunityColumn::CreatedAt.gte(from))
            .filter(OpportunityColumn::CreatedAt.lt(to))
            .count(self.pool.read())
            .await
            .map_err(Into::into)
    }

    /// One page of opportunities in scoring order (newest postings first)
    pub async fn find_for_scoring(&self, page: PageRequest) -> Result<Page<Opportunity>> {
        let select = OpportunityEntity::find()
            .order_by_desc(OpportunityColumn::PostedDate)
            .order_by_asc(OpportunityColumn::Id);
        fetch_page(self.pool.read(), select, &page).await
    }

    async fn ensure_notice_id_free(&self, notice_id: &str) -> Result<()> {
        if self.exists_by_notice_id(notice_id).await? {
            return Err(AppError::duplicate(Self::RESOURCE, "notice_id", notice_id));
        }
        Ok(())
    }

    async fn ensure_agency_exists(&self, agency_id: Option<Uuid>) -> Result<()> {
        if let Some(agency_id) = agency_id {
            find_required::<AgencyEntity>(self.pool.read(), agency_id, "Agency").await?;
        }
        Ok(())
    }
}

/// `[start, start + days_ahead]`; negative spans collapse to `[start, start]`
fn deadline_window(
    start: DateTime<Utc>,
    days_ahead: i64,
) -> Result<(DateTimeWithTimeZone, DateTimeWithTimeZone)> {
    let end = Duration::try_days(days_ahead.max(0))
        .and_then(|span| start.checked_add_signed(span))
        .ok_or_else(|| AppError::Validation {
            message: format!("days_ahead is out of range: {}", days_ahead),
            field: Some("days_ahead".to_string()),
        })?;
    Ok((start.into(), end.into()))
}

#[async_trait]
impl CrudService for OpportunityService {
    type Model = Opportunity;
    type Create = CreateOpportunity;
    type Update = UpdateOpportunity;

    const RESOURCE: &'static str = "Opportunity";

    async fn create(&self, request: CreateOpportunity) -> Result<Opportunity> {
        validate_request(&request)?;
        self.ensure_notice_id_free(&request.notice_id).await?;
        self.ensure_agency_exists(request.agency_id).await?;

        let timestamp = now();
        let opportunity = OpportunityActiveModel {
            id: Set(Uuid::new_v4()),
            notice_id: Set(request.notice_id),
            title: Set(request.title),
            solicitation_number: Set(request.solicitation_number),
            agency_id: Set(request.agency_id),
            office_name: Set(request.office_name),
            notice_type: Set(request.notice_type),
            base_type: Set(request.base_type),
            archive_type: Set(request.archive_type),
            archive_date: Set(request.archive_date),
            naics_code: Set(request.naics_code),
            classification_code: Set(request.classification_code),
            set_aside: Set(request.set_aside),
            posted_date: Set(request.posted_date),
            response_deadline: Set(request.response_deadline),
            description: Set(request.description),
            additional_info_link: Set(request.additional_info_link),
            ui_link: Set(request.ui_link),
            point_of_contact: Set(request.point_of_contact),
            place_of_performance_city: Set(request.place_of_performance_city),
            place_of_performance_state: Set(request.place_of_performance_state),
            place_of_performance_zip: Set(request.place_of_performance_zip),
            place_of_performance_country: Set(Some(
                request
                    .place_of_performance_country
                    .unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
            )),
            is_active: Set(request.is_active.unwrap_or(true)),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
        };

        let opportunity = opportunity.insert(self.pool.write()).await?;
        debug!(opportunity_id = %opportunity.id, notice_id = %opportunity.notice_id, "Created opportunity");
        Ok(opportunity)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Opportunity> {
        find_required::<OpportunityEntity>(self.pool.read(), id, Self::RESOURCE).await
    }

    async fn find_all(&self, page: PageRequest) -> Result<Page<Opportunity>> {
        let select = OpportunityEntity::find().order_by_desc(OpportunityColumn::CreatedAt);
        fetch_page(self.pool.read(), select, &page).await
    }

    async fn update(&self, id: Uuid, request: UpdateOpportunity) -> Result<Opportunity> {
        validate_request(&request)?;
        let existing = find_required::<OpportunityEntity>(self.pool.write(), id, Self::RESOURCE).await?;

        if let Some(ref notice_id) = request.notice_id {
            if *notice_id != existing.notice_id {
                self.ensure_notice_id_free(notice_id).await?;
            }
        }
        self.ensure_agency_exists(request.agency_id).await?;

        let mut opportunity: OpportunityActiveModel = existing.into();
        if let Some(notice_id) = request.notice_id {
            opportunity.notice_id = Set(notice_id);
        }
        if let Some(title) = request.title {
            opportunity.title = Set(title);
        }
        if let Some(solicitation_number) = request.solicitation_number {
            opportunity.solicitation_number = Set(Some(solicitation_number));
        }
        if let Some(agency_id) = request.agency_id {
            opportunity.agency_id = Set(Some(agency_id));
        }
        if let Some(office_name) = request.office_name {
            opportunity.office_name = Set(Some(office_name));
        }
        if let Some(notice_type) = request.notice_type {
            opportunity.notice_type = Set(notice_type);
        }
        if let Some(base_type) = request.base_type {
            opportunity.base_type = Set(Some(base_type));
        }
        if let Some(archive_type) = request.archive_type {
            opportunity.archive_type = Set(Some(archive_type));
        }
        if let Some(archive_date) = request.archive_date {
            opportunity.archive_date = Set(Some(archive_date));
        }
        if let Some(naics_code) = request.naics_code {
            opportunity.naics_code = Set(Some(naics_code));
        }
        if let Some(classification_code) = request.classification_code {
            opportunity.classification_code = Set(Some(classification_code));
        }
        if let Some(set_aside) = request.set_aside {
            opportunity.set_aside = Set(Some(set_aside));
        }
        if let Some(posted_date) = request.posted_date {
            opportunity.posted_date = Set(Some(posted_date));
        }
        if let Some(response_deadline) = request.response_deadline {
            opportunity.response_deadline = Set(Some(response_deadline));
        }
        if let Some(description) = request.description {
            opportunity.description = Set(Some(description));
        }
        if let Some(additional_info_link) = request.additional_info_link {
            opportunity.additional_info_link = Set(Some(additional_info_link));
        }
        if let Some(ui_link) = request.ui_link {
            opportunity.ui_link = Set(Some(ui_link));
        }
        if let Some(point_of_contact) = request.point_of_contact {
            opportunity.point_of_contact = Set(Some(point_of_contact));
        }
        if let Some(city) = request.place_of_performance_city {
            opportunity.place_of_performance_city = Set(Some(city));
        }
        if let Some(state) = request.place_of_performance_state {
            opportunity.place_of_performance_state = Set(Some(state));
        }
        if let Some(zip) = request.place_of_performance_zip {
            opportunity.place_of_performance_zip = Set(Some(zip));
        }
        if let Some(country) = request.place_of_performance_country {
            opportunity.place_of_performance_country = Set(Some(country));
        }
        if let Some(is_active) = request.is_active {
            opportunity.is_active = Set(is_active);
        }
        opportunity.updated_at = Set(now());

        opportunity.update(self.pool.write()).await.map_err(Into::into)
    }

    /// Soft delete
    async fn delete(&self, id: Uuid) -> Result<()> {
        let existing = find_required::<OpportunityEntity>(self.pool.write(), id, Self::RESOURCE).await?;

        let mut opportunity: OpportunityActiveModel = existing.into();
        opportunity.is_active = Set(false);
        opportunity.updated_at = Set(now());
        opportunity.update(self.pool.write()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing;
    use sea_orm::DatabaseConnection;
    use serde_json::json;

    #[test]
    fn test_deadline_window() {
        let start = Utc::now();
        let (from, to) = deadline_window(start, 7).unwrap();
        assert_eq!(to - from, Duration::days(7));

        let (from, to) = deadline_window(start, -3).unwrap();
        assert_eq!(from, to);
    }

    #[tokio::test]
    async fn test_huge_days_ahead_is_rejected_before_querying() {
        let service = OpportunityService::new(DbPool::from_connection(DatabaseConnection::Disconnected));

        let err = service.find_upcoming_deadlines(i64::MAX).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { field: Some(ref f), .. } if f == "days_ahead"));

        let err = service.find_upcoming_deadlines(300_000_000).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[test]
    fn test_create_requires_notice_type_and_title() {
        let request: CreateOpportunity = serde_json::from_value(json!({
            "notice_id": "abc123",
            "title": "",
            "notice_type": " "
        }))
        .unwrap();
        let err = validate_request(&request).unwrap_err();
        match err {
            AppError::Validation { message, field } => {
                assert_eq!(field.as_deref(), Some("notice_type"));
                assert!(message.contains("title"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_place_of_performance_limits() {
        let request: CreateOpportunity = serde_json::from_value(json!({
            "notice_id": "abc123",
            "title": "Cloud migration support",
            "notice_type": "Solicitation",
            "place_of_performance_state": "Virginia",
            "response_deadline": "2025-03-01T17:00:00Z"
        }))
        .unwrap();
        let err = validate_request(&request).unwrap_err();
        assert!(
            matches!(err, AppError::Validation { field: Some(ref f), .. } if f == "place_of_performance_state")
        );
    }

    #[tokio::test]
    async fn test_create_rejects_taken_notice_id() {
        let pool = testing::pool(testing::postgres().append_query_results([[testing::count_row(1)]]));
        let service = OpportunityService::new(pool.clone());

        let request: CreateOpportunity = serde_json::from_value(json!({
            "notice_id": "abc123",
            "title": "Cloud migration support",
            "notice_type": "Solicitation"
        }))
        .unwrap();
        let err = service.create(request).await.unwrap_err();
        assert!(matches!(err, AppError::Duplicate { ref field, ref value, .. } if field == "notice_id" && value == "abc123"));

        let sql = testing::executed_sql(pool);
        assert!(!sql.contains("INSERT"));
    }

    #[tokio::test]
    async fn test_update_rejects_another_rows_notice_id() {
        let pool = testing::pool(
            testing::postgres()
                .append_query_results([[testing::opportunity("abc123")]])
                .append_query_results([[testing::count_row(1)]]),
        );
        let service = OpportunityService::new(pool.clone());

        let request = UpdateOpportunity {
            notice_id: Some("taken-456".into()),
            ..Default::default()
        };
        let err = service.update(Uuid::new_v4(), request).await.unwrap_err();
        assert!(matches!(err, AppError::Duplicate { ref field, .. } if field == "notice_id"));
        assert!(!testing::executed_sql(pool).contains("UPDATE"));
    }

    #[tokio::test]
    async fn test_partial_update_touches_only_given_fields() {
        let existing = testing::opportunity("abc123");
        let mut updated = existing.clone();
        updated.title = "Zero trust architecture".into();

        let pool = testing::pool(
            testing::postgres()
                .append_query_results([[existing.clone()]])
                .append_query_results([[updated]]),
        );
        let service = OpportunityService::new(pool.clone());

        // Same notice id as before: no uniqueness lookup
        let request = UpdateOpportunity {
            notice_id: Some("abc123".into()),
            title: Some("Zero trust architecture".into()),
            ..Default::default()
        };
        let saved = service.update(existing.id, request).await.unwrap();
        assert_eq!(saved.title, "Zero trust architecture");
        assert_eq!(saved.naics_code, existing.naics_code);

        let sql = testing::executed_sql(pool);
        assert!(!sql.contains("COUNT"));
        assert!(sql.contains(r#""title" = $"#));
        assert!(sql.contains(r#""updated_at" = $"#));
        assert!(!sql.contains(r#""naics_code" = $"#));
        assert!(!sql.contains(r#""created_at" = $"#));
    }

    #[tokio::test]
    async fn test_missing_opportunity_is_not_found() {
        let pool = testing::pool(testing::postgres().append_query_results([Vec::<Opportunity>::new()]));
        let service = OpportunityService::new(pool);

        let err = service.find_by_id(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { ref resource_type, .. } if resource_type == "Opportunity"));
    }
}
