//! Opportunities and the records hanging off them: scores, attachments
//! and awards

use super::crud;
use crate::AppState;
use athena_common::{auth::AuthContext, errors::Result};
use athena_core::db::models::{Attachment, Award, Opportunity, OpportunityScore};
use athena_core::services::{AttachmentService, AwardService, OpportunityScoreService, OpportunityService};
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct PostedAfterQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct ExpiringBeforeQuery {
    pub deadline: DateTime<FixedOffset>,
}

#[derive(Debug, Deserialize)]
pub struct UpcomingQuery {
    pub days_ahead: i64,
}

#[derive(Debug, Deserialize)]
pub struct TitleQuery {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct AwardDateRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

pub fn opportunity_routes() -> Router<AppState> {
    crud::routes::<OpportunityService>()
        .route("/notice/{notice_id}", get(by_notice_id))
        .route("/active", get(active))
        .route("/naics/{code}", get(by_naics))
        .route("/notice-type/{notice_type}", get(by_notice_type))
        .route("/agency/{id}", get(by_agency))
        .route("/posted-after", get(posted_after))
        .route("/expiring-before", get(expiring_before))
        .route("/upcoming-deadlines", get(upcoming_deadlines))
        .route("/search", get(search))
}

pub fn score_routes() -> Router<AppState> {
    crud::routes::<OpportunityScoreService>()
        .route("/opportunity/{id}", get(scores_for_opportunity))
        .route("/type/{score_type}", get(scores_by_type))
        .route("/opportunity/{id}/type/{score_type}/latest", get(latest_score))
}

pub fn attachment_routes() -> Router<AppState> {
    crud::routes::<AttachmentService>()
        .route("/opportunity/{id}", get(attachments_for_opportunity))
        .route("/type/{attachment_type}", get(attachments_by_type))
        .route("/sam/{sam_attachment_id}", get(attachment_by_sam_id))
}

pub fn award_routes() -> Router<AppState> {
    crud::routes::<AwardService>()
        .route("/contract/{contract_number}", get(award_by_contract))
        .route("/active", get(active_awards))
        .route("/date-range", get(awards_in_range))
        .route("/naics/{code}", get(awards_by_naics))
        .route("/awardee/{uei}", get(awards_by_awardee))
}

async fn by_notice_id(
    State(service): State<OpportunityService>,
    _auth: AuthContext,
    Path(notice_id): Path<String>,
) -> Result<Json<Opportunity>> {
    Ok(Json(service.find_by_notice_id(&notice_id).await?))
}

async fn active(State(service): State<OpportunityService>, _auth: AuthContext) -> Result<Json<Vec<Opportunity>>> {
    Ok(Json(service.find_active().await?))
}

async fn by_naics(
    State(service): State<OpportunityService>,
    _auth: AuthContext,
    Path(code): Path<String>,
) -> Result<Json<Vec<Opportunity>>> {
    Ok(Json(service.find_by_naics(&code).await?))
}

async fn by_notice_type(
    State(service): State<OpportunityService>,
    _auth: AuthContext,
    Path(notice_type): Path<String>,
) -> Result<Json<Vec<Opportunity>>> {
    Ok(Json(service.find_by_notice_type(&notice_type).await?))
}

async fn by_agency(
    State(service): State<OpportunityService>,
    _auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Opportunity>>> {
    Ok(Json(service.find_by_agency(id).await?))
}

async fn posted_after(
    State(service): State<OpportunityService>,
    _auth: AuthContext,
    Query(query): Query<PostedAfterQuery>,
) -> Result<Json<Vec<Opportunity>>> {
    Ok(Json(service.find_posted_after(query.date).await?))
}

async fn expiring_before(
    State(service): State<OpportunityService>,
    _auth: AuthContext,
    Query(query): Query<ExpiringBeforeQuery>,
) -> Result<Json<Vec<Opportunity>>> {
    Ok(Json(service.find_expiring_before(query.deadline).await?))
}

async fn upcoming_deadlines(
    State(service): State<OpportunityService>,
    _auth: AuthContext,
    Query(query): Query<UpcomingQuery>,
) -> Result<Json<Vec<Opportunity>>> {
    Ok(Json(service.find_upcoming_deadlines(query.days_ahead).await?))
}

async fn search(
    State(service): State<OpportunityService>,
    _auth: AuthContext,
    Query(query): Query<TitleQuery>,
) -> Result<Json<Vec<Opportunity>>> {
    Ok(Json(service.search_by_title(&query.title).await?))
}

async fn scores_for_opportunity(
    State(service): State<OpportunityScoreService>,
    _auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<OpportunityScore>>> {
    Ok(Json(service.find_by_opportunity(id).await?))
}

async fn scores_by_type(
    State(service): State<OpportunityScoreService>,
    _auth: AuthContext,
    Path(score_type): Path<String>,
) -> Result<Json<Vec<OpportunityScore>>> {
    Ok(Json(service.find_by_score_type(&score_type).await?))
}

async fn latest_score(
    State(service): State<OpportunityScoreService>,
    _auth: AuthContext,
    Path((id, score_type)): Path<(Uuid, String)>,
) -> Result<Json<OpportunityScore>> {
    Ok(Json(service.find_latest(id, &score_type).await?))
}

async fn attachments_for_opportunity(
    State(service): State<AttachmentService>,
    _auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Attachment>>> {
    Ok(Json(service.find_by_opportunity(id).await?))
}

async fn attachments_by_type(
    State(service): State<AttachmentService>,
    _auth: AuthContext,
    Path(attachment_type): Path<String>,
) -> Result<Json<Vec<Attachment>>> {
    Ok(Json(service.find_by_type(&attachment_type).await?))
}

async fn attachment_by_sam_id(
    State(service): State<AttachmentService>,
    _auth: AuthContext,
    Path(sam_attachment_id): Path<String>,
) -> Result<Json<Attachment>> {
    Ok(Json(service.find_by_sam_attachment_id(&sam_attachment_id).await?))
}

async fn award_by_contract(
    State(service): State<AwardService>,
    _auth: AuthContext,
    Path(contract_number): Path<String>,
) -> Result<Json<Award>> {
    Ok(Json(service.find_by_contract_number(&contract_number).await?))
}

async fn active_awards(State(service): State<AwardService>, _auth: AuthContext) -> Result<Json<Vec<Award>>> {
    Ok(Json(service.find_active().await?))
}

async fn awards_in_range(
    State(service): State<AwardService>,
    _auth: AuthContext,
    Query(range): Query<AwardDateRange>,
) -> Result<Json<Vec<Award>>> {
    Ok(Json(
        service
            .find_by_award_date_between(range.start_date, range.end_date)
            .await?,
    ))
}

async fn awards_by_naics(
    State(service): State<AwardService>,
    _auth: AuthContext,
    Path(code): Path<String>,
) -> Result<Json<Vec<Award>>> {
    Ok(Json(service.find_by_naics(&code).await?))
}

async fn awards_by_awardee(
    State(service): State<AwardService>,
    _auth: AuthContext,
    Path(uei): Path<String>,
) -> Result<Json<Vec<Award>>> {
    Ok(Json(service.find_by_awardee_uei(&uei).await?))
}
