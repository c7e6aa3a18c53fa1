//! Teaming and competitive intelligence: organizations, contacts,
//! competitor intel, historical data, capture teams and their members

use super::crud;
use crate::AppState;
use athena_common::{auth::AuthContext, errors::Result};
use athena_core::db::models::{CompetitorIntel, Contact, HistoricalData, Organization, Team, TeamMember};
use athena_core::services::{
    CompetitorIntelService, ContactService, HistoricalDataService, OrganizationService, TeamMemberService,
    TeamService,
};
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct NameQuery {
    pub name: String,
}

/// Inclusive `[start, end]` window of RFC 3339 timestamps
#[derive(Debug, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

pub fn organization_routes() -> Router<AppState> {
    crud::routes::<OrganizationService>()
        .route("/uei/{uei}", get(organization_by_uei))
        .route("/cage/{cage_code}", get(organization_by_cage))
        .route("/search", get(search_organizations))
        .route("/naics/{naics}", get(organizations_by_naics))
        .route("/small-business", get(small_businesses))
}

pub fn contact_routes() -> Router<AppState> {
    crud::routes::<ContactService>()
        .route("/email/{email}", get(contact_by_email))
        .route("/organization/{id}", get(contacts_for_organization))
        .route("/organization/{id}/primary", get(primary_for_organization))
        .route("/agency/{id}", get(contacts_for_agency))
        .route("/agency/{id}/primary", get(primary_for_agency))
        .route("/opportunity/{id}", get(contacts_for_opportunity))
        .route("/opportunity/{id}/primary", get(primary_for_opportunity))
        .route("/type/{contact_type}", get(contacts_by_type))
}

pub fn competitor_intel_routes() -> Router<AppState> {
    crud::routes::<CompetitorIntelService>()
        .route("/opportunity/{id}", get(intel_for_opportunity))
        .route("/organization/{id}", get(intel_for_organization))
        .route("/likelihood/{likelihood}", get(intel_by_likelihood))
}

pub fn historical_data_routes() -> Router<AppState> {
    crud::routes::<HistoricalDataService>()
        .route("/entity/{id}", get(history_for_entity_id))
        .route("/entity-type/{entity_type}/entity/{id}", get(history_for_entity))
        .route("/data-type/{data_type}", get(history_by_data_type))
        .route("/date-range", get(history_in_range))
        .route("/entity-type/{entity_type}", get(history_by_entity_type))
}

pub fn team_routes() -> Router<AppState> {
    crud::routes::<TeamService>()
        .route("/lead-organization/{id}", get(teams_led_by))
        .route("/opportunity/{id}", get(teams_for_opportunity))
        .route("/status/{status}", get(teams_by_status))
        .route("/created-by/{id}", get(teams_created_by))
}

pub fn team_member_routes() -> Router<AppState> {
    crud::routes::<TeamMemberService>()
        .route("/team/{id}", get(members_of_team))
        .route("/organization/{id}", get(memberships_of_organization))
        .route("/team/{id}/prime-contractors", get(prime_contractors))
}

async fn organization_by_uei(
    State(service): State<OrganizationService>,
    _auth: AuthContext,
    Path(uei): Path<String>,
) -> Result<Json<Organization>> {
    Ok(Json(service.find_by_uei(&uei).await?))
}

async fn organization_by_cage(
    State(service): State<OrganizationService>,
    _auth: AuthContext,
    Path(cage_code): Path<String>,
) -> Result<Json<Organization>> {
    Ok(Json(service.find_by_cage_code(&cage_code).await?))
}

async fn search_organizations(
    State(service): State<OrganizationService>,
    _auth: AuthContext,
    Query(query): Query<NameQuery>,
) -> Result<Json<Vec<Organization>>> {
    Ok(Json(service.search_by_name(&query.name).await?))
}

async fn organizations_by_naics(
    State(service): State<OrganizationService>,
    _auth: AuthContext,
    Path(naics): Path<String>,
) -> Result<Json<Vec<Organization>>> {
    Ok(Json(service.find_by_primary_naics(&naics).await?))
}

async fn small_businesses(
    State(service): State<OrganizationService>,
    _auth: AuthContext,
) -> Result<Json<Vec<Organization>>> {
    Ok(Json(service.find_small_businesses().await?))
}

async fn contact_by_email(
    State(service): State<ContactService>,
    _auth: AuthContext,
    Path(email): Path<String>,
) -> Result<Json<Contact>> {
    Ok(Json(service.find_by_email(&email).await?))
}

async fn contacts_for_organization(
    State(service): State<ContactService>,
    _auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Contact>>> {
    Ok(Json(service.find_by_organization(id).await?))
}

async fn primary_for_organization(
    State(service): State<ContactService>,
    _auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Contact>> {
    Ok(Json(service.find_primary_by_organization(id).await?))
}

async fn contacts_for_agency(
    State(service): State<ContactService>,
    _auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Contact>>> {
    Ok(Json(service.find_by_agency(id).await?))
}

async fn primary_for_agency(
    State(service): State<ContactService>,
    _auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Contact>> {
    Ok(Json(service.find_primary_by_agency(id).await?))
}

async fn contacts_for_opportunity(
    State(service): State<ContactService>,
    _auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Contact>>> {
    Ok(Json(service.find_by_opportunity(id).await?))
}

async fn primary_for_opportunity(
    State(service): State<ContactService>,
    _auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Contact>> {
    Ok(Json(service.find_primary_by_opportunity(id).await?))
}

async fn contacts_by_type(
    State(service): State<ContactService>,
    _auth: AuthContext,
    Path(contact_type): Path<String>,
) -> Result<Json<Vec<Contact>>> {
    Ok(Json(service.find_by_type(&contact_type).await?))
}

async fn intel_for_opportunity(
    State(service): State<CompetitorIntelService>,
    _auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<CompetitorIntel>>> {
    Ok(Json(service.find_by_opportunity(id).await?))
}

async fn intel_for_organization(
    State(service): State<CompetitorIntelService>,
    _auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<CompetitorIntel>>> {
    Ok(Json(service.find_by_organization(id).await?))
}

async fn intel_by_likelihood(
    State(service): State<CompetitorIntelService>,
    _auth: AuthContext,
    Path(likelihood): Path<String>,
) -> Result<Json<Vec<CompetitorIntel>>> {
    Ok(Json(service.find_by_likelihood(&likelihood).await?))
}

async fn history_for_entity_id(
    State(service): State<HistoricalDataService>,
    _auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<HistoricalData>>> {
    Ok(Json(service.find_by_entity_id(id).await?))
}

async fn history_for_entity(
    State(service): State<HistoricalDataService>,
    _auth: AuthContext,
    Path((entity_type, id)): Path<(String, Uuid)>,
) -> Result<Json<Vec<HistoricalData>>> {
    Ok(Json(service.find_by_entity(&entity_type, id).await?))
}

async fn history_by_data_type(
    State(service): State<HistoricalDataService>,
    _auth: AuthContext,
    Path(data_type): Path<String>,
) -> Result<Json<Vec<HistoricalData>>> {
    Ok(Json(service.find_by_data_type(&data_type).await?))
}

async fn history_in_range(
    State(service): State<HistoricalDataService>,
    _auth: AuthContext,
    Query(range): Query<TimeRange>,
) -> Result<Json<Vec<HistoricalData>>> {
    Ok(Json(service.find_by_captured_between(range.start, range.end).await?))
}

async fn history_by_entity_type(
    State(service): State<HistoricalDataService>,
    _auth: AuthContext,
    Path(entity_type): Path<String>,
) -> Result<Json<Vec<HistoricalData>>> {
    Ok(Json(service.find_by_entity_type(&entity_type).await?))
}

async fn teams_led_by(
    State(service): State<TeamService>,
    _auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Team>>> {
    Ok(Json(service.find_by_lead_organization(id).await?))
}

async fn teams_for_opportunity(
    State(service): State<TeamService>,
    _auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Team>>> {
    Ok(Json(service.find_by_opportunity(id).await?))
}

async fn teams_by_status(
    State(service): State<TeamService>,
    _auth: AuthContext,
    Path(status): Path<String>,
) -> Result<Json<Vec<Team>>> {
    Ok(Json(service.find_by_status(&status).await?))
}

async fn teams_created_by(
    State(service): State<TeamService>,
    _auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Team>>> {
    Ok(Json(service.find_by_created_by(id).await?))
}

async fn members_of_team(
    State(service): State<TeamMemberService>,
    _auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<TeamMember>>> {
    Ok(Json(service.find_by_team(id).await?))
}

async fn memberships_of_organization(
    State(service): State<TeamMemberService>,
    _auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<TeamMember>>> {
    Ok(Json(service.find_by_organization(id).await?))
}

async fn prime_contractors(
    State(service): State<TeamMemberService>,
    _auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<TeamMember>>> {
    Ok(Json(service.find_prime_contractors(id).await?))
}
