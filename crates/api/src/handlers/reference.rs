//! Reference data: agencies and the code tables (NAICS, notice types,
//! set-asides, contract vehicles)

use super::crud;
use crate::AppState;
use athena_common::{auth::AuthContext, errors::Result};
use athena_core::db::models::{Agency, ContractVehicle, Naics, NoticeType, SetAside};
use athena_core::services::{AgencyService, ContractVehicleService, NaicsService, NoticeTypeService, SetAsideService};
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct NameQuery {
    pub name: String,
}

pub fn agency_routes() -> Router<AppState> {
    crud::routes::<AgencyService>()
        .route("/abbreviation/{abbreviation}", get(agency_by_abbreviation))
        .route("/search", get(search_agencies))
        .route("/active", get(active_agencies))
        .route("/{id}/sub-agencies", get(sub_agencies))
        .route("/department/{department}", get(agencies_by_department))
}

pub fn naics_routes() -> Router<AppState> {
    crud::routes::<NaicsService>().route("/code/{code}", get(naics_by_code))
}

pub fn notice_type_routes() -> Router<AppState> {
    crud::routes::<NoticeTypeService>().route("/code/{code}", get(notice_type_by_code))
}

pub fn set_aside_routes() -> Router<AppState> {
    crud::routes::<SetAsideService>().route("/code/{code}", get(set_aside_by_code))
}

pub fn contract_vehicle_routes() -> Router<AppState> {
    crud::routes::<ContractVehicleService>().route("/code/{code}", get(contract_vehicle_by_code))
}

async fn agency_by_abbreviation(
    State(service): State<AgencyService>,
    _auth: AuthContext,
    Path(abbreviation): Path<String>,
) -> Result<Json<Agency>> {
    Ok(Json(service.find_by_abbreviation(&abbreviation).await?))
}

async fn search_agencies(
    State(service): State<AgencyService>,
    _auth: AuthContext,
    Query(query): Query<NameQuery>,
) -> Result<Json<Vec<Agency>>> {
    Ok(Json(service.search_by_name(&query.name).await?))
}

async fn active_agencies(State(service): State<AgencyService>, _auth: AuthContext) -> Result<Json<Vec<Agency>>> {
    Ok(Json(service.find_active().await?))
}

async fn sub_agencies(
    State(service): State<AgencyService>,
    _auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Agency>>> {
    Ok(Json(service.find_sub_agencies(id).await?))
}

async fn agencies_by_department(
    State(service): State<AgencyService>,
    _auth: AuthContext,
    Path(department): Path<String>,
) -> Result<Json<Vec<Agency>>> {
    Ok(Json(service.find_by_department(&department).await?))
}

async fn naics_by_code(
    State(service): State<NaicsService>,
    _auth: AuthContext,
    Path(code): Path<String>,
) -> Result<Json<Naics>> {
    Ok(Json(service.find_by_code(&code).await?))
}

async fn notice_type_by_code(
    State(service): State<NoticeTypeService>,
    _auth: AuthContext,
    Path(code): Path<String>,
) -> Result<Json<NoticeType>> {
    Ok(Json(service.find_by_code(&code).await?))
}

async fn set_aside_by_code(
    State(service): State<SetAsideService>,
    _auth: AuthContext,
    Path(code): Path<String>,
) -> Result<Json<SetAside>> {
    Ok(Json(service.find_by_code(&code).await?))
}

async fn contract_vehicle_by_code(
    State(service): State<ContractVehicleService>,
    _auth: AuthContext,
    Path(code): Path<String>,
) -> Result<Json<ContractVehicle>> {
    Ok(Json(service.find_by_code(&code).await?))
}
