//! Domain services
//!
//! One service per entity. Each owns its request DTOs, validation,
//! uniqueness checks, default values and finder queries. Every service
//! implements [`CrudService`] so the API can mount uniform CRUD routes.

pub mod agency;
pub mod alert;
pub mod attachment;
pub mod award;
pub mod competitor_intel;
pub mod contact;
pub mod contract_vehicle;
pub mod historical_data;
pub mod naics;
pub mod notice_type;
pub mod opportunity;
pub mod opportunity_score;
pub mod organization;
pub mod saved_search;
pub mod set_aside;
pub mod sync_log;
pub mod team;
pub mod team_member;
pub mod user;

#[cfg(test)]
pub(crate) mod testing;

pub use agency::AgencyService;
pub use alert::AlertService;
pub use attachment::AttachmentService;
pub use award::AwardService;
pub use competitor_intel::CompetitorIntelService;
pub use contact::ContactService;
pub use contract_vehicle::ContractVehicleService;
pub use historical_data::HistoricalDataService;
pub use naics::NaicsService;
pub use notice_type::NoticeTypeService;
pub use opportunity::OpportunityService;
pub use opportunity_score::OpportunityScoreService;
pub use organization::OrganizationService;
pub use saved_search::SavedSearchService;
pub use set_aside::SetAsideService;
pub use sync_log::SyncLogService;
pub use team::TeamService;
pub use team_member::TeamMemberService;
pub use user::UserService;

use crate::db::DbPool;
use async_trait::async_trait;
use athena_common::errors::Result;
use athena_common::pagination::{Page, PageRequest};
use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Uniform create/read/update/delete contract
#[async_trait]
pub trait CrudService: Clone + Send + Sync + 'static {
    /// Entity returned to callers
    type Model: Serialize + Send + Sync + 'static;

    /// Create request
    type Create: DeserializeOwned + Validate + Send + 'static;

    /// Partial update request; absent fields are left untouched
    type Update: DeserializeOwned + Validate + Send + 'static;

    /// Display name used in error messages
    const RESOURCE: &'static str;

    async fn create(&self, request: Self::Create) -> Result<Self::Model>;

    async fn find_by_id(&self, id: Uuid) -> Result<Self::Model>;

    async fn find_all(&self, page: PageRequest) -> Result<Page<Self::Model>>;

    async fn update(&self, id: Uuid, request: Self::Update) -> Result<Self::Model>;

    async fn delete(&self, id: Uuid) -> Result<()>;
}

/// All domain services, constructed from one pool
#[derive(Clone)]
pub struct Services {
    pub agencies: AgencyService,
    pub alerts: AlertService,
    pub attachments: AttachmentService,
    pub awards: AwardService,
    pub competitor_intel: CompetitorIntelService,
    pub contacts: ContactService,
    pub contract_vehicles: ContractVehicleService,
    pub historical_data: HistoricalDataService,
    pub naics: NaicsService,
    pub notice_types: NoticeTypeService,
    pub opportunities: OpportunityService,
    pub opportunity_scores: OpportunityScoreService,
    pub organizations: OrganizationService,
    pub saved_searches: SavedSearchService,
    pub set_asides: SetAsideService,
    pub sync_logs: SyncLogService,
    pub teams: TeamService,
    pub team_members: TeamMemberService,
    pub users: UserService,
}

impl Services {
    pub fn new(pool: DbPool) -> Self {
        Self {
            agencies: AgencyService::new(pool.clone()),
            alerts: AlertService::new(pool.clone()),
            attachments: AttachmentService::new(pool.clone()),
            awards: AwardService::new(pool.clone()),
            competitor_intel: CompetitorIntelService::new(pool.clone()),
            contacts: ContactService::new(pool.clone()),
            contract_vehicles: ContractVehicleService::new(pool.clone()),
            historical_data: HistoricalDataService::new(pool.clone()),
            naics: NaicsService::new(pool.clone()),
            notice_types: NoticeTypeService::new(pool.clone()),
            opportunities: OpportunityService::new(pool.clone()),
            opportunity_scores: OpportunityScoreService::new(pool.clone()),
            organizations: OrganizationService::new(pool.clone()),
            saved_searches: SavedSearchService::new(pool.clone()),
            set_asides: SetAsideService::new(pool.clone()),
            sync_logs: SyncLogService::new(pool.clone()),
            teams: TeamService::new(pool.clone()),
            team_members: TeamMemberService::new(pool.clone()),
            users: UserService::new(pool),
        }
    }
}

/// Current time as stored in `timestamptz` columns
pub(crate) fn now() -> DateTimeWithTimeZone {
    Utc::now().into()
}
