//! SeaORM entity models

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

pub use agency::{ActiveModel as AgencyActiveModel, Column as AgencyColumn, Entity as AgencyEntity, Model as Agency};
pub use alert::{ActiveModel as AlertActiveModel, Column as AlertColumn, Entity as AlertEntity, Model as Alert};
pub use attachment::{
    ActiveModel as AttachmentActiveModel, Column as AttachmentColumn, Entity as AttachmentEntity, Model as Attachment,
};
pub use award::{ActiveModel as AwardActiveModel, Column as AwardColumn, Entity as AwardEntity, Model as Award};
pub use competitor_intel::{
    ActiveModel as CompetitorIntelActiveModel, Column as CompetitorIntelColumn, Entity as CompetitorIntelEntity,
    Model as CompetitorIntel,
};
pub use contact::{ActiveModel as ContactActiveModel, Column as ContactColumn, Entity as ContactEntity, Model as Contact};
pub use contract_vehicle::{
    ActiveModel as ContractVehicleActiveModel, Column as ContractVehicleColumn, Entity as ContractVehicleEntity,
    Model as ContractVehicle,
};
pub use historical_data::{
    ActiveModel as HistoricalDataActiveModel, Column as HistoricalDataColumn, Entity as HistoricalDataEntity,
    Model as HistoricalData,
};
pub use naics::{ActiveModel as NaicsActiveModel, Column as NaicsColumn, Entity as NaicsEntity, Model as Naics};
pub use notice_type::{
    ActiveModel as NoticeTypeActiveModel, Column as NoticeTypeColumn, Entity as NoticeTypeEntity, Model as NoticeType,
};
pub use opportunity::{
    ActiveModel as OpportunityActiveModel, Column as OpportunityColumn, Entity as OpportunityEntity,
    Model as Opportunity,
};
pub use opportunity_score::{
    ActiveModel as OpportunityScoreActiveModel, Column as OpportunityScoreColumn, Entity as OpportunityScoreEntity,
    Model as OpportunityScore, SCORE_TYPE_AI,
};
pub use organization::{
    ActiveModel as OrganizationActiveModel, Column as OrganizationColumn, Entity as OrganizationEntity,
    Model as Organization,
};
pub use saved_search::{
    ActiveModel as SavedSearchActiveModel, Column as SavedSearchColumn, Entity as SavedSearchEntity,
    Model as SavedSearch,
};
pub use set_aside::{ActiveModel as SetAsideActiveModel, Column as SetAsideColumn, Entity as SetAsideEntity, Model as SetAside};
pub use sync_log::{
    ActiveModel as SyncLogActiveModel, Column as SyncLogColumn, Entity as SyncLogEntity, Model as SyncLog, SyncStatus,
};
pub use team::{ActiveModel as TeamActiveModel, Column as TeamColumn, Entity as TeamEntity, Model as Team};
pub use team_member::{
    ActiveModel as TeamMemberActiveModel, Column as TeamMemberColumn, Entity as TeamMemberEntity, Model as TeamMember,
};
pub use user::{ActiveModel as UserActiveModel, Column as UserColumn, Entity as UserEntity, Model as User};
