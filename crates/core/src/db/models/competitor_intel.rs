//! Competitive intelligence on an organization for an opportunity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "competitor_intel")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub organization_id: Uuid,

    pub opportunity_id: Uuid,

    /// e.g. HIGH / MEDIUM / LOW
    pub likelihood: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub strengths: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub weaknesses: Option<String>,

    pub source: String,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
