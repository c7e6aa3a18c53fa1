//! Federal agency entity (departments, sub-tiers, offices)

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "agencies")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub name: String,

    pub abbreviation: Option<String>,

    pub parent_agency_id: Option<Uuid>,

    pub department: Option<String>,

    pub tier: Option<String>,

    pub is_active: bool,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentAgencyId",
        to = "Column::Id"
    )]
    Parent,

    #[sea_orm(has_many = "super::opportunity::Entity")]
    Opportunities,
}

impl Related<super::opportunity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Opportunities.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
