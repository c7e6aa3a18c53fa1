//! Contract opportunity entity (a SAM.gov notice)

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "opportunities")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub notice_id: String,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    pub solicitation_number: Option<String>,

    pub agency_id: Option<Uuid>,

    pub office_name: Option<String>,

    pub notice_type: String,

    pub base_type: Option<String>,

    pub archive_type: Option<String>,

    pub archive_date: Option<Date>,

    pub naics_code: Option<String>,

    pub classification_code: Option<String>,

    pub set_aside: Option<String>,

    pub posted_date: Option<Date>,

    pub response_deadline: Option<DateTimeWithTimeZone>,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub additional_info_link: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub ui_link: Option<String>,

    pub point_of_contact: Option<String>,

    pub place_of_performance_city: Option<String>,

    pub place_of_performance_state: Option<String>,

    pub place_of_performance_zip: Option<String>,

    pub place_of_performance_country: Option<String>,

    pub is_active: bool,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Whether responses are still being accepted at `now`
    pub fn is_open_at(&self, now: DateTimeWithTimeZone) -> bool {
        self.is_active && self.response_deadline.map_or(true, |deadline| deadline >= now)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::agency::Entity",
        from = "Column::AgencyId",
        to = "super::agency::Column::Id"
    )]
    Agency,

    #[sea_orm(has_many = "super::opportunity_score::Entity")]
    Scores,

    #[sea_orm(has_many = "super::attachment::Entity")]
    Attachments,
}

impl Related<super::agency::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Agency.def()
    }
}

impl Related<super::opportunity_score::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Scores.def()
    }
}

impl Related<super::attachment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attachments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
