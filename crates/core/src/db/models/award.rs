//! Contract award entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "awards")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub opportunity_id: Option<Uuid>,

    #[sea_orm(unique)]
    pub contract_number: String,

    pub title: Option<String>,

    pub organization_id: Option<Uuid>,

    pub awardee_name: Option<String>,

    pub awardee_uei: Option<String>,

    pub awardee_duns: Option<String>,

    pub award_date: Option<Date>,

    #[sea_orm(column_type = "Decimal(Some((15, 2)))", nullable)]
    pub award_amount: Option<Decimal>,

    pub currency: String,

    pub start_date: Option<Date>,

    pub end_date: Option<Date>,

    pub agency_id: Option<Uuid>,

    pub awarding_office: Option<String>,

    pub award_type: Option<String>,

    pub naics_code: Option<String>,

    pub set_aside: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    pub is_active: bool,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
