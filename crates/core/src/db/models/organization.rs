//! Contractor / vendor organization

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "organizations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub name: String,

    /// SAM.gov Unique Entity Identifier
    #[sea_orm(unique)]
    pub uei: Option<String>,

    pub cage_code: Option<String>,

    pub duns: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub sam_url: Option<String>,

    pub primary_naics: Option<String>,

    pub business_type: Option<String>,

    pub is_small_business: bool,

    pub is_woman_owned: bool,

    pub is_veteran_owned: bool,

    pub is_8a_certified: bool,

    #[sea_orm(column_type = "Text", nullable)]
    pub street_address: Option<String>,

    pub city: Option<String>,

    pub state_code: Option<String>,

    pub zip_code: Option<String>,

    pub country_code: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub website_url: Option<String>,

    pub phone: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
