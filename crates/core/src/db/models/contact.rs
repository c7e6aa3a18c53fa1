//! Point of contact for an organization, agency or opportunity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contacts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub first_name: Option<String>,

    pub last_name: Option<String>,

    pub full_name: Option<String>,

    pub email: Option<String>,

    pub phone: Option<String>,

    pub title: Option<String>,

    pub organization_id: Option<Uuid>,

    pub agency_id: Option<Uuid>,

    pub opportunity_id: Option<Uuid>,

    pub contact_type: Option<String>,

    pub is_primary: bool,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
