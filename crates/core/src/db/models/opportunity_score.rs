//! Score attached to an opportunity (AI, manual, win probability...)

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Score type written by the Claude scoring job
pub const SCORE_TYPE_AI: &str = "AI";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "opportunity_scores")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub opportunity_id: Uuid,

    pub score_type: String,

    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub score_value: Decimal,

    #[sea_orm(column_type = "Decimal(Some((5, 2)))", nullable)]
    pub confidence: Option<Decimal>,

    pub scored_at: DateTimeWithTimeZone,

    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub metadata: Option<Json>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Rationale recorded by the scoring job, if any
    pub fn rationale(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.get("rationale"))
            .and_then(|r| r.as_str())
            .filter(|r| !r.trim().is_empty())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::opportunity::Entity",
        from = "Column::OpportunityId",
        to = "super::opportunity::Column::Id",
        on_delete = "Cascade"
    )]
    Opportunity,
}

impl Related<super::opportunity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Opportunity.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
