//! Audit record of a data sync or scheduled job run

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sync run status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncStatus {
    Running,
    Success,
    Failed,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Running => "RUNNING",
            SyncStatus::Success => "SUCCESS",
            SyncStatus::Failed => "FAILED",
        }
    }
}

impl From<String> for SyncStatus {
    fn from(s: String) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "SUCCESS" => SyncStatus::Success,
            "FAILED" => SyncStatus::Failed,
            _ => SyncStatus::Running,
        }
    }
}

impl From<SyncStatus> for String {
    fn from(status: SyncStatus) -> Self {
        status.as_str().to_string()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sync_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub sync_type: String,

    pub status: String,

    pub started_at: DateTimeWithTimeZone,

    pub completed_at: Option<DateTimeWithTimeZone>,

    pub records_processed: Option<i32>,

    pub error_count: Option<i32>,

    #[sea_orm(column_type = "Text", nullable)]
    pub error_log: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    pub fn sync_status(&self) -> SyncStatus {
        SyncStatus::from(self.status.clone())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
