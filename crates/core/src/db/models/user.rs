//! Platform user

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub email: String,

    #[sea_orm(unique)]
    pub username: String,

    /// Argon2 PHC string; never leaves the service layer
    #[serde(skip_serializing, default)]
    #[sea_orm(column_type = "Text")]
    pub password_hash: String,

    pub first_name: Option<String>,

    pub last_name: Option<String>,

    pub is_active: bool,

    pub is_admin: bool,

    pub last_login_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::alert::Entity")]
    Alerts,
}

impl Related<super::alert::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Alerts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_password_hash_not_serialized() {
        let now = Utc::now().into();
        let user = Model {
            id: Uuid::new_v4(),
            email: "analyst@example.com".into(),
            username: "analyst".into(),
            password_hash: "$argon2id$v=19$secret".into(),
            first_name: None,
            last_name: None,
            is_active: true,
            is_admin: false,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "analyst");
    }
}
