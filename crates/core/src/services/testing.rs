//! Mock-database fixtures for service tests

use super::now;
use crate::db::models::{Agency, Contact, Opportunity, User};
use crate::db::DbPool;
use sea_orm::{DatabaseConnection, DbBackend, MockDatabase, MockExecResult, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

pub fn postgres() -> MockDatabase {
    MockDatabase::new(DbBackend::Postgres)
}

pub fn pool(db: MockDatabase) -> DbPool {
    DbPool::from_connection(db.into_connection())
}

/// Row answering a `.count()` query
pub fn count_row(n: i64) -> BTreeMap<&'static str, Value> {
    BTreeMap::from([("num_items", Value::BigInt(Some(n)))])
}

pub fn rows_affected(n: u64) -> MockExecResult {
    MockExecResult {
        last_insert_id: 0,
        rows_affected: n,
    }
}

/// Every statement the pool ran, with identifier quotes unescaped
pub fn executed_sql(pool: DbPool) -> String {
    let connection: DatabaseConnection = pool.primary;
    format!("{:?}", connection.into_transaction_log()).replace("\\\"", "\"")
}

pub fn opportunity(notice_id: &str) -> Opportunity {
    let timestamp = now();
    Opportunity {
        id: Uuid::new_v4(),
        notice_id: notice_id.to_string(),
        title: "Cloud migration support".to_string(),
        solicitation_number: None,
        agency_id: None,
        office_name: None,
        notice_type: "Solicitation".to_string(),
        base_type: None,
        archive_type: None,
        archive_date: None,
        naics_code: Some("541512".to_string()),
        classification_code: None,
        set_aside: None,
        posted_date: None,
        response_deadline: None,
        description: None,
        additional_info_link: None,
        ui_link: None,
        point_of_contact: None,
        place_of_performance_city: None,
        place_of_performance_state: None,
        place_of_performance_zip: None,
        place_of_performance_country: Some("USA".to_string()),
        is_active: true,
        created_at: timestamp,
        updated_at: timestamp,
    }
}

pub fn agency(name: &str) -> Agency {
    let timestamp = now();
    Agency {
        id: Uuid::new_v4(),
        name: name.to_string(),
        abbreviation: None,
        parent_agency_id: None,
        department: None,
        tier: None,
        is_active: true,
        created_at: timestamp,
        updated_at: timestamp,
    }
}

pub fn contact(email: &str) -> Contact {
    let timestamp = now();
    Contact {
        id: Uuid::new_v4(),
        first_name: Some("Dana".to_string()),
        last_name: Some("Reyes".to_string()),
        full_name: Some("Dana Reyes".to_string()),
        email: Some(email.to_string()),
        phone: None,
        title: Some("Contracting Officer".to_string()),
        organization_id: None,
        agency_id: None,
        opportunity_id: None,
        contact_type: Some("primary".to_string()),
        is_primary: true,
        created_at: timestamp,
        updated_at: timestamp,
    }
}

pub fn user(username: &str, password_hash: &str) -> User {
    let timestamp = now();
    User {
        id: Uuid::new_v4(),
        email: format!("{}@athena.local", username),
        username: username.to_string(),
        password_hash: password_hash.to_string(),
        first_name: None,
        last_name: None,
        is_active: true,
        is_admin: false,
        last_login_at: None,
        created_at: timestamp,
        updated_at: timestamp,
    }
}
