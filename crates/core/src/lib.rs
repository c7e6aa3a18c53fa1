//! Athena domain core
//!
//! - `db`: SeaORM entities, connection pool, migrations and query helpers
//! - `services`: one CRUD + finder service per entity
//! - `clients`: Claude, Microsoft Teams and SMTP email integrations
//! - `loader`: SAM.gov JSON export import

pub mod clients;
pub mod db;
pub mod loader;
pub mod services;

pub use db::DbPool;
pub use loader::{LoadSummary, SamGovLoader};
pub use services::{CrudService, Services};
