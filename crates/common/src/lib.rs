//! Athena Common Library
//!
//! Shared code for the Athena API and task runner including:
//! - Error types and handling
//! - Configuration management
//! - Authentication utilities
//! - Pagination and validation helpers
//! - Metrics and observability
//! - Redis access

pub mod auth;
pub mod cache;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod pagination;
pub mod validation;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::{AppError, Result};
pub use pagination::{Page, PageRequest};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
