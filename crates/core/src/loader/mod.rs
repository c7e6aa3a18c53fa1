//! SAM.gov JSON export loader
//!
//! Reads an array of SAM.gov opportunity records and inserts the ones not
//! already present. Agencies are matched by name or created on the fly.
//! One bad record never aborts the file.

pub mod sam_gov;

pub use sam_gov::{parse_export, ParsedExport, SamGovOpportunity};

use crate::db::DbPool;
use crate::services::{AgencyService, CrudService, OpportunityService};
use athena_common::errors::{AppError, Result};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Per-file import counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub loaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl LoadSummary {
    pub fn total(&self) -> usize {
        self.loaded + self.skipped + self.failed
    }

    pub fn merge(&mut self, other: LoadSummary) {
        self.loaded += other.loaded;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

enum Outcome {
    Loaded,
    Skipped,
}

#[derive(Clone)]
pub struct SamGovLoader {
    opportunities: OpportunityService,
    agencies: AgencyService,
}

impl SamGovLoader {
    pub fn new(pool: DbPool) -> Self {
        Self {
            opportunities: OpportunityService::new(pool.clone()),
            agencies: AgencyService::new(pool),
        }
    }

    /// Load every record in a JSON export file
    pub async fn load_file(&self, path: &Path) -> Result<LoadSummary> {
        info!(path = %path.display(), "Loading SAM.gov export");

        let raw = tokio::fs::read(path).await.map_err(|e| AppError::InvalidFormat {
            message: format!("Failed to read {}: {}", path.display(), e),
        })?;
        let parsed = parse_export(&raw).map_err(|e| AppError::InvalidFormat {
            message: format!("Failed to parse {}: {}", path.display(), e),
        })?;

        debug!(
            path = %path.display(),
            count = parsed.records.len(),
            rejected = parsed.rejected,
            "Parsed SAM.gov records"
        );
        let mut summary = self.load_records(parsed.records).await?;
        summary.failed += parsed.rejected;
        Ok(summary)
    }

    pub async fn load_records(&self, records: Vec<SamGovOpportunity>) -> Result<LoadSummary> {
        let mut summary = LoadSummary::default();

        for record in records {
            match self.load_record(&record).await {
                Ok(Outcome::Loaded) => summary.loaded += 1,
                Ok(Outcome::Skipped) => summary.skipped += 1,
                Err(e) => {
                    error!(
                        notice_id = record.effective_notice_id().unwrap_or("-"),
                        error = %e,
                        "Failed to load opportunity"
                    );
                    summary.failed += 1;
                }
            }
        }

        info!(
            loaded = summary.loaded,
            skipped = summary.skipped,
            failed = summary.failed,
            "SAM.gov load finished"
        );
        Ok(summary)
    }

    async fn load_record(&self, record: &SamGovOpportunity) -> Result<Outcome> {
        let Some(notice_id) = record.effective_notice_id() else {
            debug!("Skipping record without notice id or solicitation number");
            return Ok(Outcome::Skipped);
        };

        if self.opportunities.exists_by_notice_id(notice_id).await? {
            debug!(notice_id, "Opportunity already exists");
            return Ok(Outcome::Skipped);
        }

        let agency_id = self.resolve_agency(record).await?;
        let Some(request) = record.to_create_request(agency_id) else {
            return Ok(Outcome::Skipped);
        };

        self.opportunities.create(request).await?;
        Ok(Outcome::Loaded)
    }

    async fn resolve_agency(&self, record: &SamGovOpportunity) -> Result<Option<Uuid>> {
        let Some(department) = record.department_name() else {
            return Ok(None);
        };
        let agency = self
            .agencies
            .find_or_create_by_name(department, record.sub_tier.as_deref())
            .await?;
        Ok(Some(agency.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::DatabaseConnection;

    #[tokio::test]
    async fn test_malformed_record_counts_as_failed() {
        let path = std::env::temp_dir().join(format!("athena-export-{}.json", Uuid::new_v4()));
        tokio::fs::write(
            &path,
            r#"[{"noticeId": "N1", "title": 42}, {"title": "No identifiers", "pointOfContact": null}]"#,
        )
        .await
        .unwrap();

        let loader = SamGovLoader::new(DbPool::from_connection(DatabaseConnection::Disconnected));
        let summary = loader.load_file(&path).await.unwrap();
        tokio::fs::remove_file(&path).await.unwrap();

        assert_eq!(
            summary,
            LoadSummary {
                loaded: 0,
                skipped: 1,
                failed: 1
            }
        );
    }

    #[tokio::test]
    async fn test_unparseable_file_is_invalid_format() {
        let path = std::env::temp_dir().join(format!("athena-export-{}.json", Uuid::new_v4()));
        tokio::fs::write(&path, "{ truncated").await.unwrap();

        let loader = SamGovLoader::new(DbPool::from_connection(DatabaseConnection::Disconnected));
        let err = loader.load_file(&path).await.unwrap_err();
        tokio::fs::remove_file(&path).await.unwrap();

        assert!(matches!(err, AppError::InvalidFormat { .. }));
    }

    #[test]
    fn test_summary_merge() {
        let mut total = LoadSummary::default();
        total.merge(LoadSummary {
            loaded: 3,
            skipped: 1,
            failed: 0,
        });
        total.merge(LoadSummary {
            loaded: 2,
            skipped: 0,
            failed: 1,
        });

        assert_eq!(
            total,
            LoadSummary {
                loaded: 5,
                skipped: 1,
                failed: 1
            }
        );
        assert_eq!(total.total(), 7);
    }
}
