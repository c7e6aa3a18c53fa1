//! SAM.gov opportunity export format and its mapping onto `CreateOpportunity`

use crate::services::opportunity::{CreateOpportunity, DEFAULT_COUNTRY};
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

const DEFAULT_NOTICE_TYPE: &str = "Unknown";
const MAX_POINT_OF_CONTACT_LEN: usize = 255;

/// One record of a SAM.gov opportunities JSON export
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SamGovOpportunity {
    pub notice_id: Option<String>,
    pub solicitation_number: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub department: Option<String>,
    pub sub_tier: Option<String>,
    pub office: Option<String>,
    pub posted_date: Option<NaiveDate>,
    #[serde(rename = "responseDeadLine")]
    pub response_deadline: Option<NaiveDate>,
    pub naics_code: Option<String>,
    pub set_aside: Option<String>,
    #[serde(rename = "type")]
    pub notice_type: Option<String>,
    pub place_of_performance: Option<PlaceOfPerformance>,
    pub classification_code: Option<String>,
    pub active: Option<String>,
    pub archive: Option<String>,
    pub organization_type: Option<String>,
    pub additional_info_link: Option<String>,
    pub ui_link: Option<String>,
    /// Exports carry `null` here as often as `[]`
    pub point_of_contact: Option<Vec<PointOfContact>>,
}

/// Records of one export file, plus how many could not be read
#[derive(Debug, Default)]
pub struct ParsedExport {
    pub records: Vec<SamGovOpportunity>,
    pub rejected: usize,
}

/// Parse an export record by record. Only a file that is not a JSON
/// array fails as a whole; a malformed record is counted in `rejected`.
pub fn parse_export(raw: &[u8]) -> serde_json::Result<ParsedExport> {
    let values: Vec<Value> = serde_json::from_slice(raw)?;

    let mut parsed = ParsedExport::default();
    for (index, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<SamGovOpportunity>(value) {
            Ok(record) => parsed.records.push(record),
            Err(e) => {
                warn!(index, error = %e, "Rejected malformed SAM.gov record");
                parsed.rejected += 1;
            }
        }
    }
    Ok(parsed)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlaceOfPerformance {
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub zip: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PointOfContact {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub title: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl SamGovOpportunity {
    /// Notice id, falling back to the solicitation number
    pub fn effective_notice_id(&self) -> Option<&str> {
        non_empty(&self.notice_id).or_else(|| non_empty(&self.solicitation_number))
    }

    /// `active: "Yes"` in any case
    pub fn is_active(&self) -> bool {
        self.active
            .as_deref()
            .is_some_and(|value| value.trim().eq_ignore_ascii_case("yes"))
    }

    pub fn is_archived(&self) -> bool {
        self.archive
            .as_deref()
            .is_some_and(|value| value.trim().eq_ignore_ascii_case("yes"))
    }

    /// The agency name used for lookup, if any
    pub fn department_name(&self) -> Option<&str> {
        non_empty(&self.department)
    }

    /// Map onto a create request. `None` when the record has no usable id.
    pub fn to_create_request(&self, agency_id: Option<Uuid>) -> Option<CreateOpportunity> {
        let notice_id = self.effective_notice_id()?.to_string();
        let place = self.place_of_performance.clone().unwrap_or_default();
        let has_place = self.place_of_performance.is_some();

        Some(CreateOpportunity {
            notice_id,
            title: self.title.clone().unwrap_or_default(),
            solicitation_number: self.solicitation_number.clone(),
            agency_id,
            office_name: self.office.clone(),
            notice_type: non_empty(&self.notice_type)
                .unwrap_or(DEFAULT_NOTICE_TYPE)
                .to_string(),
            base_type: None,
            archive_type: self.is_archived().then(|| "archived".to_string()),
            archive_date: None,
            naics_code: self.naics_code.clone(),
            classification_code: self.classification_code.clone(),
            set_aside: self.set_aside.clone(),
            posted_date: self.posted_date,
            response_deadline: self.response_deadline.map(start_of_day_utc),
            description: self.description.clone(),
            additional_info_link: self.additional_info_link.clone(),
            ui_link: self.ui_link.clone(),
            point_of_contact: self.primary_contact(),
            place_of_performance_city: place.city,
            place_of_performance_state: place.state,
            place_of_performance_zip: place.zip,
            place_of_performance_country: if has_place {
                Some(place.country.unwrap_or_else(|| DEFAULT_COUNTRY.to_string()))
            } else {
                None
            },
            is_active: Some(self.is_active()),
        })
    }

    /// First contact's full name, or their email when no name is given
    fn primary_contact(&self) -> Option<String> {
        let contact = self.point_of_contact.as_deref()?.first()?;
        let value = non_empty(&contact.full_name).or_else(|| non_empty(&contact.email))?;
        Some(value.chars().take(MAX_POINT_OF_CONTACT_LEN).collect())
    }
}

/// Midnight UTC on `date`
pub fn start_of_day_utc(date: NaiveDate) -> DateTimeWithTimeZone {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)).fixed_offset()
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = r#"[
        {
            "noticeId": "abc123",
            "solicitationNumber": "W91-24-R-0001",
            "title": "Enterprise Cloud Migration",
            "department": "Department of Veterans Affairs",
            "subTier": "Veterans Health Administration",
            "office": "Technology Acquisition Center",
            "postedDate": "2026-10-01",
            "responseDeadLine": "2026-11-15",
            "naicsCode": "541512",
            "type": "Solicitation",
            "placeOfPerformance": {"city": "Austin", "state": "TX", "zip": "78701"},
            "active": "Yes",
            "archive": "No",
            "pointOfContact": [
                {"type": "primary", "fullName": "Jane Smith", "email": "jane.smith@va.gov"},
                {"type": "secondary", "fullName": "Bob Jones"}
            ],
            "someNewField": {"ignored": true}
        },
        {
            "solicitationNumber": "FA8732-25-Q-0042",
            "title": "Help desk support",
            "active": "no",
            "archive": "YES",
            "pointOfContact": [{"email": "co@us.af.mil"}]
        }
    ]"#;

    fn records() -> Vec<SamGovOpportunity> {
        serde_json::from_str(EXPORT).unwrap()
    }

    #[test]
    fn test_parses_export() {
        let records = records();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.notice_id.as_deref(), Some("abc123"));
        assert_eq!(first.notice_type.as_deref(), Some("Solicitation"));
        assert_eq!(first.response_deadline, NaiveDate::from_ymd_opt(2026, 11, 15));
        assert_eq!(first.point_of_contact.as_ref().map(Vec::len), Some(2));
        assert!(first.is_active());
    }

    #[test]
    fn test_maps_create_request() {
        let agency_id = Uuid::new_v4();
        let request = records()[0].to_create_request(Some(agency_id)).unwrap();

        assert_eq!(request.notice_id, "abc123");
        assert_eq!(request.agency_id, Some(agency_id));
        assert_eq!(request.notice_type, "Solicitation");
        assert_eq!(request.office_name.as_deref(), Some("Technology Acquisition Center"));
        assert_eq!(request.place_of_performance_country.as_deref(), Some("US"));
        assert_eq!(request.point_of_contact.as_deref(), Some("Jane Smith"));
        assert_eq!(request.archive_type, None);
        assert_eq!(request.is_active, Some(true));

        let deadline = request.response_deadline.unwrap();
        assert_eq!(deadline.to_rfc3339(), "2026-11-15T00:00:00+00:00");
    }

    #[test]
    fn test_fallbacks() {
        let request = records()[1].to_create_request(None).unwrap();

        assert_eq!(request.notice_id, "FA8732-25-Q-0042");
        assert_eq!(request.notice_type, "Unknown");
        assert_eq!(request.archive_type.as_deref(), Some("archived"));
        assert_eq!(request.is_active, Some(false));
        assert_eq!(request.point_of_contact.as_deref(), Some("co@us.af.mil"));
        assert_eq!(request.place_of_performance_country, None);
    }

    #[test]
    fn test_null_contacts_and_bad_records_do_not_reject_the_file() {
        let raw = br#"[
            {"noticeId": "N1", "title": "Null contacts", "pointOfContact": null, "type": null},
            {"noticeId": "N2", "title": 42},
            {"noticeId": "N3", "title": "Valid", "pointOfContact": [{"fullName": "Pat Lee"}]}
        ]"#;

        let parsed = parse_export(raw).unwrap();
        assert_eq!(parsed.rejected, 1);
        assert_eq!(parsed.records.len(), 2);

        let first = parsed.records[0].to_create_request(None).unwrap();
        assert_eq!(first.notice_id, "N1");
        assert_eq!(first.point_of_contact, None);
        assert_eq!(first.notice_type, "Unknown");

        let last = parsed.records[1].to_create_request(None).unwrap();
        assert_eq!(last.point_of_contact.as_deref(), Some("Pat Lee"));
    }

    #[test]
    fn test_non_array_export_is_an_error() {
        assert!(parse_export(br#"{"noticeId": "N1"}"#).is_err());
        assert!(parse_export(b"not json").is_err());
        assert_eq!(parse_export(b"[]").unwrap().records.len(), 0);
    }

    #[test]
    fn test_record_without_id_is_unusable() {
        let record = SamGovOpportunity {
            title: Some("No identifiers".to_string()),
            notice_id: Some("  ".to_string()),
            ..SamGovOpportunity::default()
        };
        assert!(record.effective_notice_id().is_none());
        assert!(record.to_create_request(None).is_none());
    }
}
