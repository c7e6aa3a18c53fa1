//! Request validation helpers built on `validator`

use crate::errors::{AppError, Result};
use validator::{Validate, ValidationError, ValidationErrors};

/// Validate a request DTO, mapping failures to `AppError::Validation`
pub fn validate_request<T: Validate>(request: &T) -> Result<()> {
    request.validate().map_err(into_app_error)
}

fn into_app_error(errors: ValidationErrors) -> AppError {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    let message = fields
        .iter()
        .map(|(field, errs)| {
            let reasons: Vec<String> = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            format!("{}: {}", field, reasons.join(", "))
        })
        .collect::<Vec<_>>()
        .join("; ");

    AppError::Validation {
        message,
        field: fields.first().map(|(field, _)| field.to_string()),
    }
}

/// Rejects empty or whitespace-only strings
pub fn not_blank(value: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("not_blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct Sample {
        #[validate(custom(function = "not_blank"), length(max = 10))]
        name: String,

        #[validate(email)]
        email: Option<String>,
    }

    #[test]
    fn test_valid_request() {
        let sample = Sample {
            name: "GSA".into(),
            email: Some("ops@gsa.gov".into()),
        };
        assert!(validate_request(&sample).is_ok());
    }

    #[test]
    fn test_blank_rejected() {
        let sample = Sample {
            name: "   ".into(),
            email: None,
        };
        match validate_request(&sample) {
            Err(AppError::Validation { message, field }) => {
                assert_eq!(field.as_deref(), Some("name"));
                assert!(message.contains("must not be blank"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_email_rejected() {
        let sample = Sample {
            name: "GSA".into(),
            email: Some("not-an-email".into()),
        };
        let err = validate_request(&sample).unwrap_err();
        assert!(err.to_string().contains("email"));
    }
}
