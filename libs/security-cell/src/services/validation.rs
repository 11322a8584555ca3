// =====================================================================================
// VALIDATION SERVICE - SCHEDULING INPUT VALIDATION
// =====================================================================================

use std::sync::OnceLock;

use chrono::NaiveTime;
use regex::Regex;
use tracing::debug;

use crate::models::ValidationIssue;

const TIME_OF_DAY_PATTERN: &str = r"^([0-1]?[0-9]|2[0-3]):([0-5][0-9])$";
const MAX_NOTES_LENGTH: usize = 2000;

fn time_of_day_regex() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(TIME_OF_DAY_PATTERN).ok())
        .as_ref()
}

pub struct ValidationService;

impl ValidationService {
    /// Parses a 24h `H:MM` / `HH:MM` string.
    pub fn parse_time_of_day(value: &str, field: &str) -> Result<NaiveTime, ValidationIssue> {
        let invalid = || ValidationIssue::InvalidTimeOfDay {
            field: field.to_string(),
            value: value.to_string(),
        };

        let captures = time_of_day_regex()
            .and_then(|re| re.captures(value.trim()))
            .ok_or_else(invalid)?;

        let hour: u32 = captures[1].parse().map_err(|_| invalid())?;
        let minute: u32 = captures[2].parse().map_err(|_| invalid())?;
        NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
    }

    /// Trimmed, non-empty text of bounded length.
    pub fn require_text(value: &str, field: &str) -> Result<String, ValidationIssue> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            debug!("Rejected empty {}", field);
            return Err(ValidationIssue::Required {
                field: field.to_string(),
            });
        }
        let length = trimmed.chars().count();
        if length > MAX_NOTES_LENGTH {
            return Err(ValidationIssue::ExceedsMaxLength {
                field: field.to_string(),
                max_length: MAX_NOTES_LENGTH,
                actual_length: length,
            });
        }
        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn accepts_single_and_double_digit_hours() {
        assert_eq!(
            ValidationService::parse_time_of_day("9:05", "start").unwrap(),
            NaiveTime::from_hms_opt(9, 5, 0).unwrap()
        );
        assert_eq!(
            ValidationService::parse_time_of_day("23:59", "end").unwrap(),
            NaiveTime::from_hms_opt(23, 59, 0).unwrap()
        );
    }

    #[test]
    fn rejects_out_of_range_times() {
        for bad in ["24:00", "12:60", "noon", "", "9"] {
            assert_matches!(
                ValidationService::parse_time_of_day(bad, "start"),
                Err(ValidationIssue::InvalidTimeOfDay { .. })
            );
        }
    }

    #[test]
    fn notes_must_not_be_blank() {
        assert_matches!(
            ValidationService::require_text("   ", "notes"),
            Err(ValidationIssue::Required { .. })
        );
        assert_eq!(ValidationService::require_text(" ok ", "notes").unwrap(), "ok");
    }
}
