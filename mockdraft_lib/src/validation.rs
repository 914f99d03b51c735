use chrono::NaiveDate;

use crate::error::MockDraftError;

pub const MAX_NAME_LENGTH: usize = 100;
pub const MIN_DRAFT_YEAR: i32 = 1900;
pub const MAX_DRAFT_YEAR: i32 = 2100;

/// Enforce length, strip control chars, trim.
pub fn sanitize_text(input: &str, max_len: usize) -> Result<String, MockDraftError> {
    if input.len() > max_len {
        return Err(MockDraftError::InvalidInput(format!(
            "input exceeds maximum length of {} bytes",
            max_len
        )));
    }
    let sanitized: String = input
        .chars()
        .filter(|c| !c.is_ascii_control() || *c == ' ')
        .collect::<String>()
        .trim()
        .to_string();
    if sanitized.is_empty() {
        return Err(MockDraftError::InvalidInput(
            "input is empty after sanitization".to_string(),
        ));
    }
    Ok(sanitized)
}

/// Validate a league, team or prospect name.
pub fn validate_name(input: &str) -> Result<String, MockDraftError> {
    sanitize_text(input, MAX_NAME_LENGTH)
}

/// Optional free text (birth city, notes). Blank input reads as absent.
pub fn validate_optional_text(input: Option<&str>) -> Result<Option<String>, MockDraftError> {
    match input {
        Some(s) if !s.trim().is_empty() => sanitize_text(s, MAX_NAME_LENGTH).map(Some),
        _ => Ok(None),
    }
}

/// Validate a YYYY-MM-DD date string.
pub fn validate_date(input: &str) -> Result<NaiveDate, MockDraftError> {
    let trimmed = input.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|_| {
        MockDraftError::InvalidInput(format!(
            "invalid date '{}'. Expected format: YYYY-MM-DD (e.g., 2005-08-15)",
            trimmed
        ))
    })
}

pub fn validate_draft_year(year: i32) -> Result<i32, MockDraftError> {
    if !(MIN_DRAFT_YEAR..=MAX_DRAFT_YEAR).contains(&year) {
        return Err(MockDraftError::InvalidInput(format!(
            "draft year must be between {} and {}, got {}",
            MIN_DRAFT_YEAR, MAX_DRAFT_YEAR, year
        )));
    }
    Ok(year)
}

/// Normalize a position or handedness code: trimmed, uppercased, non-empty.
/// Whether the code exists is checked against the reference tables.
pub fn normalize_code(input: &str) -> Result<String, MockDraftError> {
    let code = input.trim().to_uppercase();
    if code.is_empty() || code.len() > 4 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(MockDraftError::InvalidInput(format!(
            "invalid code '{}'. Expected a short alphabetic code such as C, LW or R",
            input
        )));
    }
    Ok(code)
}

/// Height and weight must be positive.
pub fn validate_measurement(value: i32, what: &str) -> Result<i32, MockDraftError> {
    if value <= 0 {
        return Err(MockDraftError::InvalidInput(format!(
            "{} must be positive, got {}",
            what, value
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_trimmed_and_control_chars_removed() {
        assert_eq!(validate_name("  Connor\tBedard \n").unwrap(), "ConnorBedard");
        assert_eq!(validate_name(" Regina Pats ").unwrap(), "Regina Pats");
    }

    #[test]
    fn name_empty_rejected() {
        assert!(validate_name("   ").is_err());
        assert!(validate_name("\t\n").is_err());
    }

    #[test]
    fn name_too_long_rejected() {
        let long = "x".repeat(MAX_NAME_LENGTH + 1);
        assert!(validate_name(&long).is_err());
        assert!(validate_name(&"x".repeat(MAX_NAME_LENGTH)).is_ok());
    }

    #[test]
    fn optional_text_blank_is_none() {
        assert_eq!(validate_optional_text(None).unwrap(), None);
        assert_eq!(validate_optional_text(Some("  ")).unwrap(), None);
        assert_eq!(
            validate_optional_text(Some(" North Vancouver ")).unwrap(),
            Some("North Vancouver".to_string())
        );
    }

    #[test]
    fn date_valid() {
        assert_eq!(
            validate_date("2005-07-17").unwrap(),
            NaiveDate::from_ymd_opt(2005, 7, 17).unwrap()
        );
    }

    #[test]
    fn date_invalid() {
        assert!(validate_date("17/07/2005").is_err());
        assert!(validate_date("2005-02-30").is_err());
    }

    #[test]
    fn draft_year_range() {
        assert_eq!(validate_draft_year(2023).unwrap(), 2023);
        assert!(validate_draft_year(1899).is_err());
        assert!(validate_draft_year(2101).is_err());
    }

    #[test]
    fn code_normalized() {
        assert_eq!(normalize_code(" lw ").unwrap(), "LW");
        assert_eq!(normalize_code("r").unwrap(), "R");
    }

    #[test]
    fn code_invalid() {
        assert!(normalize_code("").is_err());
        assert!(normalize_code("L1").is_err());
        assert!(normalize_code("CENTER").is_err());
    }

    #[test]
    fn measurement_positive() {
        assert_eq!(validate_measurement(185, "height").unwrap(), 185);
        let err = validate_measurement(0, "weight").unwrap_err();
        assert_eq!(err.to_string(), "invalid input: weight must be positive, got 0");
    }
}
