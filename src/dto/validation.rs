//! Validation helpers for the score submission fields.

use validator::ValidationError;

/// Check a pseudonym and return it trimmed.
///
/// A pseudonym is accepted when at least one alphanumeric character remains after trimming.
///
/// ```ignore
/// validate_pseudonym(Some("  Ash ")) // Ok("Ash")
/// validate_pseudonym(Some(" -_- "))  // Err - no alphanumeric character
/// validate_pseudonym(None)           // Err - missing
/// ```
pub fn validate_pseudonym(raw: Option<&str>) -> Result<String, ValidationError> {
    let Some(raw) = raw else {
        let mut err = ValidationError::new("pseudonym_required");
        err.message = Some("Pseudonym is required".into());
        return Err(err);
    };

    let trimmed = raw.trim();
    if !trimmed.chars().any(char::is_alphanumeric) {
        let mut err = ValidationError::new("pseudonym_format");
        err.message = Some("Pseudonym must contain at least one letter or digit".into());
        err.add_param("value".into(), &raw);
        return Err(err);
    }

    Ok(trimmed.to_owned())
}

/// Parse a completion time in seconds, rounded to the nearest whole second (halves up), at least 1.
pub fn parse_time(raw: Option<&str>) -> Result<u32, ValidationError> {
    let Some(raw) = raw else {
        let mut err = ValidationError::new("time_required");
        err.message = Some("Time is required".into());
        return Err(err);
    };

    let value = match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => {
            let mut err = ValidationError::new("time_format");
            err.message = Some("Time must be a number of seconds".into());
            err.add_param("value".into(), &raw);
            return Err(err);
        }
    };

    if value <= 0.0 {
        let mut err = ValidationError::new("time_positive");
        err.message = Some("Time must be greater than zero".into());
        err.add_param("value".into(), &value);
        return Err(err);
    }

    let rounded = value.round().max(1.0);
    if rounded > f64::from(u32::MAX) {
        let mut err = ValidationError::new("time_range");
        err.message = Some(format!("Time must not exceed {} seconds", u32::MAX).into());
        err.add_param("value".into(), &value);
        return Err(err);
    }

    // In range and integral after the checks above.
    Ok(rounded as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_pseudonym_trims() {
        assert_eq!(validate_pseudonym(Some("  Ash ")).unwrap(), "Ash");
        assert_eq!(validate_pseudonym(Some("Sacha 42")).unwrap(), "Sacha 42");
        assert_eq!(validate_pseudonym(Some("é")).unwrap(), "é");
    }

    #[test]
    fn test_validate_pseudonym_rejects() {
        assert_eq!(
            validate_pseudonym(None).unwrap_err().code,
            "pseudonym_required"
        );
        assert_eq!(
            validate_pseudonym(Some("")).unwrap_err().code,
            "pseudonym_format"
        );
        assert_eq!(
            validate_pseudonym(Some("   ")).unwrap_err().code,
            "pseudonym_format"
        );
        assert_eq!(
            validate_pseudonym(Some("-_-!")).unwrap_err().code,
            "pseudonym_format"
        );
    }

    #[test]
    fn test_parse_time_rounds_half_up() {
        assert_eq!(parse_time(Some("42")).unwrap(), 42);
        assert_eq!(parse_time(Some("41.5")).unwrap(), 42);
        assert_eq!(parse_time(Some("41.49")).unwrap(), 41);
        assert_eq!(parse_time(Some(" 7 ")).unwrap(), 7);
    }

    #[test]
    fn test_parse_time_small_values_become_one() {
        assert_eq!(parse_time(Some("0.2")).unwrap(), 1);
        assert_eq!(parse_time(Some("0.5")).unwrap(), 1);
    }

    #[test]
    fn test_parse_time_rejects() {
        assert_eq!(parse_time(None).unwrap_err().code, "time_required");
        assert_eq!(parse_time(Some("abc")).unwrap_err().code, "time_format");
        assert_eq!(parse_time(Some("")).unwrap_err().code, "time_format");
        assert_eq!(parse_time(Some("NaN")).unwrap_err().code, "time_format");
        assert_eq!(parse_time(Some("inf")).unwrap_err().code, "time_format");
        assert_eq!(parse_time(Some("0")).unwrap_err().code, "time_positive");
        assert_eq!(parse_time(Some("-3")).unwrap_err().code, "time_positive");
        assert_eq!(parse_time(Some("1e12")).unwrap_err().code, "time_range");
    }
}
