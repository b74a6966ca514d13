//! Validation helpers for DTOs.

use validator::ValidationError;

const MAX_NAME_LENGTH: usize = 64;

/// Validates that a display name is non-blank and at most 64 characters.
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("name_blank");
        err.message = Some("name must not be blank".into());
        return Err(err);
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        let mut err = ValidationError::new("name_length");
        err.message =
            Some(format!("name must be at most {MAX_NAME_LENGTH} characters").into());
        return Err(err);
    }

    Ok(())
}

/// Validates that a submitted answer value is non-blank.
pub fn validate_answer_value(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("answer_blank");
        err.message = Some("answer value must not be blank".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_display_name_valid() {
        assert!(validate_display_name("Ada").is_ok());
        assert!(validate_display_name("Jean-Luc Picard").is_ok());
    }

    #[test]
    fn test_validate_display_name_blank() {
        assert!(validate_display_name("").is_err());
        assert!(validate_display_name("   ").is_err());
        assert!(validate_display_name("\t\n").is_err());
    }

    #[test]
    fn test_validate_display_name_too_long() {
        assert!(validate_display_name(&"x".repeat(64)).is_ok());
        assert!(validate_display_name(&"x".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_answer_value() {
        assert!(validate_answer_value("Paris").is_ok());
        assert!(validate_answer_value("  42 ").is_ok());
        assert!(validate_answer_value("").is_err());
        assert!(validate_answer_value("   ").is_err());
    }
}
