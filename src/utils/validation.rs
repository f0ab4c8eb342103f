use validator::ValidationError;

/// Emails are stored case-folded so uniqueness holds regardless of input casing.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Blank strings in patch payloads mean "keep the current value".
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

pub fn check_salary_range(min: i32, max: i32) -> Result<(), ValidationError> {
    if min > max {
        let mut err = ValidationError::new("salary_range");
        err.message = Some("salary_min must not be greater than salary_max".into());
        return Err(err);
    }
    Ok(())
}

/// Only rejects when both bounds are present; partial patches are checked
/// again after merging with the stored row.
pub fn check_optional_salary_range(
    min: Option<i32>,
    max: Option<i32>,
) -> Result<(), ValidationError> {
    match (min, max) {
        (Some(min), Some(max)) => check_salary_range(min, max),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_case_folded_and_trimmed() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn blank_patch_values_are_absent() {
        assert_eq!(non_blank(Some("   ".into())), None);
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some(" Berlin ".into())), Some("Berlin".into()));
    }

    #[test]
    fn salary_bounds_must_be_ordered() {
        assert!(check_salary_range(100, 200).is_ok());
        assert!(check_salary_range(200, 200).is_ok());
        assert!(check_salary_range(1000, 5).is_err());
        assert!(check_optional_salary_range(Some(1000), None).is_ok());
        assert!(check_optional_salary_range(Some(1000), Some(5)).is_err());
    }
}
