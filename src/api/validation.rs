//! Field validators shared by the request handlers.
//!
//! Each check appends a `{param, msg}` entry instead of failing fast so a
//! response can carry every problem with the payload at once. Existence
//! checks that need the database (duplicate emails, dangling agency ids)
//! stay in the handlers.

use chrono::NaiveDate;

use super::FieldError;

/// Strong password rule shared by signup and password updates.
pub const PASSWORD_MSG: &str = "Invalid password (must be 8 characters or more and contain one or more uppercase, lowercase, number and special character)";

/// Checks presence, pushing `message` when the value is missing or blank.
/// Returns the trimmed value so later checks can chain off it.
pub fn required<'a>(
    errors: &mut Vec<FieldError>,
    param: &str,
    message: &str,
    value: Option<&'a str>,
) -> Option<&'a str> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => Some(v),
        None => {
            errors.push(FieldError::new(param, message));
            None
        }
    }
}

/// Returns the trimmed value when present and non-blank, without recording
/// an error. Used for optional fields.
pub fn optional(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub fn length(errors: &mut Vec<FieldError>, param: &str, value: &str, min: usize, max: usize) {
    let chars = value.chars().count();
    if chars < min || chars > max {
        errors.push(FieldError::new(
            param,
            format!("Invalid length ({min} - {max}) characters"),
        ));
    }
}

pub fn email_format(errors: &mut Vec<FieldError>, param: &str, value: &str) {
    if !is_valid_email(value) {
        errors.push(FieldError::new(param, "Invalid email format"));
    }
}

pub fn strong_password(errors: &mut Vec<FieldError>, param: &str, value: &str) {
    if !is_strong_password(value) {
        errors.push(FieldError::new(param, PASSWORD_MSG));
    }
}

pub fn passwords_match(errors: &mut Vec<FieldError>, param: &str, password: &str, confirm: &str) {
    if password != confirm {
        errors.push(FieldError::new(param, "Passwords are different"));
    }
}

pub fn date_format(errors: &mut Vec<FieldError>, param: &str, message: &str, value: &str) {
    if NaiveDate::parse_from_str(value, "%Y-%m-%d").is_err() {
        errors.push(FieldError::new(param, message));
    }
}

pub fn user_type(errors: &mut Vec<FieldError>, param: &str, value: &str) {
    use crate::constants::user_types;
    let allowed = [
        user_types::ADMIN,
        user_types::AGENCY,
        user_types::PROVIDER,
        user_types::CITIZEN,
    ];
    if !allowed.contains(&value) {
        errors.push(FieldError::new(
            param,
            "Invalid type, accepts - ADMIN, AGENCY, PROVIDER, CITIZEN",
        ));
    }
}

pub fn phone_number(errors: &mut Vec<FieldError>, param: &str, value: &str) {
    if !is_valid_phone(value) {
        errors.push(FieldError::new(param, "Invalid phone number"));
    }
}

fn is_valid_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || domain.starts_with('.') || domain.ends_with('.') {
        return false;
    }
    domain.contains('.') && !value.contains(char::is_whitespace)
}

fn is_strong_password(value: &str) -> bool {
    value.chars().count() >= 8
        && value.chars().any(|c| c.is_ascii_uppercase())
        && value.chars().any(|c| c.is_ascii_lowercase())
        && value.chars().any(|c| c.is_ascii_digit())
        && value.chars().any(|c| !c.is_ascii_alphanumeric())
}

fn is_valid_phone(value: &str) -> bool {
    let digits = value.strip_prefix('+').unwrap_or(value);
    let count = digits.chars().filter(char::is_ascii_digit).count();
    digits.chars().all(|c| c.is_ascii_digit()) && (7..=15).contains(&count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_records_missing_fields() {
        let mut errors = Vec::new();
        assert!(required(&mut errors, "name", "Name is required", None).is_none());
        assert!(required(&mut errors, "email", "Email is required", Some("  ")).is_none());
        assert_eq!(
            required(&mut errors, "role", "Role is required", Some(" Auditor ")),
            Some("Auditor")
        );
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].param, "name");
        assert_eq!(errors[0].msg, "Name is required");
    }

    #[test]
    fn test_length_bounds() {
        let mut errors = Vec::new();
        length(&mut errors, "name", "ab", 2, 100);
        length(&mut errors, "name", "a", 2, 100);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].msg, "Invalid length (2 - 100) characters");
    }

    #[test]
    fn test_email_format() {
        assert!(is_valid_email("jane.doe@example.com"));
        assert!(!is_valid_email("jane.doe"));
        assert!(!is_valid_email("jane@nodot"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("jane doe@example.com"));
    }

    #[test]
    fn test_strong_password() {
        assert!(is_strong_password("Abcd-1234"));
        assert!(!is_strong_password("abcd-1234"));
        assert!(!is_strong_password("ABCD-1234"));
        assert!(!is_strong_password("Abcdefgh"));
        assert!(!is_strong_password("Ab-1"));
    }

    #[test]
    fn test_user_type_allow_list() {
        let mut errors = Vec::new();
        user_type(&mut errors, "type", "CITIZEN");
        user_type(&mut errors, "type", "ADMIN");
        user_type(&mut errors, "type", "Robot");
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].msg,
            "Invalid type, accepts - ADMIN, AGENCY, PROVIDER, CITIZEN"
        );
    }

    #[test]
    fn test_date_format() {
        let mut errors = Vec::new();
        date_format(
            &mut errors,
            "date_of_birth",
            "Invalid Date of Birth format (YYYY-MM-DD)",
            "1990-04-17",
        );
        date_format(
            &mut errors,
            "date_of_birth",
            "Invalid Date of Birth format (YYYY-MM-DD)",
            "17/04/1990",
        );
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_phone_number() {
        assert!(is_valid_phone("+2348012345678"));
        assert!(is_valid_phone("08012345678"));
        assert!(!is_valid_phone("123"));
        assert!(!is_valid_phone("not-a-phone"));
    }
}
