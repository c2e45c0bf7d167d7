// ============================
// crates/backend-lib/src/validation.rs
// ============================
//! Identity field validation.

use crate::error::AppError;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

// Common validation constants
const MIN_USERNAME_LENGTH: usize = 3;
const MAX_USERNAME_LENGTH: usize = 30;
const MAX_FULLNAME_LENGTH: usize = 100;
const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321 SMTP limit

// Regex patterns for validation. Username is matched post-normalization,
// so only lowercase is accepted here.
static USERNAME_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z0-9_-]+$").unwrap());
static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());
static FULLNAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^<>/\\{}()\[\];]*$").unwrap());

/// Possible validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid full name: {0}")]
    InvalidFullname(String),
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trim and lowercase a login identifier (username or email). All store
/// lookups and writes go through this, so uniqueness is case-blind.
pub fn normalize_identifier(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Validate a (normalized) username
pub fn validate_username(username: &str) -> ValidationResult<&str> {
    if username.is_empty() {
        return Err(ValidationError::InvalidUsername(
            "Username must not be empty".to_string(),
        ));
    }

    if username.len() < MIN_USERNAME_LENGTH || username.len() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::InvalidUsername(format!(
            "Username must be between {MIN_USERNAME_LENGTH} and {MAX_USERNAME_LENGTH} characters"
        )));
    }

    if !USERNAME_REGEX.is_match(username) {
        return Err(ValidationError::InvalidUsername(
            "Username must contain only letters, digits, '-' and '_'".to_string(),
        ));
    }

    Ok(username)
}

/// Validate an email address
pub fn validate_email(email: &str) -> ValidationResult<&str> {
    if email.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "Email address cannot be empty".to_string(),
        ));
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::InvalidEmail(format!(
            "Email address cannot exceed {MAX_EMAIL_LENGTH} characters"
        )));
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err(ValidationError::InvalidEmail(
            "Invalid email address format".to_string(),
        ));
    }

    Ok(email)
}

/// Validate a display name
pub fn validate_fullname(fullname: &str) -> ValidationResult<&str> {
    if fullname.is_empty() {
        return Err(ValidationError::InvalidFullname(
            "Full name must not be empty".to_string(),
        ));
    }

    if fullname.len() > MAX_FULLNAME_LENGTH {
        return Err(ValidationError::InvalidFullname(format!(
            "Full name must be between 1 and {MAX_FULLNAME_LENGTH} characters"
        )));
    }

    // Check for potentially dangerous characters
    if !FULLNAME_REGEX.is_match(fullname) {
        return Err(ValidationError::InvalidFullname(
            "Full name contains invalid characters".to_string(),
        ));
    }

    Ok(fullname)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_identifier() {
        assert_eq!(normalize_identifier("  Alice "), "alice");
        assert_eq!(normalize_identifier("Alice@Example.COM"), "alice@example.com");
        assert_eq!(normalize_identifier("bob"), "bob");
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("user_123").is_ok());
        assert!(validate_username("with-dash").is_ok());

        assert!(matches!(
            validate_username(""),
            Err(ValidationError::InvalidUsername(_))
        ));
        assert!(matches!(
            validate_username("ab"),
            Err(ValidationError::InvalidUsername(_))
        ));
        let long_name = "a".repeat(31);
        assert!(matches!(
            validate_username(&long_name),
            Err(ValidationError::InvalidUsername(_))
        ));
        assert!(matches!(
            validate_username("has space"),
            Err(ValidationError::InvalidUsername(_))
        ));
        // Caller normalizes first; uppercase is a contract violation.
        assert!(matches!(
            validate_username("Alice"),
            Err(ValidationError::InvalidUsername(_))
        ));
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("test@example.com").is_ok());
        assert!(validate_email("user.name+tag@example.co.uk").is_ok());

        assert!(matches!(
            validate_email("test.example.com"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("test@"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("test@example"),
            Err(ValidationError::InvalidEmail(_))
        ));
    }

    #[test]
    fn test_validate_fullname() {
        assert!(validate_fullname("Alice Example").is_ok());

        assert!(matches!(
            validate_fullname(""),
            Err(ValidationError::InvalidFullname(_))
        ));
        let long_name = "a".repeat(101);
        assert!(matches!(
            validate_fullname(&long_name),
            Err(ValidationError::InvalidFullname(_))
        ));
        assert!(matches!(
            validate_fullname("<script>alert(1)</script>"),
            Err(ValidationError::InvalidFullname(_))
        ));
    }
}
