//! Validation helpers for DTOs.

use validator::ValidationError;

const MAX_UID_LEN: usize = 128;

/// Validates a user identifier used as a document key.
///
/// Must be non-empty, at most 128 characters and free of `/` and whitespace.
pub fn validate_uid(uid: &str) -> Result<(), ValidationError> {
    if uid.is_empty() || uid.len() > MAX_UID_LEN {
        let mut err = ValidationError::new("uid_length");
        err.message = Some(
            format!("User ID must be between 1 and {MAX_UID_LEN} characters (got {})", uid.len())
                .into(),
        );
        return Err(err);
    }

    if uid.chars().any(|c| c == '/' || c.is_whitespace()) {
        let mut err = ValidationError::new("uid_format");
        err.message = Some("User ID must not contain '/' or whitespace".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_uid_valid() {
        assert!(validate_uid("abc123").is_ok());
        assert!(validate_uid("Xy9-_.z").is_ok());
    }

    #[test]
    fn test_validate_uid_invalid_length() {
        assert!(validate_uid("").is_err());
        assert!(validate_uid(&"a".repeat(129)).is_err());
    }

    #[test]
    fn test_validate_uid_invalid_format() {
        assert!(validate_uid("users/abc").is_err());
        assert!(validate_uid("abc def").is_err());
    }
}
