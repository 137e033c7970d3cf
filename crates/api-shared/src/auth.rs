//! API-key validation shared by API surfaces.
//!
//! The expected key is resolved once at startup and passed in, rather than
//! read from the environment on every request.

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing x-api-key header")]
    MissingKey,
    #[error("invalid API key")]
    InvalidKey,
}

/// Validates a provided API key against the expected key.
///
/// `provided` is the value of the `x-api-key` header, if any.
pub fn validate_api_key(expected: &str, provided: Option<&str>) -> Result<(), AuthError> {
    match provided {
        None => Err(AuthError::MissingKey),
        Some(key) if key == expected => Ok(()),
        Some(_) => Err(AuthError::InvalidKey),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_api_key_accepts_matching_key() {
        assert!(validate_api_key("secret", Some("secret")).is_ok());
    }

    #[test]
    fn test_validate_api_key_rejects_missing_and_wrong_keys() {
        assert!(matches!(
            validate_api_key("secret", None),
            Err(AuthError::MissingKey)
        ));
        assert!(matches!(
            validate_api_key("secret", Some("nope")),
            Err(AuthError::InvalidKey)
        ));
    }
}
