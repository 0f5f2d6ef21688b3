//! Request authentication shared by the API crates.

/// Header carrying the shared API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Header naming the staff member a request acts for.
pub const STAFF_ID_HEADER: &str = "x-staff-id";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("missing x-api-key header")]
    MissingApiKey,
    #[error("invalid API key")]
    InvalidApiKey,
    #[error("missing or malformed x-staff-id header")]
    MissingStaffId,
}

/// Validates the provided API key against the key configured at startup.
///
/// The expected key is resolved once by the binary and handed in; it is never read from the
/// environment per request.
pub fn validate_api_key(provided: Option<&str>, expected: &str) -> Result<(), AuthError> {
    match provided {
        None => Err(AuthError::MissingApiKey),
        Some(key) if key == expected => Ok(()),
        Some(_) => Err(AuthError::InvalidApiKey),
    }
}
