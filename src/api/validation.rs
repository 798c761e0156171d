use super::ApiError;
use crate::constants::limits;

/// Format/length rules a candidate username must pass before the uniqueness
/// check runs.
pub fn require_valid_username(username: &str) -> Result<(), ApiError> {
    if username.is_empty() {
        return Err(ApiError::validation("Empty username supplied."));
    }

    if username.len() > limits::MAX_USERNAME_LENGTH {
        return Err(ApiError::validation(format!(
            "A username can have at most {} characters.",
            limits::MAX_USERNAME_LENGTH
        )));
    }

    if !username.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ApiError::validation(
            "Usernames can only have alphanumeric characters.",
        ));
    }

    if username.to_ascii_lowercase().contains("admin") {
        return Err(ApiError::validation(
            "This username is not available to the general public.",
        ));
    }

    Ok(())
}

pub fn require_valid_bio(bio: &str) -> Result<(), ApiError> {
    if bio.chars().count() > limits::MAX_BIO_LENGTH_IN_CHARS {
        return Err(ApiError::validation(format!(
            "User bio exceeds maximum character limit: {}",
            limits::MAX_BIO_LENGTH_IN_CHARS
        )));
    }

    Ok(())
}
