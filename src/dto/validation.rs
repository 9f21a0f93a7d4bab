//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::state::catalog::GameMode;

/// Validates that a game mode is one of the wire names (`classic`, `artist`).
///
/// # Examples
///
/// ```ignore
/// validate_game_mode("classic") // Ok
/// validate_game_mode("Artist")  // Err - wire names are lowercase
/// ```
pub fn validate_game_mode(mode: &str) -> Result<(), ValidationError> {
    mode.parse::<GameMode>().map(|_| ()).map_err(|err| {
        let mut error = ValidationError::new("game_mode");
        error.message = Some(err.to_string().into());
        error
    })
}

/// Validates that a client session id is non-blank and free of whitespace.
pub fn validate_client_session_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() || id.chars().any(char::is_whitespace) {
        let mut err = ValidationError::new("client_session_id");
        err.message = Some("clientSessionId must be a non-empty token".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_game_mode() {
        assert!(validate_game_mode("classic").is_ok());
        assert!(validate_game_mode("artist").is_ok());
        assert!(validate_game_mode("").is_err());
        assert!(validate_game_mode("Artist").is_err());
        assert!(validate_game_mode("lyrics").is_err());
    }

    #[test]
    fn test_validate_client_session_id() {
        assert!(validate_client_session_id("9f2c0a").is_ok());
        assert!(validate_client_session_id("").is_err());
        assert!(validate_client_session_id("9f2c 0a").is_err());
    }
}
