//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::tournament::{
    Score, UNPLAYED_SCORE,
    calendar::{parse_clock, parse_timestamp},
};

const MAX_PERMISSION_KEY_LEN: usize = 64;

/// Validates a permission key: lowercase ASCII letters, digits, `.`, `_` and `-`.
///
/// # Examples
///
/// ```ignore
/// validate_permission_key("schedule.create") // Ok
/// validate_permission_key("Schedule.Create") // Err - uppercase
/// validate_permission_key("")                // Err - empty
/// ```
pub fn validate_permission_key(key: &str) -> Result<(), ValidationError> {
    if key.is_empty() || key.len() > MAX_PERMISSION_KEY_LEN {
        let mut err = ValidationError::new("permission_key_length");
        err.message = Some(
            format!(
                "Permission key must be 1 to {MAX_PERMISSION_KEY_LEN} characters (got {})",
                key.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !key
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-'))
    {
        let mut err = ValidationError::new("permission_key_format");
        err.message = Some(
            "Permission key must contain only lowercase letters, digits, '.', '_' or '-'".into(),
        );
        return Err(err);
    }

    Ok(())
}

/// Validates a recorded result: `"<home>:<away>"` or the unplayed placeholder.
pub fn validate_score(score: &str) -> Result<(), ValidationError> {
    if score == UNPLAYED_SCORE {
        return Ok(());
    }
    score.parse::<Score>().map(|_| ()).map_err(|parse_err| {
        let mut err = ValidationError::new("score_format");
        err.message = Some(format!("Score must look like `2:1`: {parse_err}").into());
        err
    })
}

/// Validates a match clock such as `00:42:10`.
pub fn validate_clock(clock: &str) -> Result<(), ValidationError> {
    parse_clock(clock).map(|_| ()).map_err(|_| {
        let mut err = ValidationError::new("clock_format");
        err.message = Some("Time must be formatted as HH:MM:SS".into());
        err
    })
}

/// Validates an RFC 3339 timestamp.
pub fn validate_timestamp(at: &str) -> Result<(), ValidationError> {
    parse_timestamp(at).map(|_| ()).map_err(|_| {
        let mut err = ValidationError::new("timestamp_format");
        err.message = Some("Timestamp must be RFC 3339, e.g. 2024-04-12T15:00:00Z".into());
        err
    })
}
