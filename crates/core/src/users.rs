//! User identifiers as handed over by the (external) auth layer.

use crate::errors::{Result, ValidationError};

/// Longest accepted user id.
pub const MAX_USER_ID_LEN: usize = 128;

/// Reject ids that cannot be used as a document id.
pub fn validate_user_id(user_id: &str) -> Result<()> {
    if user_id.trim().is_empty() {
        return Err(ValidationError::MissingField("userId".to_string()).into());
    }
    if user_id.len() > MAX_USER_ID_LEN
        || user_id.contains('/')
        || user_id.chars().any(char::is_control)
    {
        return Err(ValidationError::InvalidInput(format!("Invalid user id: {}", user_id)).into());
    }
    Ok(())
}

/// Public form of a user id: ids longer than 8 chars become `abcd...wxyz`.
pub fn mask_user_id(user_id: &str) -> String {
    let chars: Vec<char> = user_id.chars().collect();
    if chars.len() <= 8 {
        return user_id.to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}
