//! Input validation for channel and message fields.

use super::error::{ChatError, ChatResult};

pub const NAME_MIN: usize = 5;
pub const NAME_MAX: usize = 100;
pub const DESCRIPTION_MIN: usize = 10;
pub const DESCRIPTION_MAX: usize = 300;
pub const BODY_MAX: usize = 1000;

/// Channel names are 5-100 characters, letters and spaces only.
pub fn channel_name(name: &str) -> ChatResult<()> {
    let len = name.chars().count();
    if !(NAME_MIN..=NAME_MAX).contains(&len) {
        return Err(ChatError::Validation(format!(
            "channel name must be {}-{} characters, got {}",
            NAME_MIN, NAME_MAX, len
        )));
    }
    if !name.chars().all(|c| c.is_ascii_alphabetic() || c == ' ') {
        return Err(ChatError::Validation(
            "channel name may only contain letters and spaces".to_string(),
        ));
    }
    Ok(())
}

/// Channel descriptions are 10-300 characters, any content.
pub fn channel_description(description: &str) -> ChatResult<()> {
    let len = description.chars().count();
    if !(DESCRIPTION_MIN..=DESCRIPTION_MAX).contains(&len) {
        return Err(ChatError::Validation(format!(
            "channel description must be {}-{} characters, got {}",
            DESCRIPTION_MIN, DESCRIPTION_MAX, len
        )));
    }
    Ok(())
}

/// Message bodies are non-blank and at most 1000 characters.
pub fn message_body(body: &str) -> ChatResult<()> {
    if body.trim().is_empty() {
        return Err(ChatError::Validation(
            "message body must not be empty".to_string(),
        ));
    }
    let len = body.chars().count();
    if len > BODY_MAX {
        return Err(ChatError::Validation(format!(
            "message body must be at most {} characters, got {}",
            BODY_MAX, len
        )));
    }
    Ok(())
}

/// Private-channel passwords are non-empty and bounded by config.
pub fn channel_password(password: &str, max_len: usize) -> ChatResult<()> {
    if password.is_empty() {
        return Err(ChatError::Validation(
            "password must not be empty".to_string(),
        ));
    }
    let len = password.chars().count();
    if len > max_len {
        return Err(ChatError::Validation(format!(
            "password must be at most {} characters, got {}",
            max_len, len
        )));
    }
    Ok(())
}
