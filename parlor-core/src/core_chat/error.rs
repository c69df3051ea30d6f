//! Error taxonomy for the chat service layer.

use thiserror::Error;

use crate::core_store::StoreError;

/// Payload of the `SubscriptionError` emitted when a join names an
/// unknown channel.
pub const CHANNEL_NOT_FOUND: &str = "Channel not found!";

/// Payload of the `SubscriptionError` emitted when a private join
/// carries a missing or mismatched password.
pub const WRONG_PASSWORD: &str = "Wrong password.";

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Channel name already taken: {0}")]
    Duplicate(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ChatError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateName(name) => ChatError::Duplicate(name),
            StoreError::NotFound(what) => ChatError::NotFound(what),
            other => {
                // Storage internals stay server-side; callers get an
                // opaque message.
                tracing::error!(error = %other, "store operation failed");
                ChatError::Internal("storage failure".to_string())
            }
        }
    }
}

pub type ChatResult<T> = Result<T, ChatError>;
