/*
    core_chat - Channel service layer

    Orchestrates channel creation, membership, message posting and
    presence over the store and the event bus. Join-channel follows a
    two-phase protocol: resolve and register the subscriber first, then
    let the caller trigger the broadcast once it holds the stream.
*/

pub mod error;
pub mod join;
pub mod password;
pub mod service;
pub mod validate;

#[cfg(test)]
pub mod tests;

pub use error::{ChatError, ChatResult, CHANNEL_NOT_FOUND, WRONG_PASSWORD};
pub use join::{JoinAnnouncement, JoinHandle};
pub use service::{ChatService, CreateChannelRequest, MessagePage};
