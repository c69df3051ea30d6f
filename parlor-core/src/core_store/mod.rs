/*
    core_store - Persistent chat state layer

    The single source of truth for the chat engine. Handles:
    - Data models (channels, messages, member profiles)
    - SQLite persistence with versioned migrations
    - Atomic membership updates
*/

pub mod model;
pub mod store;

#[cfg(test)]
pub mod tests;

// Re-export commonly used types
pub use model::{
    Channel, ChannelId, MemberProfile, Message, MessageId, MessageMeta, MessageView, MetaKind,
    Timestamp, UserId,
};
pub use store::{ChatStore, StoreError, StoreResult};
