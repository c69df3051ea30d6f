//! Embeddable real-time chat engine
//!
//! Channels with persistent membership, an in-process event bus with
//! per-subscriber filtering, and an async enrichment pipeline that turns
//! posted links into previews. Hosts bring their own identity layer and
//! transport; this crate owns everything between an authenticated request
//! and the events it produces.

pub mod config;
pub mod core_bus;
pub mod core_chat;
pub mod core_enrich;
pub mod core_store;
pub mod logging;
pub mod metrics;
pub mod shutdown;
pub mod test_utils;

pub use config::Config;
pub use core_bus::{ChatEvent, EventBus, Subscription};
pub use core_chat::{ChatError, ChatService, CreateChannelRequest};
pub use core_store::{ChatStore, MemberProfile};
pub use logging::{init_logging, LogLevel};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        // Ensure the main exports are accessible
        let _ = LogLevel::Info;
        let _ = Config::default();
    }
}
