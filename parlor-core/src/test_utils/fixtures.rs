//! Shared test fixtures

use std::sync::Arc;
use std::time::Duration;

use crate::config::{ChatConfig, Config};
use crate::core_chat::{ChatService, CreateChannelRequest};
use crate::core_store::model::{MemberProfile, UserId};
use crate::core_store::ChatStore;

/// A profile whose id and display name both derive from `name`.
pub fn member(name: &str) -> MemberProfile {
    MemberProfile::new(UserId::new(name.to_string()), name.to_string())
}

/// Valid public channel-creation request.
pub fn create_request(name: &str) -> CreateChannelRequest {
    CreateChannelRequest {
        name: name.to_string(),
        description: format!("Discussion room for {}", name),
        is_private: false,
        password: None,
    }
}

/// Valid private channel-creation request.
pub fn private_request(name: &str, password: &str) -> CreateChannelRequest {
    CreateChannelRequest {
        password: Some(password.to_string()),
        is_private: true,
        ..create_request(name)
    }
}

/// In-memory chat service with no enrichment wired.
pub fn memory_service() -> Arc<ChatService> {
    let store = ChatStore::memory().expect("in-memory store");
    Arc::new(ChatService::new(store, ChatConfig::default()))
}

/// Config tuned for fast tests: one worker, tiny queue, short fetch timeout.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.enrichment.workers = 1;
    config.enrichment.queue_capacity = 8;
    config.enrichment.fetch_timeout = Duration::from_millis(250);
    config
}
