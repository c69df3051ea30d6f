/*
    Store subsystem - Persistence layer
*/

pub mod chat_store;
pub mod errors;
pub mod migrations;

pub use chat_store::ChatStore;
pub use errors::{StoreError, StoreResult};
pub use migrations::{get_latest_version, migrate, Migration, CURRENT_CHAT_SCHEMA_VERSION};
