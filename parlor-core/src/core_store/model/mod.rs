/*
    Model subsystem - Data structures for entities
*/

pub mod types;
pub mod channel;
pub mod message;
pub mod profile;

pub use types::*;
pub use channel::*;
pub use message::*;
pub use profile::*;
