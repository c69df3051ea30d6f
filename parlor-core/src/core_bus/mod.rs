/*
    core_bus - Event distribution layer

    A single broadcast bus carries every chat event. Each subscriber
    owns a Subscription that replays the shared stream through the
    delivery filter, so routing policy lives in one place instead of
    being scattered across publishers.
*/

pub mod bus;
pub mod events;
pub mod filter;
pub mod subscription;

#[cfg(test)]
pub mod tests;

pub use bus::{EventBus, DEFAULT_BUS_CAPACITY};
pub use events::{ChannelSnapshot, ChatEvent};
pub use filter::{should_deliver, SubscriberContext};
pub use subscription::Subscription;
