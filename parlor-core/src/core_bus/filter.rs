//! Delivery filter
//!
//! Per-subscriber predicate deciding which bus events reach which
//! subscription. All routing policy lives here so the service layer can
//! publish without knowing who is listening.

use super::events::ChatEvent;
use crate::core_store::model::UserId;

/// Identity of one live subscription
#[derive(Debug, Clone)]
pub struct SubscriberContext {
    /// The subscribing user
    pub user_id: UserId,
    /// The channel name the subscription was opened for
    pub channel_name: String,
}

impl SubscriberContext {
    pub fn new(user_id: UserId, channel_name: String) -> Self {
        SubscriberContext { user_id, channel_name }
    }
}

/// Decide whether an event is delivered to a subscriber.
///
/// Channel-scoped events match on the requested channel name; membership
/// events additionally split on whether the acting member is the subscriber
/// (a joiner sees their own MemberJoined, everyone else in the channel sees
/// MemberAdded). Channel-list and presence events go to everyone. Targeted
/// errors go only to their target.
pub fn should_deliver(event: &ChatEvent, ctx: &SubscriberContext) -> bool {
    match event {
        ChatEvent::SubscriptionError { target, .. } => *target == ctx.user_id,
        ChatEvent::MemberJoined { member, .. } => member.id == ctx.user_id,
        ChatEvent::MemberAdded { member, channel } => {
            member.id != ctx.user_id && channel.name == ctx.channel_name
        }
        ChatEvent::ChannelCreated { .. } => true,
        ChatEvent::MessagePosted { channel, .. } => channel.name == ctx.channel_name,
        ChatEvent::StatusChanged { .. } => true,
        ChatEvent::MessageUpdated { channel, .. } => channel.name == ctx.channel_name,
    }
}
