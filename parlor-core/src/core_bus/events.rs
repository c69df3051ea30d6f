//! Chat events
//!
//! Events published on the bus for consumption by live subscriptions.
//! Broadcast payloads carry member-stripped channel snapshots; only
//! `MemberJoined`, which is delivered solely to the joining actor, carries
//! the populated member list.

use crate::core_store::model::{Channel, MemberProfile, MessageView, UserId};
use serde::{Deserialize, Serialize};

/// Event-payload projection of a channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSnapshot {
    pub id: String,
    pub name: String,
    pub description: String,
    pub is_private: bool,
    /// Empty in broadcasts so the full roster is not resent on every event
    pub members: Vec<MemberProfile>,
}

impl ChannelSnapshot {
    /// Snapshot with the member list cleared, for broadcast payloads
    pub fn stripped(channel: &Channel) -> Self {
        ChannelSnapshot {
            id: channel.id.to_string(),
            name: channel.name.clone(),
            description: channel.description.clone(),
            is_private: channel.is_private,
            members: Vec::new(),
        }
    }

    /// Snapshot carrying a populated member list
    pub fn with_members(channel: &Channel, members: Vec<MemberProfile>) -> Self {
        ChannelSnapshot {
            members,
            ..Self::stripped(channel)
        }
    }
}

/// Chat event type
///
/// A closed union over everything a subscription can observe. Serialized
/// with a `type` tag so the transport layer can pass events straight
/// through to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ChatEvent {
    /// A new channel exists; global channel-list refresh signal
    ChannelCreated {
        member: MemberProfile,
        channel: ChannelSnapshot,
    },

    /// Delivered to a joining actor once admitted to a channel
    MemberJoined {
        member: MemberProfile,
        channel: ChannelSnapshot,
    },

    /// Someone else's membership in a channel changed
    MemberAdded {
        member: MemberProfile,
        channel: ChannelSnapshot,
    },

    /// A message was posted to a channel
    MessagePosted {
        member: MemberProfile,
        channel: ChannelSnapshot,
        message: MessageView,
    },

    /// A message gained enrichment metadata
    MessageUpdated {
        member: MemberProfile,
        channel: ChannelSnapshot,
        message: MessageView,
    },

    /// A member's presence flag flipped; global presence signal
    StatusChanged { member: MemberProfile },

    /// Join resolution failed; delivered only to the requesting actor
    SubscriptionError { target: UserId, error: String },
}

impl ChatEvent {
    /// Short name of the variant, for logging and metrics labels
    pub fn kind(&self) -> &'static str {
        match self {
            ChatEvent::ChannelCreated { .. } => "channel_created",
            ChatEvent::MemberJoined { .. } => "member_joined",
            ChatEvent::MemberAdded { .. } => "member_added",
            ChatEvent::MessagePosted { .. } => "message_posted",
            ChatEvent::MessageUpdated { .. } => "message_updated",
            ChatEvent::StatusChanged { .. } => "status_changed",
            ChatEvent::SubscriptionError { .. } => "subscription_error",
        }
    }

    /// The channel name this event concerns (if any)
    pub fn channel_name(&self) -> Option<&str> {
        match self {
            ChatEvent::ChannelCreated { channel, .. } => Some(&channel.name),
            ChatEvent::MemberJoined { channel, .. } => Some(&channel.name),
            ChatEvent::MemberAdded { channel, .. } => Some(&channel.name),
            ChatEvent::MessagePosted { channel, .. } => Some(&channel.name),
            ChatEvent::MessageUpdated { channel, .. } => Some(&channel.name),
            ChatEvent::StatusChanged { .. } => None,
            ChatEvent::SubscriptionError { .. } => None,
        }
    }

    /// The acting member (if any)
    pub fn member(&self) -> Option<&MemberProfile> {
        match self {
            ChatEvent::ChannelCreated { member, .. } => Some(member),
            ChatEvent::MemberJoined { member, .. } => Some(member),
            ChatEvent::MemberAdded { member, .. } => Some(member),
            ChatEvent::MessagePosted { member, .. } => Some(member),
            ChatEvent::MessageUpdated { member, .. } => Some(member),
            ChatEvent::StatusChanged { member } => Some(member),
            ChatEvent::SubscriptionError { .. } => None,
        }
    }

    /// Whether this is a targeted resolution error
    pub fn is_error(&self) -> bool {
        matches!(self, ChatEvent::SubscriptionError { .. })
    }
}
