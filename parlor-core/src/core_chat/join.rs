//! Join-channel handle and its deferred announcement.

use crate::core_bus::{ChannelSnapshot, Subscription};
use crate::core_store::model::MemberProfile;

/// Pending broadcast produced by an admitted join.
///
/// `join_channel` registers the subscriber's receiver before returning, so
/// publishing can safely wait until the caller holds the handle. The caller
/// hands this back to `ChatService::announce_join` once it is listening.
#[derive(Debug, Clone)]
pub struct JoinAnnouncement {
    pub joiner: MemberProfile,
    /// Snapshot with the full member list, for the joiner's own event.
    pub channel: ChannelSnapshot,
    /// Member-stripped snapshot, for everyone else.
    pub stripped: ChannelSnapshot,
    /// Whether the join actually grew the member set.
    pub newly_added: bool,
}

/// Live result of `join_channel`: the filtered event stream plus the
/// not-yet-published announcement. A rejected join carries no announcement
/// and its stream yields exactly one `SubscriptionError`.
pub struct JoinHandle {
    pub subscription: Subscription,
    pub announcement: Option<JoinAnnouncement>,
}

impl JoinHandle {
    pub fn admitted(subscription: Subscription, announcement: JoinAnnouncement) -> Self {
        Self {
            subscription,
            announcement: Some(announcement),
        }
    }

    pub fn rejected(subscription: Subscription) -> Self {
        Self {
            subscription,
            announcement: None,
        }
    }

    /// True when resolution failed and the stream only carries the error.
    pub fn is_rejected(&self) -> bool {
        self.subscription.is_rejected()
    }

    pub fn take_announcement(&mut self) -> Option<JoinAnnouncement> {
        self.announcement.take()
    }
}
