//! Member profile snapshots

use super::types::UserId;
use serde::{Deserialize, Serialize};

/// Display profile of an authenticated member.
///
/// Identity itself lives in the host application; the store keeps a copy of
/// the last profile seen for each actor so event payloads and message views
/// can be populated without a round-trip to the identity layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberProfile {
    pub id: UserId,

    /// Name shown in channel rosters and message authorship
    pub display_name: String,

    /// Avatar URL, if the member has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,

    /// Presence flag, updated via status changes
    pub online: bool,
}

impl MemberProfile {
    pub fn new(id: UserId, display_name: String) -> Self {
        MemberProfile {
            id,
            display_name,
            photo: None,
            online: false,
        }
    }

    pub fn with_photo(mut self, photo: String) -> Self {
        self.photo = Some(photo);
        self
    }

    pub fn with_online(mut self, online: bool) -> Self {
        self.online = online;
        self
    }
}
