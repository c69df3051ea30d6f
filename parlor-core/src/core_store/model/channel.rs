//! Channel data structures and operations

use super::types::{ChannelId, Timestamp, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A named chat room with a persistent member set.
///
/// Private channels carry an argon2 hash of their join password; the
/// plaintext is never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    /// Unique identifier
    pub id: ChannelId,

    /// Human-readable name, unique across all channels
    pub name: String,

    /// Channel topic shown in listings
    pub description: String,

    /// Whether joining or reading requires the channel password
    pub is_private: bool,

    /// Password hash, present iff `is_private`
    pub password_hash: Option<String>,

    /// Members of this channel
    pub members: HashSet<UserId>,

    /// When the channel was created
    pub created_at: Timestamp,
}

impl Channel {
    /// Create a new Channel with the creator as sole member
    pub fn new(
        name: String,
        description: String,
        password_hash: Option<String>,
        creator_id: UserId,
    ) -> Self {
        let mut members = HashSet::new();
        members.insert(creator_id);

        Channel {
            id: ChannelId::generate(),
            name,
            description,
            is_private: password_hash.is_some(),
            password_hash,
            members,
            created_at: Timestamp::now(),
        }
    }

    /// Check if a user is a member of the channel
    pub fn is_member(&self, user_id: &UserId) -> bool {
        self.members.contains(user_id)
    }

    /// Get the number of members in the channel
    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_channel() {
        let creator = UserId::new("alice".to_string());
        let channel = Channel::new(
            "general".to_string(),
            "Everyday banter".to_string(),
            None,
            creator.clone(),
        );

        assert_eq!(channel.name, "general");
        assert!(!channel.is_private);
        assert!(channel.password_hash.is_none());
        assert!(channel.is_member(&creator));
        assert_eq!(channel.member_count(), 1);
    }

    #[test]
    fn test_private_channel_carries_hash() {
        let creator = UserId::new("alice".to_string());
        let channel = Channel::new(
            "hideout".to_string(),
            "Members only lounge".to_string(),
            Some("$argon2id$fake".to_string()),
            creator,
        );

        assert!(channel.is_private);
        assert!(channel.password_hash.is_some());
    }

    #[test]
    fn test_non_member() {
        let creator = UserId::new("alice".to_string());
        let channel = Channel::new(
            "general".to_string(),
            "Everyday banter".to_string(),
            None,
            creator,
        );

        let outsider = UserId::new("bob".to_string());
        assert!(!channel.is_member(&outsider));
    }
}
