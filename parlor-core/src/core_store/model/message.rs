/*
    message.rs - Message model and enrichment metadata

    Represents a single message in a channel.

    - id: unique identifier
    - user_id: author
    - body: plain text, at most 1000 chars
    - meta: optional link preview, assigned exactly once by the
      enrichment pipeline after the message is posted
*/

use super::profile::MemberProfile;
use super::types::{ChannelId, MessageId, Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// What the enriched link points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetaKind {
    /// A raster image (jpg/png/apng/webp/gif/avif)
    Image,
    /// An HTML page with at least a title
    Page,
}

/// Link preview extracted from the first URL in a message body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageMeta {
    pub kind: MetaKind,

    /// The link itself, as found in the body
    pub url: String,

    /// Page title (pages only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Page description (pages only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Absolute URL of a preview image (pages only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_image: Option<String>,
}

impl MessageMeta {
    /// Meta for a link that resolved to a raster image
    pub fn image(url: String) -> Self {
        MessageMeta {
            kind: MetaKind::Image,
            url,
            title: None,
            description: None,
            preview_image: None,
        }
    }

    /// Meta for a link that resolved to an HTML page
    pub fn page(
        url: String,
        title: String,
        description: Option<String>,
        preview_image: Option<String>,
    ) -> Self {
        MessageMeta {
            kind: MetaKind::Page,
            url,
            title: Some(title),
            description,
            preview_image,
        }
    }
}

/// Message in a channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: MessageId,

    /// Channel this message belongs to
    pub channel_id: ChannelId,

    /// User who sent this message
    pub user_id: UserId,

    /// Plain-text message body
    pub body: String,

    /// When the message was created
    pub created_at: Timestamp,

    /// Link preview, set asynchronously after posting
    pub meta: Option<MessageMeta>,
}

impl Message {
    /// Create a new message with no enrichment metadata
    pub fn new(channel_id: ChannelId, user_id: UserId, body: String) -> Self {
        Message {
            id: MessageId::generate(),
            channel_id,
            user_id,
            body,
            created_at: Timestamp::now(),
            meta: None,
        }
    }

    /// Check whether the enrichment pipeline has produced a preview
    pub fn is_enriched(&self) -> bool {
        self.meta.is_some()
    }
}

/// Event-payload projection of a message with its author populated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageView {
    pub id: MessageId,
    pub body: String,
    pub created_at: Timestamp,
    pub author: MemberProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<MessageMeta>,
}

impl MessageView {
    /// Join a message with its author's profile
    pub fn from_message(message: Message, author: MemberProfile) -> Self {
        MessageView {
            id: message.id,
            body: message.body,
            created_at: message.created_at,
            author,
            meta: message.meta,
        }
    }
}
