//! SQL-based storage for channels, messages and profiles

use super::errors::{StoreError, StoreResult};
use crate::core_store::model::{
    Channel, ChannelId, MemberProfile, Message, MessageId, MessageMeta, MessageView, Timestamp,
    UserId,
};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension, Row};
use std::collections::HashSet;
use std::path::Path;

/// SQL-based chat store, the single source of truth for channels,
/// membership, messages and member profiles.
#[derive(Clone)]
pub struct ChatStore {
    pool: Pool<SqliteConnectionManager>,
}

impl ChatStore {
    /// Create a new store with the given connection pool
    pub fn new(pool: Pool<SqliteConnectionManager>) -> StoreResult<Self> {
        // Run migrations
        super::migrations::migrate(&pool)?;

        Ok(Self { pool })
    }

    /// Open (or create) a store backed by a database file
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::new(manager)?;
        Self::new(pool)
    }

    /// Create a new in-memory store (for testing)
    pub fn memory() -> StoreResult<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager)?;
        Self::new(pool)
    }

    // ===== Channel Operations =====

    /// Insert a new channel together with its initial members
    pub fn create_channel(&self, channel: &Channel) -> StoreResult<()> {
        let conn = self.pool.get()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            "INSERT INTO channels (id, name, description, is_private, password_hash, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                channel.id.to_string(),
                &channel.name,
                &channel.description,
                channel.is_private,
                &channel.password_hash,
                channel.created_at.as_millis() as i64,
            ],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::DuplicateName(channel.name.clone())
            } else {
                StoreError::Sqlite(e)
            }
        })?;

        for user_id in &channel.members {
            tx.execute(
                "INSERT INTO channel_members (channel_id, user_id, joined_at) VALUES (?, ?, ?)",
                params![
                    channel.id.to_string(),
                    user_id.to_string(),
                    channel.created_at.as_millis() as i64,
                ],
            )?;
        }

        tx.commit()?;

        Ok(())
    }

    /// Get a channel by ID, with its member set populated
    pub fn get_channel(&self, channel_id: &ChannelId) -> StoreResult<Option<Channel>> {
        let conn = self.pool.get()?;

        let channel = conn
            .query_row(
                "SELECT id, name, description, is_private, password_hash, created_at
                 FROM channels WHERE id = ?",
                params![channel_id.to_string()],
                row_to_channel,
            )
            .optional()?;

        match channel {
            Some(mut channel) => {
                channel.members = self.channel_members(&conn, &channel.id)?;
                Ok(Some(channel))
            }
            None => Ok(None),
        }
    }

    /// Get a channel by its unique name, with its member set populated
    pub fn get_channel_by_name(&self, name: &str) -> StoreResult<Option<Channel>> {
        let conn = self.pool.get()?;

        let channel = conn
            .query_row(
                "SELECT id, name, description, is_private, password_hash, created_at
                 FROM channels WHERE name = ?",
                params![name],
                row_to_channel,
            )
            .optional()?;

        match channel {
            Some(mut channel) => {
                channel.members = self.channel_members(&conn, &channel.id)?;
                Ok(Some(channel))
            }
            None => Ok(None),
        }
    }

    /// List all channels in ascending creation order, members populated
    pub fn list_channels(&self) -> StoreResult<Vec<Channel>> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(
            "SELECT id, name, description, is_private, password_hash, created_at
             FROM channels ORDER BY created_at ASC, id ASC",
        )?;

        let mut channels = stmt
            .query_map([], row_to_channel)?
            .collect::<Result<Vec<_>, _>>()?;

        for channel in &mut channels {
            channel.members = self.channel_members(&conn, &channel.id)?;
        }

        Ok(channels)
    }

    /// Add a user to a channel's member set.
    ///
    /// Atomic add-to-set: concurrent calls for the same channel cannot lose
    /// an addition. Returns true if membership actually changed.
    pub fn add_member(&self, channel_id: &ChannelId, user_id: &UserId) -> StoreResult<bool> {
        let conn = self.pool.get()?;

        let inserted = conn.execute(
            "INSERT OR IGNORE INTO channel_members (channel_id, user_id, joined_at)
             VALUES (?, ?, ?)",
            params![
                channel_id.to_string(),
                user_id.to_string(),
                Timestamp::now().as_millis() as i64,
            ],
        )?;

        Ok(inserted == 1)
    }

    /// Profiles of a channel's members, in join order.
    ///
    /// Members the host never introduced by profile get a bare placeholder
    /// so payloads stay complete.
    pub fn member_profiles(&self, channel_id: &ChannelId) -> StoreResult<Vec<MemberProfile>> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(
            "SELECT cm.user_id, p.display_name, p.photo, p.online
             FROM channel_members cm
             LEFT JOIN profiles p ON p.user_id = cm.user_id
             WHERE cm.channel_id = ?
             ORDER BY cm.joined_at ASC, cm.user_id ASC",
        )?;

        let profiles = stmt
            .query_map(params![channel_id.to_string()], |row| {
                let user_id = UserId::new(row.get(0)?);
                let display_name: Option<String> = row.get(1)?;
                Ok(MemberProfile {
                    display_name: display_name.unwrap_or_else(|| user_id.to_string()),
                    photo: row.get(2)?,
                    online: row.get::<_, Option<bool>>(3)?.unwrap_or(false),
                    id: user_id,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(profiles)
    }

    // ===== Message Operations =====

    /// Insert a new message
    pub fn insert_message(&self, message: &Message) -> StoreResult<()> {
        let conn = self.pool.get()?;

        let meta = message
            .meta
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        conn.execute(
            "INSERT INTO messages (id, channel_id, user_id, body, created_at, meta)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                message.id.to_string(),
                message.channel_id.to_string(),
                message.user_id.to_string(),
                &message.body,
                message.created_at.as_millis() as i64,
                meta,
            ],
        )?;

        Ok(())
    }

    /// Get a message by ID
    pub fn get_message(&self, message_id: &MessageId) -> StoreResult<Option<Message>> {
        let conn = self.pool.get()?;

        let message = conn
            .query_row(
                "SELECT id, channel_id, user_id, body, created_at, meta
                 FROM messages WHERE id = ?",
                params![message_id.to_string()],
                row_to_message,
            )
            .optional()?;

        Ok(message)
    }

    /// Get a message by ID with its author's profile joined in
    pub fn message_view(&self, message_id: &MessageId) -> StoreResult<Option<MessageView>> {
        let conn = self.pool.get()?;

        let view = conn
            .query_row(
                "SELECT m.id, m.channel_id, m.user_id, m.body, m.created_at, m.meta,
                        p.display_name, p.photo, p.online
                 FROM messages m
                 LEFT JOIN profiles p ON p.user_id = m.user_id
                 WHERE m.id = ?",
                params![message_id.to_string()],
                |row| {
                    let message = row_to_message(row)?;
                    let display_name: Option<String> = row.get(6)?;
                    let author = MemberProfile {
                        display_name: display_name
                            .unwrap_or_else(|| message.user_id.to_string()),
                        photo: row.get(7)?,
                        online: row.get::<_, Option<bool>>(8)?.unwrap_or(false),
                        id: message.user_id.clone(),
                    };
                    Ok(MessageView::from_message(message, author))
                },
            )
            .optional()?;

        Ok(view)
    }

    /// Overwrite a message's enrichment metadata.
    ///
    /// Idempotent: repeating the same update is harmless.
    pub fn set_message_meta(
        &self,
        message_id: &MessageId,
        meta: &MessageMeta,
    ) -> StoreResult<()> {
        let conn = self.pool.get()?;

        let json = serde_json::to_string(meta)?;
        let updated = conn.execute(
            "UPDATE messages SET meta = ? WHERE id = ?",
            params![json, message_id.to_string()],
        )?;

        if updated == 0 {
            return Err(StoreError::NotFound(format!("message {}", message_id)));
        }

        Ok(())
    }

    /// Count all messages in a channel, ignoring pagination
    pub fn count_messages(&self, channel_id: &ChannelId) -> StoreResult<u64> {
        let conn = self.pool.get()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM messages WHERE channel_id = ?",
            params![channel_id.to_string()],
            |row| row.get(0),
        )?;

        Ok(count.max(0) as u64)
    }

    /// One page of a channel's messages, most recent first
    pub fn list_message_page(
        &self,
        channel_id: &ChannelId,
        skip: u64,
        per_page: u64,
    ) -> StoreResult<Vec<Message>> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(
            "SELECT id, channel_id, user_id, body, created_at, meta
             FROM messages WHERE channel_id = ?
             ORDER BY created_at DESC, id DESC
             LIMIT ? OFFSET ?",
        )?;

        let messages = stmt
            .query_map(
                params![channel_id.to_string(), per_page as i64, skip as i64],
                row_to_message,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(messages)
    }

    // ===== Profile Operations =====

    /// Inserts or refreshes a member profile. The `online` flag is only
    /// taken from `profile` on first insert; presence updates go through
    /// [`set_online`](Self::set_online).
    pub fn upsert_profile(&self, profile: &MemberProfile) -> StoreResult<()> {
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT INTO profiles (user_id, display_name, photo, online, updated_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET
                 display_name = excluded.display_name,
                 photo = excluded.photo,
                 updated_at = excluded.updated_at",
            params![
                profile.id.to_string(),
                &profile.display_name,
                &profile.photo,
                profile.online,
                Timestamp::now().as_millis() as i64,
            ],
        )?;

        Ok(())
    }

    /// Get a stored profile
    pub fn get_profile(&self, user_id: &UserId) -> StoreResult<Option<MemberProfile>> {
        let conn = self.pool.get()?;

        let profile = conn
            .query_row(
                "SELECT user_id, display_name, photo, online FROM profiles WHERE user_id = ?",
                params![user_id.to_string()],
                |row| {
                    Ok(MemberProfile {
                        id: UserId::new(row.get(0)?),
                        display_name: row.get(1)?,
                        photo: row.get(2)?,
                        online: row.get(3)?,
                    })
                },
            )
            .optional()?;

        Ok(profile)
    }

    /// Flip a member's presence flag, returning the updated profile
    pub fn set_online(&self, user_id: &UserId, online: bool) -> StoreResult<Option<MemberProfile>> {
        let conn = self.pool.get()?;

        let updated = conn.execute(
            "UPDATE profiles SET online = ?, updated_at = ? WHERE user_id = ?",
            params![online, Timestamp::now().as_millis() as i64, user_id.to_string()],
        )?;

        if updated == 0 {
            return Ok(None);
        }

        // Release the pooled connection before re-acquiring in get_profile;
        // holding it would exhaust a single-connection pool.
        drop(conn);
        self.get_profile(user_id)
    }

    fn channel_members(
        &self,
        conn: &r2d2::PooledConnection<SqliteConnectionManager>,
        channel_id: &ChannelId,
    ) -> StoreResult<HashSet<UserId>> {
        let mut stmt =
            conn.prepare("SELECT user_id FROM channel_members WHERE channel_id = ?")?;

        let members = stmt
            .query_map(params![channel_id.to_string()], |row| {
                Ok(UserId::new(row.get(0)?))
            })?
            .collect::<Result<HashSet<_>, _>>()?;

        Ok(members)
    }
}

fn row_to_channel(row: &Row<'_>) -> Result<Channel, rusqlite::Error> {
    Ok(Channel {
        id: ChannelId::new(row.get(0)?),
        name: row.get(1)?,
        description: row.get(2)?,
        is_private: row.get(3)?,
        password_hash: row.get(4)?,
        members: HashSet::new(),
        created_at: Timestamp::from_millis(row.get::<_, i64>(5)?.max(0) as u64),
    })
}

fn row_to_message(row: &Row<'_>) -> Result<Message, rusqlite::Error> {
    let meta: Option<String> = row.get(5)?;
    let meta = meta
        .map(|json| {
            serde_json::from_str(&json).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    5,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })
        })
        .transpose()?;

    Ok(Message {
        id: MessageId::new(row.get(0)?),
        channel_id: ChannelId::new(row.get(1)?),
        user_id: UserId::new(row.get(2)?),
        body: row.get(3)?,
        created_at: Timestamp::from_millis(row.get::<_, i64>(4)?.max(0) as u64),
        meta,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
