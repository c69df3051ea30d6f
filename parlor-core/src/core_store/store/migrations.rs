//! Database migrations for the chat schema
//!
//! Provides versioned migrations for channels, members, messages and
//! profiles. Each migration is applied atomically and tracked in the
//! chat_schema_version table.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

/// Current schema version for the chat store
pub const CURRENT_CHAT_SCHEMA_VERSION: i32 = 1;

/// Migration descriptor
pub struct Migration {
    pub version: i32,
    pub description: &'static str,
    pub up_sql: &'static str,
    pub down_sql: Option<&'static str>,
}

/// All available migrations in order
pub fn get_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial channels, messages and profiles schema",
        up_sql: r#"
            -- Schema version tracking for the chat store
            CREATE TABLE IF NOT EXISTS chat_schema_version (
                version INTEGER PRIMARY KEY,
                applied_at INTEGER NOT NULL
            );

            -- Channels (named chat rooms)
            CREATE TABLE IF NOT EXISTS channels (
                id TEXT PRIMARY KEY,                    -- ChannelId (uuid)
                name TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL,
                is_private INTEGER NOT NULL DEFAULT 0,
                password_hash TEXT,                     -- present iff is_private
                created_at INTEGER NOT NULL,
                CHECK (
                    (is_private = 1 AND password_hash IS NOT NULL)
                    OR (is_private = 0 AND password_hash IS NULL)
                )
            );

            CREATE INDEX IF NOT EXISTS idx_channels_created ON channels(created_at);

            -- Channel Members (join table)
            CREATE TABLE IF NOT EXISTS channel_members (
                channel_id TEXT NOT NULL,               -- ChannelId
                user_id TEXT NOT NULL,                  -- UserId
                joined_at INTEGER NOT NULL,
                PRIMARY KEY (channel_id, user_id),
                FOREIGN KEY (channel_id) REFERENCES channels(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_channel_members_user ON channel_members(user_id);

            -- Messages (per-channel log)
            CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,                    -- MessageId (uuid)
                channel_id TEXT NOT NULL,               -- ChannelId
                user_id TEXT NOT NULL,                  -- UserId (author)
                body TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                meta TEXT,                              -- enrichment JSON, set once
                FOREIGN KEY (channel_id) REFERENCES channels(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_messages_channel_created
                ON messages(channel_id, created_at);

            -- Member profiles (projection of the host's identity layer)
            CREATE TABLE IF NOT EXISTS profiles (
                user_id TEXT PRIMARY KEY,
                display_name TEXT NOT NULL,
                photo TEXT,
                online INTEGER NOT NULL DEFAULT 0,
                updated_at INTEGER NOT NULL
            );
        "#,
        down_sql: Some(
            r#"
            DROP TABLE IF EXISTS profiles;

            DROP INDEX IF EXISTS idx_messages_channel_created;
            DROP TABLE IF EXISTS messages;

            DROP INDEX IF EXISTS idx_channel_members_user;
            DROP TABLE IF EXISTS channel_members;

            DROP INDEX IF EXISTS idx_channels_created;
            DROP TABLE IF EXISTS channels;

            DROP TABLE IF EXISTS chat_schema_version;
        "#,
        ),
    }]
}

/// Get current schema version from database
fn get_current_version(pool: &Pool<SqliteConnectionManager>) -> Result<i32, rusqlite::Error> {
    let conn = pool.get().map_err(|e| {
        rusqlite::Error::ToSqlConversionFailure(Box::new(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("Failed to get connection: {}", e),
        )))
    })?;

    // Ensure schema_version table exists
    conn.execute(
        "CREATE TABLE IF NOT EXISTS chat_schema_version (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let version: Result<i32, _> = conn.query_row(
        "SELECT version FROM chat_schema_version ORDER BY version DESC LIMIT 1",
        [],
        |row| row.get(0),
    );

    Ok(version.unwrap_or(0))
}

/// Run all pending migrations
pub fn migrate(pool: &Pool<SqliteConnectionManager>) -> Result<(), rusqlite::Error> {
    let current_version = get_current_version(pool)?;
    let migrations = get_migrations();

    let pending_migrations: Vec<_> =
        migrations.into_iter().filter(|m| m.version > current_version).collect();

    if pending_migrations.is_empty() {
        return Ok(());
    }

    let conn = pool.get().map_err(|e| {
        rusqlite::Error::ToSqlConversionFailure(Box::new(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("Failed to get connection: {}", e),
        )))
    })?;

    for migration in pending_migrations {
        let tx = conn.unchecked_transaction()?;

        // Run migration SQL
        tx.execute_batch(migration.up_sql)?;

        // Record migration
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("Time went backwards")
            .as_millis() as i64;

        tx.execute(
            "INSERT INTO chat_schema_version (version, applied_at) VALUES (?, ?)",
            params![migration.version, now],
        )?;

        tx.commit()?;

        info!(
            version = migration.version,
            description = migration.description,
            "Applied chat schema migration"
        );
    }

    Ok(())
}

/// Get the latest migration version available
pub fn get_latest_version() -> i32 {
    let migrations = get_migrations();
    migrations.iter().map(|m| m.version).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_test_pool() -> Pool<SqliteConnectionManager> {
        let manager = SqliteConnectionManager::memory();
        Pool::new(manager).expect("Failed to create pool")
    }

    #[test]
    fn test_initial_migration() {
        let pool = setup_test_pool();
        migrate(&pool).expect("Migration failed");

        let conn = pool.get().unwrap();

        // Check that all tables exist
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert!(tables.contains(&"channels".to_string()));
        assert!(tables.contains(&"channel_members".to_string()));
        assert!(tables.contains(&"messages".to_string()));
        assert!(tables.contains(&"profiles".to_string()));
    }

    #[test]
    fn test_migration_version_tracking() {
        let pool = setup_test_pool();
        migrate(&pool).expect("Migration failed");

        let version = get_current_version(&pool).expect("Failed to get version");
        assert_eq!(version, CURRENT_CHAT_SCHEMA_VERSION);
    }

    #[test]
    fn test_idempotent_migrations() {
        let pool = setup_test_pool();

        // Run migrations twice
        migrate(&pool).expect("First migration failed");
        migrate(&pool).expect("Second migration failed");

        // Version should still be correct
        let version = get_current_version(&pool).expect("Failed to get version");
        assert_eq!(version, CURRENT_CHAT_SCHEMA_VERSION);
    }

    #[test]
    fn test_unique_channel_name_constraint() {
        let pool = setup_test_pool();
        migrate(&pool).expect("Migration failed");

        let conn = pool.get().unwrap();
        let now = 1000i64;

        conn.execute(
            "INSERT INTO channels (id, name, description, is_private, created_at)
             VALUES (?, ?, ?, 0, ?)",
            params!["c1", "general", "Everyday banter", now],
        )
        .unwrap();

        let dup = conn.execute(
            "INSERT INTO channels (id, name, description, is_private, created_at)
             VALUES (?, ?, ?, 0, ?)",
            params!["c2", "general", "Another one", now],
        );
        assert!(dup.is_err());
    }

    #[test]
    fn test_private_channel_requires_hash() {
        let pool = setup_test_pool();
        migrate(&pool).expect("Migration failed");

        let conn = pool.get().unwrap();

        // Private without a hash violates the CHECK constraint
        let res = conn.execute(
            "INSERT INTO channels (id, name, description, is_private, created_at)
             VALUES (?, ?, ?, 1, ?)",
            params!["c1", "hideout", "Members only lounge", 1000i64],
        );
        assert!(res.is_err());

        // Private with a hash is fine
        conn.execute(
            "INSERT INTO channels (id, name, description, is_private, password_hash, created_at)
             VALUES (?, ?, ?, 1, ?, ?)",
            params!["c1", "hideout", "Members only lounge", "$argon2id$fake", 1000i64],
        )
        .unwrap();
    }

    #[test]
    fn test_foreign_key_cascade() {
        let pool = setup_test_pool();
        migrate(&pool).expect("Migration failed");

        let conn = pool.get().unwrap();

        // Enable foreign keys
        conn.execute("PRAGMA foreign_keys = ON", []).unwrap();

        let now = 1000i64;
        conn.execute(
            "INSERT INTO channels (id, name, description, is_private, created_at)
             VALUES (?, ?, ?, 0, ?)",
            params!["c1", "general", "Everyday banter", now],
        )
        .unwrap();

        conn.execute(
            "INSERT INTO channel_members (channel_id, user_id, joined_at) VALUES (?, ?, ?)",
            params!["c1", "u1", now],
        )
        .unwrap();

        conn.execute(
            "INSERT INTO messages (id, channel_id, user_id, body, created_at)
             VALUES (?, ?, ?, ?, ?)",
            params!["m1", "c1", "u1", "hello", now],
        )
        .unwrap();

        // Delete the channel - should cascade to members and messages
        conn.execute("DELETE FROM channels WHERE id = ?", params!["c1"]).unwrap();

        let members: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM channel_members WHERE channel_id = ?",
                params!["c1"],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(members, 0);

        let messages: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM messages WHERE channel_id = ?",
                params!["c1"],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(messages, 0);
    }
}
