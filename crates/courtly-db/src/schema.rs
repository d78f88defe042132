use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

/// SQL expression for the created/updated column defaults: UTC ISO-8601
/// with milliseconds, e.g. `2024-05-01T09:30:12.345Z`.
const NOW_UTC_MS: &str = "strftime('%Y-%m-%dT%H:%M:%fZ', 'now')";

pub fn apply(conn: &Connection) -> Result<()> {
    // `like` and `match` are SQL keywords, hence the quoting. No foreign
    // keys: rows reference each other by natural key only.
    conn.execute_batch(&format!(
        "
        CREATE TABLE IF NOT EXISTS recommendations (
            id                      VARCHAR(36) NOT NULL,
            channel                 VARCHAR(32) NOT NULL,
            channel_id              VARCHAR(64) NOT NULL,
            created_date            DATETIME DEFAULT ({now}),
            updated_date            DATETIME DEFAULT ({now}),
            name                    VARCHAR(32) DEFAULT NULL,
            thumbnail_url           VARCHAR(512) DEFAULT NULL,
            photos                  TEXT NOT NULL,
            photos_similarity_mean  REAL DEFAULT NULL,
            checked_out_times       INTEGER NOT NULL DEFAULT 0,
            last_checked_out_date   DATETIME DEFAULT NULL,
            \"like\"                INTEGER NOT NULL DEFAULT 0,
            is_pass                 INTEGER NOT NULL DEFAULT 0,
            decision_date           DATETIME DEFAULT NULL,
            is_human_decision       INTEGER NOT NULL DEFAULT 0,
            \"match\"               INTEGER NOT NULL DEFAULT 0,
            match_id                VARCHAR(64) DEFAULT NULL,
            matched_date            DATETIME DEFAULT NULL,
            train                   INTEGER NOT NULL DEFAULT 0,
            trained_date            DATETIME DEFAULT NULL,
            data                    TEXT NOT NULL,
            PRIMARY KEY (channel, channel_id)
        );

        CREATE TABLE IF NOT EXISTS channels (
            name                VARCHAR(32) NOT NULL,
            created_date        DATETIME DEFAULT ({now}),
            updated_date        DATETIME DEFAULT ({now}),
            is_enabled          INTEGER NOT NULL DEFAULT 0,
            user_id             VARCHAR(64) DEFAULT NULL,
            auth_id             INTEGER NULL,
            last_activity_date  DATETIME DEFAULT ({now}),
            is_out_of_likes     INTEGER NOT NULL DEFAULT 0,
            out_of_likes_date   DATETIME DEFAULT NULL,
            PRIMARY KEY (name)
        );

        CREATE TABLE IF NOT EXISTS auth (
            id            INTEGER PRIMARY KEY,
            created_date  DATETIME DEFAULT ({now}),
            updated_date  DATETIME DEFAULT ({now}),
            token         TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS stats (
            date            DATE PRIMARY KEY,
            created_date    DATETIME DEFAULT ({now}),
            updated_date    DATETIME DEFAULT ({now}),
            machine_likes   INTEGER NOT NULL DEFAULT 0,
            human_likes     INTEGER NOT NULL DEFAULT 0,
            machine_passes  INTEGER NOT NULL DEFAULT 0,
            human_passes    INTEGER NOT NULL DEFAULT 0,
            trains          INTEGER NOT NULL DEFAULT 0,
            matches         INTEGER NOT NULL DEFAULT 0,
            skips           INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS messages (
            channel             VARCHAR(32) NOT NULL,
            channel_message_id  VARCHAR(64) NOT NULL,
            created_date        DATETIME DEFAULT ({now}),
            updated_date        DATETIME DEFAULT ({now}),
            recommendation_id   VARCHAR(36) NOT NULL,
            sent_date           DATETIME NOT NULL,
            is_from_recommendation INTEGER NOT NULL,
            text                TEXT NOT NULL,
            PRIMARY KEY (channel, channel_message_id)
        );
        ",
        now = NOW_UTC_MS,
    ))?;

    info!("Database schema applied");
    Ok(())
}
