use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use courtly_types::{Auth, Channel, Message, Recommendation, Stats};
use rusqlite::Row;
use rusqlite::types::Type;

use crate::Database;

/// Timestamp format matching the schema defaults.
const TS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

impl Database {
    // -- Recommendations --

    /// Inserts the recommendation, or updates it in place when the
    /// `(channel, channel_id)` row already exists. The original uuid and
    /// `created_date` survive an update; `updated_date` is bumped.
    pub fn save_recommendation(&self, rec: &Recommendation) -> Result<()> {
        let photos = serde_json::to_string(&rec.photos)?;
        let data = serde_json::to_string(&rec.data)?;
        self.run(
            "INSERT INTO recommendations (
                 id, channel, channel_id, name, thumbnail_url, photos,
                 photos_similarity_mean, checked_out_times, last_checked_out_date,
                 \"like\", is_pass, decision_date, is_human_decision,
                 \"match\", match_id, matched_date, train, trained_date, data
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)
             ON CONFLICT (channel, channel_id) DO UPDATE SET
                 name = excluded.name,
                 thumbnail_url = excluded.thumbnail_url,
                 photos = excluded.photos,
                 photos_similarity_mean = excluded.photos_similarity_mean,
                 checked_out_times = excluded.checked_out_times,
                 last_checked_out_date = excluded.last_checked_out_date,
                 \"like\" = excluded.\"like\",
                 is_pass = excluded.is_pass,
                 decision_date = excluded.decision_date,
                 is_human_decision = excluded.is_human_decision,
                 \"match\" = excluded.\"match\",
                 match_id = excluded.match_id,
                 matched_date = excluded.matched_date,
                 train = excluded.train,
                 trained_date = excluded.trained_date,
                 data = excluded.data,
                 updated_date = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
            rusqlite::params![
                rec.id,
                rec.channel,
                rec.channel_id,
                rec.name,
                rec.thumbnail_url,
                photos,
                rec.photos_similarity_mean,
                rec.checked_out_times,
                rec.last_checked_out_date.map(format_ts),
                rec.like,
                rec.is_pass,
                rec.decision_date.map(format_ts),
                rec.is_human_decision,
                rec.is_match,
                rec.match_id,
                rec.matched_date.map(format_ts),
                rec.train,
                rec.trained_date.map(format_ts),
                data,
            ],
        )?;
        Ok(())
    }

    pub fn find_recommendation(
        &self,
        channel: &str,
        channel_id: &str,
    ) -> Result<Option<Recommendation>> {
        self.get(
            &format!(
                "{RECOMMENDATION_COLUMNS} WHERE channel = ?1 AND channel_id = ?2"
            ),
            [channel, channel_id],
            map_recommendation,
        )
    }

    pub fn all_recommendations(&self) -> Result<Vec<Recommendation>> {
        self.all(RECOMMENDATION_COLUMNS, [], map_recommendation)
    }

    // -- Channels --

    pub fn save_channel(&self, channel: &Channel) -> Result<()> {
        self.run(
            "INSERT INTO channels (
                 name, is_enabled, user_id, auth_id, last_activity_date,
                 is_out_of_likes, out_of_likes_date
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT (name) DO UPDATE SET
                 is_enabled = excluded.is_enabled,
                 user_id = excluded.user_id,
                 auth_id = excluded.auth_id,
                 last_activity_date = excluded.last_activity_date,
                 is_out_of_likes = excluded.is_out_of_likes,
                 out_of_likes_date = excluded.out_of_likes_date,
                 updated_date = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
            rusqlite::params![
                channel.name,
                channel.is_enabled,
                channel.user_id,
                channel.auth_id,
                format_ts(channel.last_activity_date),
                channel.is_out_of_likes,
                channel.out_of_likes_date.map(format_ts),
            ],
        )?;
        Ok(())
    }

    pub fn find_channel(&self, name: &str) -> Result<Option<Channel>> {
        self.get(
            &format!("{CHANNEL_COLUMNS} WHERE name = ?1"),
            [name],
            map_channel,
        )
    }

    pub fn all_channels(&self) -> Result<Vec<Channel>> {
        self.all(CHANNEL_COLUMNS, [], map_channel)
    }

    // -- Auth --

    /// Stores a token and returns its assigned id.
    pub fn insert_auth(&self, token: &str) -> Result<i64> {
        let result = self.run("INSERT INTO auth (token) VALUES (?1)", [token])?;
        Ok(result.last_insert_rowid)
    }

    pub fn find_auth(&self, id: i64) -> Result<Option<Auth>> {
        self.get(&format!("{AUTH_COLUMNS} WHERE id = ?1"), [id], map_auth)
    }

    pub fn update_auth_token(&self, id: i64, token: &str) -> Result<()> {
        self.run(
            "UPDATE auth SET token = ?1,
                 updated_date = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
             WHERE id = ?2",
            rusqlite::params![token, id],
        )?;
        Ok(())
    }

    // -- Stats --

    pub fn save_stats(&self, stats: &Stats) -> Result<()> {
        self.run(
            "INSERT INTO stats (
                 date, machine_likes, human_likes, machine_passes, human_passes,
                 trains, matches, skips
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT (date) DO UPDATE SET
                 machine_likes = excluded.machine_likes,
                 human_likes = excluded.human_likes,
                 machine_passes = excluded.machine_passes,
                 human_passes = excluded.human_passes,
                 trains = excluded.trains,
                 matches = excluded.matches,
                 skips = excluded.skips,
                 updated_date = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
            rusqlite::params![
                stats.date.format("%Y-%m-%d").to_string(),
                stats.machine_likes,
                stats.human_likes,
                stats.machine_passes,
                stats.human_passes,
                stats.trains,
                stats.matches,
                stats.skips,
            ],
        )?;
        Ok(())
    }

    pub fn find_stats(&self, date: NaiveDate) -> Result<Option<Stats>> {
        self.get(
            &format!("{STATS_COLUMNS} WHERE date = ?1"),
            [date.format("%Y-%m-%d").to_string()],
            map_stats,
        )
    }

    pub fn all_stats(&self) -> Result<Vec<Stats>> {
        self.all(&format!("{STATS_COLUMNS} ORDER BY date"), [], map_stats)
    }

    // -- Messages --

    pub fn save_message(&self, message: &Message) -> Result<()> {
        self.run(
            "INSERT INTO messages (
                 channel, channel_message_id, recommendation_id, sent_date,
                 is_from_recommendation, text
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (channel, channel_message_id) DO UPDATE SET
                 recommendation_id = excluded.recommendation_id,
                 sent_date = excluded.sent_date,
                 is_from_recommendation = excluded.is_from_recommendation,
                 text = excluded.text,
                 updated_date = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
            rusqlite::params![
                message.channel,
                message.channel_message_id,
                message.recommendation_id,
                format_ts(message.sent_date),
                message.is_from_recommendation,
                message.text,
            ],
        )?;
        Ok(())
    }

    pub fn messages_for_recommendation(&self, recommendation_id: &str) -> Result<Vec<Message>> {
        self.all(
            &format!("{MESSAGE_COLUMNS} WHERE recommendation_id = ?1 ORDER BY sent_date"),
            [recommendation_id],
            map_message,
        )
    }

    pub fn messages_for_channel(&self, channel: &str) -> Result<Vec<Message>> {
        self.all(
            &format!("{MESSAGE_COLUMNS} WHERE channel = ?1 ORDER BY sent_date"),
            [channel],
            map_message,
        )
    }
}

const RECOMMENDATION_COLUMNS: &str = "SELECT id, channel, channel_id, name, thumbnail_url, photos,
     photos_similarity_mean, checked_out_times, last_checked_out_date,
     \"like\", is_pass, decision_date, is_human_decision,
     \"match\", match_id, matched_date, train, trained_date, data,
     created_date, updated_date
 FROM recommendations";

const CHANNEL_COLUMNS: &str = "SELECT name, is_enabled, user_id, auth_id, last_activity_date,
     is_out_of_likes, out_of_likes_date, created_date, updated_date
 FROM channels";

const AUTH_COLUMNS: &str = "SELECT id, token, created_date, updated_date FROM auth";

const STATS_COLUMNS: &str = "SELECT date, machine_likes, human_likes, machine_passes, human_passes,
     trains, matches, skips, created_date, updated_date
 FROM stats";

const MESSAGE_COLUMNS: &str = "SELECT channel, channel_message_id, recommendation_id, sent_date,
     is_from_recommendation, text, created_date, updated_date
 FROM messages";

fn map_recommendation(row: &Row<'_>) -> rusqlite::Result<Recommendation> {
    Ok(Recommendation {
        id: row.get(0)?,
        channel: row.get(1)?,
        channel_id: row.get(2)?,
        name: row.get(3)?,
        thumbnail_url: row.get(4)?,
        photos: parse_json(5, row.get(5)?)?,
        photos_similarity_mean: row.get(6)?,
        checked_out_times: row.get(7)?,
        last_checked_out_date: parse_opt_ts(8, row.get(8)?)?,
        like: row.get(9)?,
        is_pass: row.get(10)?,
        decision_date: parse_opt_ts(11, row.get(11)?)?,
        is_human_decision: row.get(12)?,
        is_match: row.get(13)?,
        match_id: row.get(14)?,
        matched_date: parse_opt_ts(15, row.get(15)?)?,
        train: row.get(16)?,
        trained_date: parse_opt_ts(17, row.get(17)?)?,
        data: parse_json(18, row.get(18)?)?,
        created_date: parse_ts(19, row.get(19)?)?,
        updated_date: parse_ts(20, row.get(20)?)?,
    })
}

fn map_channel(row: &Row<'_>) -> rusqlite::Result<Channel> {
    Ok(Channel {
        name: row.get(0)?,
        is_enabled: row.get(1)?,
        user_id: row.get(2)?,
        auth_id: row.get(3)?,
        last_activity_date: parse_ts(4, row.get(4)?)?,
        is_out_of_likes: row.get(5)?,
        out_of_likes_date: parse_opt_ts(6, row.get(6)?)?,
        created_date: parse_ts(7, row.get(7)?)?,
        updated_date: parse_ts(8, row.get(8)?)?,
    })
}

fn map_auth(row: &Row<'_>) -> rusqlite::Result<Auth> {
    Ok(Auth {
        id: row.get(0)?,
        token: row.get(1)?,
        created_date: parse_ts(2, row.get(2)?)?,
        updated_date: parse_ts(3, row.get(3)?)?,
    })
}

fn map_stats(row: &Row<'_>) -> rusqlite::Result<Stats> {
    Ok(Stats {
        date: parse_date(0, row.get(0)?)?,
        machine_likes: row.get(1)?,
        human_likes: row.get(2)?,
        machine_passes: row.get(3)?,
        human_passes: row.get(4)?,
        trains: row.get(5)?,
        matches: row.get(6)?,
        skips: row.get(7)?,
        created_date: parse_ts(8, row.get(8)?)?,
        updated_date: parse_ts(9, row.get(9)?)?,
    })
}

fn map_message(row: &Row<'_>) -> rusqlite::Result<Message> {
    Ok(Message {
        channel: row.get(0)?,
        channel_message_id: row.get(1)?,
        recommendation_id: row.get(2)?,
        sent_date: parse_ts(3, row.get(3)?)?,
        is_from_recommendation: row.get(4)?,
        text: row.get(5)?,
        created_date: parse_ts(6, row.get(6)?)?,
        updated_date: parse_ts(7, row.get(7)?)?,
    })
}

fn format_ts(ts: DateTime<Utc>) -> String {
    ts.format(TS_FORMAT).to_string()
}

fn parse_ts(idx: usize, raw: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_opt_ts(idx: usize, raw: Option<String>) -> rusqlite::Result<Option<DateTime<Utc>>> {
    raw.map(|s| parse_ts(idx, s)).transpose()
}

fn parse_date(idx: usize, raw: String) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_json<T: serde::de::DeserializeOwned>(idx: usize, raw: String) -> rusqlite::Result<T> {
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
