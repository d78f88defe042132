use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A candidate profile under evaluation. Keyed by the channel it came from
/// plus the channel's own id for the profile; `id` is our uuid for it,
/// referenced by [`Message::recommendation_id`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: String,
    pub channel: String,
    pub channel_id: String,
    pub name: Option<String>,
    pub thumbnail_url: Option<String>,
    pub photos: Vec<String>,
    pub photos_similarity_mean: Option<f64>,
    pub checked_out_times: i64,
    pub last_checked_out_date: Option<DateTime<Utc>>,
    pub like: bool,
    pub is_pass: bool,
    pub decision_date: Option<DateTime<Utc>>,
    pub is_human_decision: bool,
    #[serde(rename = "match")]
    pub is_match: bool,
    pub match_id: Option<String>,
    pub matched_date: Option<DateTime<Utc>>,
    pub train: bool,
    pub trained_date: Option<DateTime<Utc>>,
    /// Raw channel payload for the profile, kept opaque.
    pub data: serde_json::Value,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
}

impl Recommendation {
    /// A freshly observed profile: new uuid, zeroed counters, no decision yet.
    pub fn new(
        channel: impl Into<String>,
        channel_id: impl Into<String>,
        photos: Vec<String>,
        data: serde_json::Value,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            channel: channel.into(),
            channel_id: channel_id.into(),
            name: None,
            thumbnail_url: None,
            photos,
            photos_similarity_mean: None,
            checked_out_times: 0,
            last_checked_out_date: None,
            like: false,
            is_pass: false,
            decision_date: None,
            is_human_decision: false,
            is_match: false,
            match_id: None,
            matched_date: None,
            train: false,
            trained_date: None,
            data,
            created_date: now,
            updated_date: now,
        }
    }
}

/// A messaging/dating platform session, keyed by platform name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub name: String,
    pub is_enabled: bool,
    pub user_id: Option<String>,
    pub auth_id: Option<i64>,
    pub last_activity_date: DateTime<Utc>,
    pub is_out_of_likes: bool,
    pub out_of_likes_date: Option<DateTime<Utc>>,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
}

/// A stored access token for an external service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Auth {
    pub id: i64,
    pub token: String,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
}

/// Per-day decision counters. One row per calendar date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stats {
    pub date: NaiveDate,
    pub machine_likes: i64,
    pub human_likes: i64,
    pub machine_passes: i64,
    pub human_passes: i64,
    pub trains: i64,
    pub matches: i64,
    pub skips: i64,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
}

/// A message exchanged with a matched recommendation.
/// `is_from_recommendation` is true when they sent it, false when we did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub channel: String,
    pub channel_message_id: String,
    pub recommendation_id: String,
    pub sent_date: DateTime<Utc>,
    pub is_from_recommendation: bool,
    pub text: String,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_recommendation_starts_undecided() {
        let rec = Recommendation::new("tinder", "abc", vec![], serde_json::json!({}));
        assert!(!rec.like && !rec.is_pass && !rec.is_match && !rec.train);
        assert_eq!(rec.checked_out_times, 0);
        assert!(rec.decision_date.is_none());
        assert_eq!(rec.id.len(), 36);
    }

    #[test]
    fn match_flag_serializes_under_original_name() {
        let mut rec = Recommendation::new("tinder", "abc", vec![], serde_json::json!({}));
        rec.is_match = true;
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["match"], true);
        assert!(json.get("is_match").is_none());
    }
}
