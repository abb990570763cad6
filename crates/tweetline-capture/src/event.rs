//! Inbound stream payloads.
//!
//! Field shapes follow the v1.1 streaming status object. Everything the
//! extractor touches is an explicit optional field: a repost carries the
//! original status nested under `retweeted_status`, and long-form text
//! lives under `extended_tweet.full_text` when present.

use serde::Deserialize;

/// One inbound unit from the stream subscription.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawEvent {
    pub id: i64,
    /// Short-form (possibly truncated) body text
    pub text: Option<String>,
    pub created_at: Option<String>,
    pub retweet_count: i64,
    pub user: StreamUser,
    pub entities: Entities,
    /// Long-form text container, present only when the body was truncated
    pub extended_tweet: Option<ExtendedTweet>,
    /// The wrapped original, present iff this event is a repost
    pub retweeted_status: Option<Box<RawEvent>>,
}

/// Author metadata as delivered on every status
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StreamUser {
    pub screen_name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub friends_count: i64,
    pub followers_count: i64,
    pub statuses_count: i64,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Entities {
    pub hashtags: Vec<Hashtag>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Hashtag {
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExtendedTweet {
    pub full_text: Option<String>,
}

impl RawEvent {
    /// Parse one stream line.
    ///
    /// Returns None for keep-alive blanks and for control messages (limit
    /// notices, delete events, disconnects) that carry no status id.
    pub fn from_line(line: &str) -> Option<RawEvent> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let value: serde_json::Value = serde_json::from_str(line).ok()?;
        if value.get("id").is_none() || value.get("user").is_none() {
            if let Some(limit) = value.get("limit") {
                log::warn!("stream limit notice: {limit}");
            }
            return None;
        }
        serde_json::from_value(value).ok()
    }
}
