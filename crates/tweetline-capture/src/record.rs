//! Flattened capture records and the extraction rules that produce them

use chrono::{DateTime, Utc};

use crate::event::RawEvent;

/// Upstream timestamp format, e.g. "Wed Oct 10 20:19:24 +0000 2018"
const TIME_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// The persisted representation of one event. Immutable once extracted.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: i64,
    pub username: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub following: i64,
    pub followers: i64,
    pub total_tweets: i64,
    pub user_created_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub retweet_count: i64,
    pub hashtags: Vec<String>,
    pub is_retweet: bool,
    pub text: String,
}

/// Flatten one inbound event into an owned [`Record`].
///
/// Total: absent upstream fields resolve to defaults, never an error.
/// Text resolution: a repost reads from the wrapped original; the long
/// form is preferred over the truncated `text` on whichever status is the
/// source. All other fields come from the outer event.
pub fn extract(event: &RawEvent) -> Record {
    let text_source = event.retweeted_status.as_deref().unwrap_or(event);
    let text = text_source
        .extended_tweet
        .as_ref()
        .and_then(|ext| ext.full_text.clone())
        .or_else(|| text_source.text.clone())
        .unwrap_or_default();

    Record {
        id: event.id,
        username: event.user.screen_name.clone(),
        description: event.user.description.clone(),
        location: event.user.location.clone(),
        following: event.user.friends_count,
        followers: event.user.followers_count,
        total_tweets: event.user.statuses_count,
        user_created_at: parse_time(event.user.created_at.as_deref()),
        created_at: parse_time(event.created_at.as_deref()),
        retweet_count: event.retweet_count,
        hashtags: event
            .entities
            .hashtags
            .iter()
            .map(|h| h.text.clone())
            .collect(),
        is_retweet: event.retweeted_status.is_some(),
        text,
    }
}

fn parse_time(raw: Option<&str>) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(raw?, TIME_FORMAT)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
