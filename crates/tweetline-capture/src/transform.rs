//! Record slices to Arrow batches

use std::sync::Arc;

use arrow::array::{
    ArrayRef, BooleanArray, Int64Array, ListBuilder, RecordBatch, StringArray, StringBuilder,
    TimestampMicrosecondArray,
};
use arrow::error::ArrowError;

use crate::record::Record;
use crate::schema;

/// Build a batch from buffered records, preserving accumulation order.
///
/// An empty slice yields a valid zero-row table rather than an error, so a
/// caller flushing nothing degrades gracefully.
pub fn records_to_batch(records: &[Record]) -> Result<RecordBatch, ArrowError> {
    let schema = Arc::new(schema::records().clone());
    if records.is_empty() {
        return Ok(RecordBatch::new_empty(schema));
    }

    let ids = Int64Array::from_iter_values(records.iter().map(|r| r.id));
    let usernames = StringArray::from_iter_values(records.iter().map(|r| r.username.as_str()));
    let descriptions: StringArray = records.iter().map(|r| r.description.as_deref()).collect();
    let locations: StringArray = records.iter().map(|r| r.location.as_deref()).collect();
    let following = Int64Array::from_iter_values(records.iter().map(|r| r.following));
    let followers = Int64Array::from_iter_values(records.iter().map(|r| r.followers));
    let total_tweets = Int64Array::from_iter_values(records.iter().map(|r| r.total_tweets));
    let user_created = TimestampMicrosecondArray::from(
        records
            .iter()
            .map(|r| r.user_created_at.map(|t| t.timestamp_micros()))
            .collect::<Vec<_>>(),
    );
    let tweet_created = TimestampMicrosecondArray::from(
        records
            .iter()
            .map(|r| r.created_at.map(|t| t.timestamp_micros()))
            .collect::<Vec<_>>(),
    );
    let retweet_counts = Int64Array::from_iter_values(records.iter().map(|r| r.retweet_count));
    let hashtags = build_hashtags(records);
    let is_retweet = BooleanArray::from(records.iter().map(|r| r.is_retweet).collect::<Vec<_>>());
    let texts = StringArray::from_iter_values(records.iter().map(|r| r.text.as_str()));

    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(ids),
            Arc::new(usernames),
            Arc::new(descriptions),
            Arc::new(locations),
            Arc::new(following),
            Arc::new(followers),
            Arc::new(total_tweets),
            Arc::new(user_created),
            Arc::new(tweet_created),
            Arc::new(retweet_counts),
            hashtags,
            Arc::new(is_retweet),
            Arc::new(texts),
        ],
    )
}

/// Build List<Utf8> array of hashtag sets, one list per record
fn build_hashtags(records: &[Record]) -> ArrayRef {
    let mut builder = ListBuilder::new(StringBuilder::new());
    for record in records {
        for tag in &record.hashtags {
            builder.values().append_value(tag);
        }
        builder.append(true);
    }
    Arc::new(builder.finish())
}
