//! Arrow schema for captured records
//!
//! The id column leads so a batch file reads as a table keyed by record id.

use std::sync::{Arc, LazyLock};

use arrow::datatypes::{DataType, Field, Schema, TimeUnit};

/// Captured-record schema, shared by the transform and every sink
pub static RECORDS: LazyLock<Arc<Schema>> = LazyLock::new(|| {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("username", DataType::Utf8, false),
        Field::new("description", DataType::Utf8, true),
        Field::new("location", DataType::Utf8, true),
        Field::new("following", DataType::Int64, false),
        Field::new("followers", DataType::Int64, false),
        Field::new("total_tweets", DataType::Int64, false),
        Field::new("user_created_at", timestamp_us(), true),
        Field::new("tweet_created_at", timestamp_us(), true),
        Field::new("retweet_count", DataType::Int64, false),
        Field::new("hashtags", list_utf8(), true),
        Field::new("is_retweet", DataType::Boolean, false),
        Field::new("text", DataType::Utf8, false),
    ]))
});

fn timestamp_us() -> DataType {
    DataType::Timestamp(TimeUnit::Microsecond, None)
}

/// Helper: create List<Utf8> type
fn list_utf8() -> DataType {
    DataType::List(Arc::new(Field::new("item", DataType::Utf8, true)))
}

pub fn records() -> &'static Schema {
    &RECORDS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_has_expected_fields() {
        let schema = records();
        assert!(schema.field_with_name("id").is_ok());
        assert!(schema.field_with_name("username").is_ok());
        assert!(schema.field_with_name("hashtags").is_ok());
        assert!(schema.field_with_name("is_retweet").is_ok());
        assert!(schema.field_with_name("text").is_ok());
    }

    #[test]
    fn id_leads_and_is_required() {
        let schema = records();
        assert_eq!(schema.field(0).name(), "id");
        assert!(!schema.field(0).is_nullable());
    }

    #[test]
    fn timestamps_are_nullable() {
        let schema = records();
        assert!(schema.field_with_name("tweet_created_at").unwrap().is_nullable());
        assert!(schema.field_with_name("user_created_at").unwrap().is_nullable());
    }
}
