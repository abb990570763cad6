//! Tweetline Capture - keyword stream capture with bounded batch rotation
//!
//! Receives a push-based event feed, flattens each event into a typed
//! record, and rotates zstd Parquet batch files in a save directory. The
//! collector owns all buffering state; the stream source only delivers
//! events and honors the returned continuation signal.

pub mod collector;
pub mod config;
pub mod event;
pub mod record;
pub mod runner;
pub mod schema;
pub mod source;
pub mod transform;

// Re-exports for convenience
pub use collector::{BatchCollector, Signal};
pub use config::{CaptureConfig, DEFAULT_MAX_RECORDS_PER_FILE};
pub use event::RawEvent;
pub use record::{Record, extract};
pub use runner::{Summary, run};
pub use source::{EventStream, FileSource, HttpSource};
