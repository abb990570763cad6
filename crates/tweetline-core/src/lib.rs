//! Tweetline Core - shared infrastructure for stream capture pipelines
//!
//! This crate provides the pieces that are not specific to any one feed:
//! HTTP line streaming, Parquet sinks, logging, progress reporting, and
//! graceful shutdown.

pub mod logging;
pub mod progress;
pub mod shutdown;
pub mod sink;
pub mod stream;

// Re-exports for convenience
pub use logging::{IndicatifLogger, init_logging};
pub use progress::{ProgressContext, fmt_num};
pub use shutdown::{is_shutdown_requested, request_shutdown, shutdown_flag};
pub use sink::{ParquetSink, cleanup_tmp_files, is_valid_parquet};
pub use stream::{LineStream, StreamError, open_line_stream};
