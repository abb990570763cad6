//! Capture session configuration

use std::path::PathBuf;

/// Rotation threshold used when none is configured
pub const DEFAULT_MAX_RECORDS_PER_FILE: usize = 100_000;

/// Runtime configuration for one capture session
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Destination directory for batch files
    pub save_dir: PathBuf,
    /// Keyword filter, handed to the stream subscription verbatim
    pub words: Vec<String>,
    /// Stop after this many accepted events (None = capture until the
    /// stream ends)
    pub max_tweets: Option<u64>,
    /// Rotate to a new batch file once this many records are buffered
    pub max_records_per_file: usize,
    /// Zstd compression level for batch files
    pub zstd_level: i32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            save_dir: PathBuf::from("tweets"),
            words: Vec::new(),
            max_tweets: None,
            max_records_per_file: DEFAULT_MAX_RECORDS_PER_FILE,
            zstd_level: 3,
        }
    }
}
