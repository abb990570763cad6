//! Batch accumulation and file rotation.
//!
//! One collector per streaming session, passed to whatever drives the
//! subscription. Events are accepted one at a time; a full batch is written
//! out before the overall cap is checked, so a batch filled by the final
//! event is flushed exactly once.

use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tweetline_core::ParquetSink;

use crate::config::CaptureConfig;
use crate::event::RawEvent;
use crate::record::{Record, extract};
use crate::schema;
use crate::transform::records_to_batch;

/// Continuation signal returned to the stream source after each event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Continue,
    Stop,
}

impl Signal {
    pub fn should_stop(self) -> bool {
        self == Signal::Stop
    }
}

/// Stateful consumer that buffers extracted records and rotates batch files.
#[derive(Debug)]
pub struct BatchCollector {
    save_dir: PathBuf,
    max_records_per_file: usize,
    max_tweets: Option<u64>,
    zstd_level: i32,
    total: u64,
    batch: Vec<Record>,
    files: Vec<PathBuf>,
}

impl BatchCollector {
    pub fn new(config: &CaptureConfig) -> Self {
        Self {
            save_dir: config.save_dir.clone(),
            max_records_per_file: config.max_records_per_file.max(1),
            max_tweets: config.max_tweets,
            zstd_level: config.zstd_level,
            total: 0,
            batch: Vec::new(),
            files: Vec::new(),
        }
    }

    /// Accept one event: extract, buffer, rotate if the batch is full, and
    /// decide whether the stream should keep delivering.
    ///
    /// A flush failure surfaces here with the batch left in memory; the
    /// failed write is retried by the next rotation or an explicit
    /// [`flush`](Self::flush).
    pub fn accept(&mut self, event: &RawEvent) -> io::Result<Signal> {
        self.batch.push(extract(event));
        self.total += 1;

        if self.batch.len() >= self.max_records_per_file {
            self.flush()?;
        }

        if let Some(cap) = self.max_tweets {
            if self.total >= cap {
                // Already empty if the rotation above just fired
                self.flush()?;
                return Ok(Signal::Stop);
            }
        }
        Ok(Signal::Continue)
    }

    /// Write the buffered batch to a fresh uniquely named file, then clear
    /// it. No-op on an empty batch.
    ///
    /// On I/O failure the batch is left intact so the data can still be
    /// flushed by a retry.
    pub fn flush(&mut self) -> io::Result<Option<PathBuf>> {
        if self.batch.is_empty() {
            return Ok(None);
        }

        let path = self.save_dir.join(flush_name());
        let batch = records_to_batch(&self.batch).map_err(io::Error::other)?;
        let mut sink = ParquetSink::create(&path, schema::records(), self.zstd_level)?;
        sink.write_batch(&batch)?;
        let rows = sink.finalize()?;
        log::debug!("flushed {} records to {}", rows, path.display());

        self.batch.clear();
        self.files.push(path.clone());
        Ok(Some(path))
    }

    /// Files written so far, in write order. Callable mid-stream.
    pub fn filenames(&self) -> &[PathBuf] {
        &self.files
    }

    /// Events accepted so far
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Records currently buffered in memory
    pub fn buffered(&self) -> usize {
        self.batch.len()
    }

    /// Directory batch files are written into
    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }
}

/// Microsecond-resolution UTC timestamp keeps names unique at any
/// realistic flush rate.
fn flush_name() -> String {
    format!("tweets-{}.parquet", Utc::now().format("%Y%m%d-%H%M%S%6f"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Int64Array;
    use tempfile::TempDir;

    fn event(id: i64) -> RawEvent {
        let line = format!(
            r#"{{"id":{id},"text":"tweet {id}","user":{{"screen_name":"user{id}"}}}}"#
        );
        RawEvent::from_line(&line).unwrap()
    }

    fn config(dir: &Path, per_file: usize, cap: Option<u64>) -> CaptureConfig {
        CaptureConfig {
            save_dir: dir.to_path_buf(),
            max_records_per_file: per_file,
            max_tweets: cap,
            ..Default::default()
        }
    }

    fn read_ids(path: &Path) -> Vec<i64> {
        let file = std::fs::File::open(path).unwrap();
        let reader = parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder::try_new(file)
            .unwrap()
            .build()
            .unwrap();
        let mut ids = Vec::new();
        for batch in reader {
            let batch = batch.unwrap();
            let col = batch
                .column(0)
                .as_any()
                .downcast_ref::<Int64Array>()
                .unwrap();
            ids.extend(col.values().iter().copied());
        }
        ids
    }

    #[test]
    fn rotation_scenario_b3_m7() {
        let dir = TempDir::new().unwrap();
        let mut collector = BatchCollector::new(&config(dir.path(), 3, Some(7)));

        for id in 1..=6 {
            assert_eq!(collector.accept(&event(id)).unwrap(), Signal::Continue);
        }
        assert_eq!(collector.accept(&event(7)).unwrap(), Signal::Stop);

        let files = collector.filenames();
        assert_eq!(files.len(), 3);
        assert_eq!(read_ids(&files[0]), vec![1, 2, 3]);
        assert_eq!(read_ids(&files[1]), vec![4, 5, 6]);
        assert_eq!(read_ids(&files[2]), vec![7]);
        assert_eq!(collector.buffered(), 0);
        assert_eq!(collector.total(), 7);
    }

    #[test]
    fn uncapped_run_keeps_remainder_in_memory() {
        let dir = TempDir::new().unwrap();
        let mut collector = BatchCollector::new(&config(dir.path(), 4, None));

        for id in 1..=10 {
            assert_eq!(collector.accept(&event(id)).unwrap(), Signal::Continue);
        }

        // floor(10/4) files written, 10 mod 4 records still buffered
        assert_eq!(collector.filenames().len(), 2);
        assert_eq!(collector.buffered(), 2);

        collector.flush().unwrap();
        assert_eq!(collector.filenames().len(), 3);
        assert_eq!(collector.buffered(), 0);
        assert_eq!(read_ids(&collector.filenames()[2]), vec![9, 10]);
    }

    #[test]
    fn cap_on_batch_boundary_does_not_double_flush() {
        let dir = TempDir::new().unwrap();
        let mut collector = BatchCollector::new(&config(dir.path(), 3, Some(3)));

        assert_eq!(collector.accept(&event(1)).unwrap(), Signal::Continue);
        assert_eq!(collector.accept(&event(2)).unwrap(), Signal::Continue);
        assert_eq!(collector.accept(&event(3)).unwrap(), Signal::Stop);

        assert_eq!(collector.filenames().len(), 1);
        assert_eq!(read_ids(&collector.filenames()[0]), vec![1, 2, 3]);
    }

    #[test]
    fn capped_record_counts_sum_exactly() {
        let dir = TempDir::new().unwrap();
        let mut collector = BatchCollector::new(&config(dir.path(), 2, Some(5)));

        for id in 1..=4 {
            collector.accept(&event(id)).unwrap();
        }
        assert_eq!(collector.accept(&event(5)).unwrap(), Signal::Stop);

        let written: usize = collector
            .filenames()
            .iter()
            .map(|f| read_ids(f).len())
            .sum();
        assert_eq!(written, 5);
        assert_eq!(collector.buffered(), 0);
    }

    #[test]
    fn no_events_no_files() {
        let dir = TempDir::new().unwrap();
        let mut collector = BatchCollector::new(&config(dir.path(), 3, None));
        assert!(collector.filenames().is_empty());
        assert_eq!(collector.buffered(), 0);
        assert_eq!(collector.flush().unwrap(), None);
        assert!(collector.filenames().is_empty());
    }

    #[test]
    fn flush_names_do_not_collide() {
        let dir = TempDir::new().unwrap();
        let mut collector = BatchCollector::new(&config(dir.path(), 1, None));

        collector.accept(&event(1)).unwrap();
        collector.accept(&event(2)).unwrap();
        collector.accept(&event(3)).unwrap();

        let files = collector.filenames();
        assert_eq!(files.len(), 3);
        let unique: std::collections::HashSet<_> = files.iter().collect();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn failed_flush_retains_batch_for_retry() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("not-created-yet");
        let mut collector = BatchCollector::new(&config(&missing, 2, None));

        collector.accept(&event(1)).unwrap();
        let err = collector.accept(&event(2)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);

        // Nothing lost, nothing recorded as written
        assert_eq!(collector.buffered(), 2);
        assert!(collector.filenames().is_empty());
        assert_eq!(collector.total(), 2);

        // Once the directory exists the same data flushes cleanly
        std::fs::create_dir_all(&missing).unwrap();
        let path = collector.flush().unwrap().unwrap();
        assert_eq!(read_ids(&path), vec![1, 2]);
        assert_eq!(collector.buffered(), 0);
    }
}
