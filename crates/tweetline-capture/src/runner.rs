//! Top-level capture run: drive a source into a collector, summarize

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use tweetline_core::{ProgressContext, cleanup_tmp_files, fmt_num, is_shutdown_requested};

use crate::collector::{BatchCollector, Signal};
use crate::config::CaptureConfig;
use crate::source::EventStream;

/// Capture session summary
#[derive(Debug)]
pub struct Summary {
    /// Batch files written, in write order
    pub files: Vec<PathBuf>,
    /// Events accepted before the stream stopped
    pub total_events: u64,
    pub elapsed: std::time::Duration,
}

/// Run one capture session against `source`.
///
/// A transport failure ends the run gracefully: it is logged and whatever
/// was captured up to that point is returned, tail batch included. A flush
/// I/O failure is not swallowed; it aborts the run.
pub fn run(
    config: &CaptureConfig,
    source: &mut dyn EventStream,
    progress: &ProgressContext,
) -> Result<Summary> {
    let start = Instant::now();

    std::fs::create_dir_all(&config.save_dir)
        .with_context(|| format!("failed to create save dir {}", config.save_dir.display()))?;
    cleanup_tmp_files(&config.save_dir).context("failed to clean stale tmp files")?;

    if config.max_tweets.is_none() {
        log::info!("no event cap configured; capturing until the stream ends");
    }

    let pb = progress.capture_bar(config.max_tweets);
    let mut collector = BatchCollector::new(config);
    let mut flush_error: Option<std::io::Error> = None;

    let stream_result = source.listen(&mut |event| {
        if is_shutdown_requested() {
            return Signal::Stop;
        }
        match collector.accept(event) {
            Ok(signal) => {
                pb.inc(1);
                signal
            }
            Err(e) => {
                flush_error = Some(e);
                Signal::Stop
            }
        }
    });

    pb.finish_and_clear();

    if let Some(e) = flush_error {
        return Err(e).context("failed to flush batch");
    }

    // Transport failure is not fatal: report it and keep what was captured.
    if let Err(e) = stream_result {
        if e.is_retryable() {
            log::error!(
                "stream ended early ({}): {e} (transient; rerun to keep capturing)",
                e.kind_name()
            );
        } else {
            log::error!("stream ended early ({}): {e}", e.kind_name());
        }
    }

    // The stream stopped delivering; persist whatever it left buffered.
    if collector.buffered() > 0 {
        log::info!(
            "flushing {} buffered records",
            fmt_num(collector.buffered() as u64)
        );
        collector.flush().context("failed to flush tail batch")?;
    }

    let summary = Summary {
        files: collector.filenames().to_vec(),
        total_events: collector.total(),
        elapsed: start.elapsed(),
    };

    log::info!(
        "captured {} events into {} files in {:.1}s",
        fmt_num(summary.total_events),
        summary.files.len(),
        summary.elapsed.as_secs_f64()
    );
    if summary.total_events > 0 && summary.elapsed.as_secs_f64() > 0.0 {
        log::info!(
            "rate: {:.0} events/sec",
            summary.total_events as f64 / summary.elapsed.as_secs_f64()
        );
    }

    Ok(summary)
}
