//! Event stream sources.
//!
//! The transport behind the keyword subscription is a collaborator, not
//! part of the collector: anything that can push events through a callback
//! and honor the returned [`Signal`] implements [`EventStream`].

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use flate2::read::GzDecoder;
use tweetline_core::stream::{StreamError, open_line_stream};

use crate::collector::Signal;
use crate::event::RawEvent;

/// Initial capacity for the per-line read buffer
const LINE_BUF_CAPACITY: usize = 4096;

/// Push-based subscription to an event feed.
///
/// Implementations deliver events one at a time on a single thread and stop
/// when the callback returns [`Signal::Stop`] or the transport ends
/// delivery on its own. Events are only valid for the duration of the call.
pub trait EventStream {
    fn listen(
        &mut self,
        on_event: &mut dyn FnMut(&RawEvent) -> Signal,
    ) -> Result<(), StreamError>;
}

/// Live chunked-HTTP NDJSON subscription with a keyword filter.
///
/// Auth is the caller's problem: a ready-made bearer token is attached
/// verbatim when provided.
pub struct HttpSource {
    endpoint: String,
    bearer_token: Option<String>,
    words: Vec<String>,
}

impl HttpSource {
    pub fn new(endpoint: &str, bearer_token: Option<&str>, words: &[String]) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            bearer_token: bearer_token.map(str::to_string),
            words: words.to_vec(),
        }
    }

    /// Subscription URL with the keyword filter in the `track` parameter
    fn track_url(&self) -> Result<String, StreamError> {
        if self.words.is_empty() {
            return Ok(self.endpoint.clone());
        }
        let url =
            reqwest::Url::parse_with_params(&self.endpoint, [("track", self.words.join(","))])
                .map_err(|e| StreamError::Http {
                    status: None,
                    message: format!("bad endpoint: {e}"),
                })?;
        Ok(url.to_string())
    }
}

impl EventStream for HttpSource {
    fn listen(
        &mut self,
        on_event: &mut dyn FnMut(&RawEvent) -> Signal,
    ) -> Result<(), StreamError> {
        let url = self.track_url()?;
        log::info!("subscribing to {} ({} keywords)", self.endpoint, self.words.len());
        let mut lines = open_line_stream(&url, self.bearer_token.as_deref())?;
        deliver_lines(&mut lines, on_event)
    }
}

/// NDJSON replay from a local capture file. `.gz` is decompressed
/// transparently.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl EventStream for FileSource {
    fn listen(
        &mut self,
        on_event: &mut dyn FnMut(&RawEvent) -> Signal,
    ) -> Result<(), StreamError> {
        let file = File::open(&self.path)?;
        let mut reader: Box<dyn BufRead> =
            if self.path.extension().is_some_and(|ext| ext == "gz") {
                Box::new(BufReader::new(GzDecoder::new(file)))
            } else {
                Box::new(BufReader::new(file))
            };
        deliver_lines(&mut reader, on_event)
    }
}

/// Shared delivery loop: one line, at most one event, honor the signal.
fn deliver_lines<R: BufRead>(
    reader: &mut R,
    on_event: &mut dyn FnMut(&RawEvent) -> Signal,
) -> Result<(), StreamError> {
    let mut line = String::with_capacity(LINE_BUF_CAPACITY);
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Ok(());
        }
        let Some(event) = RawEvent::from_line(&line) else {
            continue;
        };
        if on_event(&event).should_stop() {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_ndjson(dir: &TempDir, name: &str, lines: &[&str]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, lines.join("\n")).unwrap();
        path
    }

    fn collect_ids(source: &mut dyn EventStream) -> Vec<i64> {
        let mut ids = Vec::new();
        source
            .listen(&mut |event| {
                ids.push(event.id);
                Signal::Continue
            })
            .unwrap();
        ids
    }

    #[test]
    fn file_source_delivers_in_order() {
        let dir = TempDir::new().unwrap();
        let path = write_ndjson(
            &dir,
            "events.json",
            &[
                r#"{"id":1,"user":{"screen_name":"a"}}"#,
                r#"{"id":2,"user":{"screen_name":"b"}}"#,
                r#"{"id":3,"user":{"screen_name":"c"}}"#,
            ],
        );
        let mut source = FileSource::new(path);
        assert_eq!(collect_ids(&mut source), vec![1, 2, 3]);
    }

    #[test]
    fn control_lines_are_not_delivered() {
        let dir = TempDir::new().unwrap();
        let path = write_ndjson(
            &dir,
            "events.json",
            &[
                "",
                r#"{"id":1,"user":{"screen_name":"a"}}"#,
                r#"{"limit":{"track":10}}"#,
                r#"{"delete":{"status":{"id":9}}}"#,
                r#"{"id":2,"user":{"screen_name":"b"}}"#,
                "",
            ],
        );
        let mut source = FileSource::new(path);
        assert_eq!(collect_ids(&mut source), vec![1, 2]);
    }

    #[test]
    fn stop_signal_ends_delivery() {
        let dir = TempDir::new().unwrap();
        let path = write_ndjson(
            &dir,
            "events.json",
            &[
                r#"{"id":1,"user":{"screen_name":"a"}}"#,
                r#"{"id":2,"user":{"screen_name":"b"}}"#,
                r#"{"id":3,"user":{"screen_name":"c"}}"#,
            ],
        );
        let mut seen = 0;
        FileSource::new(path)
            .listen(&mut |_| {
                seen += 1;
                if seen == 2 { Signal::Stop } else { Signal::Continue }
            })
            .unwrap();
        assert_eq!(seen, 2);
    }

    #[test]
    fn gzipped_replay_is_transparent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("events.json.gz");
        let file = File::create(&path).unwrap();
        let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        writeln!(encoder, r#"{{"id":7,"user":{{"screen_name":"a"}}}}"#).unwrap();
        writeln!(encoder, r#"{{"id":8,"user":{{"screen_name":"b"}}}}"#).unwrap();
        encoder.finish().unwrap();

        let mut source = FileSource::new(path);
        assert_eq!(collect_ids(&mut source), vec![7, 8]);
    }

    #[test]
    fn missing_file_is_an_io_stream_error() {
        let dir = TempDir::new().unwrap();
        let mut source = FileSource::new(dir.path().join("nope.json"));
        let err = source.listen(&mut |_| Signal::Continue).unwrap_err();
        assert_eq!(err.kind_name(), "io");
    }

    #[test]
    fn track_url_joins_and_escapes_words() {
        let source = HttpSource::new(
            "https://stream.example.com/filter.json",
            None,
            &["rust lang".to_string(), "parquet".to_string()],
        );
        let url = source.track_url().unwrap();
        assert!(url.starts_with("https://stream.example.com/filter.json?track="));
        assert!(url.contains("parquet"));
        // space must not survive unescaped
        assert!(!url.contains(' '));
    }

    #[test]
    fn track_url_without_words_is_bare_endpoint() {
        let source = HttpSource::new("https://stream.example.com/filter.json", None, &[]);
        assert_eq!(
            source.track_url().unwrap(),
            "https://stream.example.com/filter.json"
        );
    }
}
