//! HTTP line streaming with stall detection.
//!
//! Streaming endpoints hold a chunked response open indefinitely. The body
//! is read through async reqwest with a per-read timeout, bridged to a sync
//! `BufRead` so the capture loop stays on a single thread of control.

use std::io::{self, BufReader, Read};
use std::pin::Pin;
use std::sync::LazyLock;
use std::task::Context;
use std::time::Duration;

use flate2::read::GzDecoder;
use futures_util::StreamExt;
use tokio::io::{AsyncRead, ReadBuf};

/// Streaming endpoints send a keep-alive newline every ~30s; no data for
/// this long means the connection is dead.
const READ_TIMEOUT: Duration = Duration::from_secs(90);

/// Connect timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Buffer size for the line reader (64KB)
const LINE_BUF_SIZE: usize = 64 * 1024;

/// Error types for stream operations
#[derive(Debug)]
pub enum StreamError {
    /// HTTP error with optional status code
    Http {
        status: Option<u16>,
        message: String,
    },
    /// I/O error
    Io(std::io::Error),
}

impl std::fmt::Display for StreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http {
                status: Some(s),
                message,
            } => write!(f, "HTTP {s}: {message}"),
            Self::Http {
                status: None,
                message,
            } => write!(f, "HTTP error: {message}"),
            Self::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for StreamError {}

impl StreamError {
    /// Create HTTP error from reqwest error
    pub fn from_reqwest(e: &reqwest::Error) -> Self {
        Self::Http {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }

    /// Short kind label for error reports
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Http { .. } => "http",
            Self::Io(_) => "io",
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { status, .. } => {
                // 401 = bad credentials, 403 = account not permitted:
                // reconnecting with the same token cannot help.
                // 420/429 (rate limit) and 5xx clear up on their own.
                !matches!(status, Some(401) | Some(403))
            }
            Self::Io(e) => {
                // Stalls and resets are worth a reconnect, a full disk is not
                e.kind() != std::io::ErrorKind::StorageFull
            }
        }
    }
}

impl From<std::io::Error> for StreamError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Shared async HTTP client with connection pooling.
static SHARED_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .expect("failed to build HTTP client")
});

/// Shared tokio runtime backing the async-to-sync bridge.
static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

/// Buffered line reader over a live HTTP response body
pub type LineStream = BufReader<Box<dyn Read + Send>>;

/// HTTP GET → (gunzip if the server compressed) → buffered line reader
///
/// `bearer` is attached as an `Authorization: Bearer` header when present.
pub fn open_line_stream(url: &str, bearer: Option<&str>) -> Result<LineStream, StreamError> {
    let (reader, gzipped) = SHARED_RUNTIME.handle().block_on(async {
        let mut request = SHARED_CLIENT.get(url);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| StreamError::from_reqwest(&e))?;

        let gzipped = response
            .headers()
            .get(reqwest::header::CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.eq_ignore_ascii_case("gzip"));

        // Convert response body stream to AsyncRead
        let stream = response.bytes_stream();
        let async_reader = tokio_util::io::StreamReader::new(
            stream.map(|result| result.map_err(io::Error::other)),
        );

        Ok::<_, StreamError>((TimeoutReader::new(Box::pin(async_reader)), gzipped))
    })?;

    let body: Box<dyn Read + Send> = if gzipped {
        Box::new(GzDecoder::new(reader))
    } else {
        Box::new(reader)
    };

    Ok(BufReader::with_capacity(LINE_BUF_SIZE, body))
}

/// Async-to-sync bridge with read timeout.
///
/// Each read blocks on the shared runtime; if no data arrives within
/// READ_TIMEOUT the read fails with TimedOut.
struct TimeoutReader {
    inner: Pin<Box<dyn AsyncRead + Send + Sync>>,
}

impl TimeoutReader {
    fn new(inner: Pin<Box<dyn AsyncRead + Send + Sync>>) -> Self {
        Self { inner }
    }
}

impl Read for TimeoutReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        SHARED_RUNTIME.handle().block_on(async {
            let read_future = async {
                let mut read_buf = ReadBuf::new(buf);
                std::future::poll_fn(|cx: &mut Context<'_>| {
                    Pin::as_mut(&mut self.inner).poll_read(cx, &mut read_buf)
                })
                .await?;
                Ok::<_, io::Error>(read_buf.filled().len())
            };

            match tokio::time::timeout(READ_TIMEOUT, read_future).await {
                Ok(result) => result,
                Err(_) => Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "stream stalled (90s with no data)",
                )),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http_err(status: u16) -> StreamError {
        StreamError::Http {
            status: Some(status),
            message: "test".to_string(),
        }
    }

    #[test]
    fn http_401_not_retryable() {
        assert!(!http_err(401).is_retryable());
    }

    #[test]
    fn http_403_not_retryable() {
        assert!(!http_err(403).is_retryable());
    }

    #[test]
    fn http_420_rate_limit_retryable() {
        assert!(http_err(420).is_retryable());
    }

    #[test]
    fn http_429_rate_limit_retryable() {
        assert!(http_err(429).is_retryable());
    }

    #[test]
    fn http_500_retryable() {
        assert!(http_err(500).is_retryable());
    }

    #[test]
    fn http_none_status_retryable() {
        // Network error without status code should be retryable
        let err = StreamError::Http {
            status: None,
            message: "connection refused".to_string(),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn io_timeout_retryable() {
        let err = StreamError::Io(io::Error::new(io::ErrorKind::TimedOut, "stall"));
        assert!(err.is_retryable());
    }

    #[test]
    fn io_storage_full_not_retryable() {
        let err = StreamError::Io(io::Error::new(io::ErrorKind::StorageFull, "disk full"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn io_connection_reset_retryable() {
        let err = StreamError::Io(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
        assert!(err.is_retryable());
    }

    #[test]
    fn kind_names() {
        assert_eq!(http_err(500).kind_name(), "http");
        assert_eq!(StreamError::Io(io::Error::other("x")).kind_name(), "io");
    }

    #[test]
    fn display_http_with_status() {
        let err = http_err(420);
        assert_eq!(format!("{err}"), "HTTP 420: test");
    }

    #[test]
    fn display_http_without_status() {
        let err = StreamError::Http {
            status: None,
            message: "timeout".to_string(),
        };
        assert_eq!(format!("{err}"), "HTTP error: timeout");
    }

    #[test]
    fn display_io_error() {
        let err = StreamError::Io(io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert!(format!("{err}").contains("IO error"));
    }
}
