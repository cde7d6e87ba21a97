//! Upload client.
//!
//! Sends one local file to a filestat server and returns the parsed
//! statistics. Connection-level failures are retried a bounded number of
//! times; everything else propagates immediately.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use filestat_analyzer::{AnalysisReport, ParseReportError};
use filestat_protocol::{
    ERROR_MARKER, ProtocolError, RequestHeader, read_response, write_request_header,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

/// Timeout for a single TCP connection attempt.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Streaming buffer size (8 KiB).
pub const IO_BUFFER_SIZE: usize = 8 * 1024;

/// Bounded retry policy for connection-level failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total connection attempts (not additional retries).
    pub attempts: u32,
    /// Fixed delay between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

/// Errors produced by the upload client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("file is empty: {0}")]
    EmptyFile(PathBuf),

    #[error("path has no file name: {0}")]
    NoFileName(PathBuf),

    #[error("connection failed after {attempts} attempts: {source}")]
    Connection {
        attempts: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("server error: {0}")]
    ServerReported(String),

    #[error("malformed statistics in server reply: {0}")]
    BadReply(#[from] ParseReportError),
}

/// Sends `path` to the server at `addr` with the default retry policy.
pub async fn send_file(addr: SocketAddr, path: &Path) -> Result<AnalysisReport, ClientError> {
    send_file_with(addr, path, &RetryPolicy::default()).await
}

/// Sends `path` to the server at `addr`.
///
/// The local file is validated before any connection attempt. Only
/// connection-level failures are retried; a server-reported error or a
/// protocol error propagates after a single attempt.
pub async fn send_file_with(
    addr: SocketAddr,
    path: &Path,
    retry: &RetryPolicy,
) -> Result<AnalysisReport, ClientError> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|_| ClientError::FileNotFound(path.to_path_buf()))?;
    if metadata.len() == 0 {
        return Err(ClientError::EmptyFile(path.to_path_buf()));
    }
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| ClientError::NoFileName(path.to_path_buf()))?;

    let stream = connect_with_retry(addr, retry).await?;
    let (mut reader, writer) = stream.into_split();
    let mut writer = BufWriter::with_capacity(IO_BUFFER_SIZE, writer);

    let header = RequestHeader {
        file_name,
        file_size: metadata.len() as i64,
    };
    write_request_header(&mut writer, &header).await?;

    // Stream the payload.
    let mut file = tokio::fs::File::open(path).await?;
    let mut buf = vec![0u8; IO_BUFFER_SIZE];
    let mut remaining = header.file_size;
    while remaining > 0 {
        let to_read = (remaining as usize).min(buf.len());
        let n = file.read(&mut buf[..to_read]).await?;
        if n == 0 {
            return Err(ClientError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "local file truncated during send",
            )));
        }
        writer.write_all(&buf[..n]).await?;
        remaining -= n as i64;
    }
    writer.flush().await?;
    debug!(file = %header.file_name, size = header.file_size, "payload sent");

    let message = read_response(&mut reader).await?;
    if let Some(rest) = message.strip_prefix(ERROR_MARKER) {
        return Err(ClientError::ServerReported(rest.trim().to_string()));
    }

    let report = AnalysisReport::parse(&message)?;
    info!(
        file = %report.file_name,
        lines = report.line_count,
        words = report.word_count,
        chars = report.char_count,
        "upload acknowledged"
    );
    Ok(report)
}

/// Connects to `addr`, retrying connection-level failures per `retry`.
async fn connect_with_retry(
    addr: SocketAddr,
    retry: &RetryPolicy,
) -> Result<TcpStream, ClientError> {
    let mut last_err = None;

    for attempt in 1..=retry.attempts {
        if attempt > 1 {
            tokio::time::sleep(retry.delay).await;
        }

        match tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => {
                debug!(%addr, attempt, "connected");
                return Ok(stream);
            }
            Ok(Err(e)) => {
                warn!(%addr, attempt, "connection attempt failed: {e}");
                last_err = Some(e);
            }
            Err(_) => {
                warn!(%addr, attempt, "connection attempt timed out");
                last_err = Some(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "connect timed out",
                ));
            }
        }
    }

    Err(ClientError::Connection {
        attempts: retry.attempts,
        source: last_err
            .unwrap_or_else(|| std::io::Error::other("no connection attempts configured")),
    })
}
