//! Per-connection upload handling.
//!
//! One handler drives one connection: receive header, stream payload to
//! disk, verify the byte count, analyze, log, reply. Any failure
//! short-circuits to an error reply on the same frame format; the
//! connection is closed on every exit path.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use filestat_analyzer::AnalysisReport;
use filestat_protocol::{ERROR_MARKER, read_request_header, write_response};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::result_log::ResultLog;
use crate::store::FileStore;
use crate::{IO_BUFFER_SIZE, ServerError};

/// Handles one client connection from receipt to reply.
///
/// Errors are reported to the peer and logged here; they never propagate
/// to the accept loop.
pub(crate) async fn handle(
    stream: TcpStream,
    peer_addr: SocketAddr,
    store: Arc<FileStore>,
    result_log: Arc<ResultLog>,
) {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::with_capacity(IO_BUFFER_SIZE, reader);

    let reply = match receive_and_analyze(&mut reader, &store, &result_log).await {
        Ok(report) => {
            info!(
                %peer_addr,
                file = %report.file_name,
                lines = report.line_count,
                words = report.word_count,
                chars = report.char_count,
                "upload complete"
            );
            report.summary()
        }
        Err(e) => {
            warn!(%peer_addr, "upload failed: {e}");
            format!("{ERROR_MARKER} {e}")
        }
    };

    if let Err(e) = write_response(&mut writer, &reply).await {
        warn!(%peer_addr, "failed to send response: {e}");
    }
    // Best-effort close; the stream is dropped regardless.
    let _ = writer.shutdown().await;
}

/// Runs the receive → store → verify → analyze → log sequence.
async fn receive_and_analyze<R>(
    reader: &mut R,
    store: &FileStore,
    result_log: &ResultLog,
) -> Result<AnalysisReport, ServerError>
where
    R: AsyncRead + Unpin,
{
    let header = read_request_header(reader).await?;
    debug!(file = %header.file_name, size = header.file_size, "request header received");

    let dest = store.allocate(&header.file_name);
    if let Err(e) = receive_payload(reader, &dest, header.file_size).await {
        // A partial artifact must not survive as an apparently complete
        // upload.
        let _ = tokio::fs::remove_file(&dest).await;
        return Err(e);
    }

    let bytes = tokio::fs::read(&dest).await?;
    let content = String::from_utf8_lossy(&bytes);
    let report = AnalysisReport::from_content(&header.file_name, &content);

    result_log.append(&report).await?;
    Ok(report)
}

/// Streams exactly `expected` payload bytes to `dest` through a fixed
/// buffer, keeping a running byte counter.
async fn receive_payload<R>(reader: &mut R, dest: &Path, expected: i64) -> Result<(), ServerError>
where
    R: AsyncRead + Unpin,
{
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut file = tokio::fs::File::create(dest).await?;

    let mut buf = vec![0u8; IO_BUFFER_SIZE];
    let mut received: i64 = 0;

    while received < expected {
        let to_read = ((expected - received) as usize).min(buf.len());
        let n = reader.read(&mut buf[..to_read]).await?;
        if n == 0 {
            // Peer closed before delivering the declared size.
            break;
        }
        file.write_all(&buf[..n]).await?;
        received += n as i64;
    }
    file.flush().await?;

    if received != expected {
        return Err(ServerError::IncompleteTransfer { expected, received });
    }
    Ok(())
}
