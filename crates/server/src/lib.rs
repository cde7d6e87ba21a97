//! TCP upload server for filestat.
//!
//! Accepts one file per connection, stores it under a collision-free name,
//! computes text statistics, appends them to a shared result log, and
//! replies with the summary. Connections are handled concurrently; the
//! result log is the only shared mutable state.

mod handler;
mod result_log;
mod server;
mod store;

pub use result_log::ResultLog;
pub use server::{FileServer, ServerConfig};
pub use store::FileStore;

/// Payload streaming buffer size (8 KiB).
pub const IO_BUFFER_SIZE: usize = 8 * 1024;

/// Errors produced while handling an upload.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Protocol(#[from] filestat_protocol::ProtocolError),

    #[error("incomplete transfer: declared {expected} bytes, received {received}")]
    IncompleteTransfer { expected: i64, received: i64 },
}
