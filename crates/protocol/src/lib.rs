//! Wire protocol for filestat file uploads.
//!
//! One file per TCP connection. The client sends a request header followed
//! by the raw payload; the server replies with a single text frame.
//!
//! # Wire format
//!
//! All integers are little-endian, fixed width.
//!
//! ```text
//! REQUEST (client -> server):
//!   [4 bytes LE: file_name_len (i32)]
//!   [file_name_len bytes: file name, UTF-8]
//!   [8 bytes LE: file_size (i64)]
//!   [file_size bytes: raw file data]
//!
//! RESPONSE (server -> client):
//!   [4 bytes LE: message_len (i32)]
//!   [message_len bytes: message, UTF-8]
//! ```
//!
//! Header fields are validated at decode time, before any payload byte is
//! read. A response whose message starts with [`ERROR_MARKER`] is a
//! server-reported failure; everything else is a success reply.

pub mod wire;

pub use wire::{
    RequestHeader, read_request_header, read_response, write_request_header, write_response,
};

/// Maximum file name length in bytes.
pub const MAX_FILE_NAME_LEN: usize = 260;

/// Maximum payload size in bytes (100 MiB).
pub const MAX_FILE_SIZE: i64 = 100 * 1024 * 1024;

/// Maximum response message length in bytes.
pub const MAX_MESSAGE_LEN: usize = 64 * 1024;

/// Prefix marking a response message as a server-reported failure.
pub const ERROR_MARKER: &str = "ERROR:";

/// Errors produced while encoding or decoding wire frames.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid file name length: {0}")]
    BadNameLength(i32),

    #[error("invalid file name: {0}")]
    BadFileName(String),

    #[error("invalid file size: {0}")]
    BadFileSize(i64),

    #[error("malformed frame: {0}")]
    Malformed(String),
}

impl ProtocolError {
    /// `true` for header-field validation failures (bad name or size),
    /// as opposed to I/O or framing errors.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::BadNameLength(_) | Self::BadFileName(_) | Self::BadFileSize(_)
        )
    }
}
