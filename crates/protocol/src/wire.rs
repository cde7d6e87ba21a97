//! Frame encoding and decoding over async streams.

use std::path::{Component, Path};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{MAX_FILE_NAME_LEN, MAX_FILE_SIZE, MAX_MESSAGE_LEN, ProtocolError};

/// The fixed-width header that precedes a file payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHeader {
    /// Logical file name (UTF-8, validated).
    pub file_name: String,
    /// Declared payload size in bytes.
    pub file_size: i64,
}

/// Writes a request header to the stream.
///
/// The payload itself is streamed separately by the caller, immediately
/// after the header.
pub async fn write_request_header<W: AsyncWrite + Unpin>(
    writer: &mut W,
    header: &RequestHeader,
) -> Result<(), ProtocolError> {
    let name_bytes = header.file_name.as_bytes();
    if name_bytes.is_empty() || name_bytes.len() > MAX_FILE_NAME_LEN {
        return Err(ProtocolError::BadNameLength(name_bytes.len() as i32));
    }
    validate_file_name(&header.file_name)?;
    if header.file_size <= 0 || header.file_size > MAX_FILE_SIZE {
        return Err(ProtocolError::BadFileSize(header.file_size));
    }

    writer.write_i32_le(name_bytes.len() as i32).await?;
    writer.write_all(name_bytes).await?;
    writer.write_i64_le(header.file_size).await?;
    Ok(())
}

/// Reads and validates a request header from the stream.
///
/// Each field is checked as it is decoded; a violation fails before any
/// payload byte is read. After this returns, exactly
/// [`RequestHeader::file_size`] payload bytes follow on the stream.
pub async fn read_request_header<R: AsyncRead + Unpin>(
    reader: &mut R,
) -> Result<RequestHeader, ProtocolError> {
    let name_len = reader.read_i32_le().await?;
    if name_len <= 0 || name_len as usize > MAX_FILE_NAME_LEN {
        return Err(ProtocolError::BadNameLength(name_len));
    }

    let mut name_buf = vec![0u8; name_len as usize];
    reader.read_exact(&mut name_buf).await?;
    let file_name = String::from_utf8(name_buf)
        .map_err(|e| ProtocolError::Malformed(format!("invalid UTF-8 file name: {e}")))?;
    validate_file_name(&file_name)?;

    let file_size = reader.read_i64_le().await?;
    if file_size <= 0 || file_size > MAX_FILE_SIZE {
        return Err(ProtocolError::BadFileSize(file_size));
    }

    Ok(RequestHeader {
        file_name,
        file_size,
    })
}

/// Writes a response frame and flushes the stream.
pub async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    message: &str,
) -> Result<(), ProtocolError> {
    let bytes = message.as_bytes();
    if bytes.is_empty() || bytes.len() > MAX_MESSAGE_LEN {
        return Err(ProtocolError::Malformed(format!(
            "response message length out of range: {}",
            bytes.len()
        )));
    }

    writer.write_i32_le(bytes.len() as i32).await?;
    writer.write_all(bytes).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads a response frame from the stream.
pub async fn read_response<R: AsyncRead + Unpin>(reader: &mut R) -> Result<String, ProtocolError> {
    let message_len = reader.read_i32_le().await?;
    if message_len <= 0 || message_len as usize > MAX_MESSAGE_LEN {
        return Err(ProtocolError::Malformed(format!(
            "response message length out of range: {message_len}"
        )));
    }

    let mut buf = vec![0u8; message_len as usize];
    reader.read_exact(&mut buf).await?;
    String::from_utf8(buf)
        .map_err(|e| ProtocolError::Malformed(format!("invalid UTF-8 message: {e}")))
}

/// Validates a logical file name.
///
/// Rejects empty names, parent directory traversal (`..`), absolute paths,
/// and Windows prefix components (`C:`, `\\server`).
fn validate_file_name(file_name: &str) -> Result<(), ProtocolError> {
    if file_name.is_empty() {
        return Err(ProtocolError::BadFileName("empty file name".into()));
    }

    let path = Path::new(file_name);

    if path.is_absolute() {
        return Err(ProtocolError::BadFileName(format!(
            "absolute path not allowed: {file_name}"
        )));
    }

    for component in path.components() {
        match component {
            Component::ParentDir => {
                return Err(ProtocolError::BadFileName(format!(
                    "parent directory traversal not allowed: {file_name}"
                )));
            }
            Component::Prefix(_) => {
                return Err(ProtocolError::BadFileName(format!(
                    "path prefix not allowed: {file_name}"
                )));
            }
            Component::RootDir => {
                return Err(ProtocolError::BadFileName(format!(
                    "absolute path not allowed: {file_name}"
                )));
            }
            Component::CurDir | Component::Normal(_) => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn request_header_roundtrip() {
        let header = RequestHeader {
            file_name: "report.txt".into(),
            file_size: 1_048_576,
        };

        let mut buf = Vec::new();
        write_request_header(&mut buf, &header).await.unwrap();

        let mut cursor = &buf[..];
        let parsed = read_request_header(&mut cursor).await.unwrap();
        assert_eq!(parsed, header);
        // Nothing consumed past the header.
        assert!(cursor.is_empty());
    }

    #[tokio::test]
    async fn response_roundtrip() {
        let mut buf = Vec::new();
        write_response(&mut buf, "File: a.txt\nLines: 1\nWords: 2\nChars: 11")
            .await
            .unwrap();

        let mut cursor = &buf[..];
        let message = read_response(&mut cursor).await.unwrap();
        assert!(message.starts_with("File: a.txt"));
    }

    #[tokio::test]
    async fn name_length_boundary_accepted() {
        let header = RequestHeader {
            file_name: "x".repeat(MAX_FILE_NAME_LEN),
            file_size: 1,
        };

        let mut buf = Vec::new();
        write_request_header(&mut buf, &header).await.unwrap();

        let mut cursor = &buf[..];
        let parsed = read_request_header(&mut cursor).await.unwrap();
        assert_eq!(parsed.file_name.len(), MAX_FILE_NAME_LEN);
    }

    #[tokio::test]
    async fn name_length_boundary_rejected() {
        // Hand-encode a header with a 261-byte name; write-side validation
        // would refuse to produce one.
        let name = "x".repeat(MAX_FILE_NAME_LEN + 1);
        let mut buf = Vec::new();
        buf.extend_from_slice(&(name.len() as i32).to_le_bytes());
        buf.extend_from_slice(name.as_bytes());
        buf.extend_from_slice(&1i64.to_le_bytes());

        let mut cursor = &buf[..];
        let err = read_request_header(&mut cursor).await.unwrap_err();
        assert!(matches!(err, ProtocolError::BadNameLength(261)));
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn zero_name_length_rejected() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&0i32.to_le_bytes());

        let mut cursor = &buf[..];
        let err = read_request_header(&mut cursor).await.unwrap_err();
        assert!(matches!(err, ProtocolError::BadNameLength(0)));
    }

    #[tokio::test]
    async fn file_size_boundary_accepted() {
        let header = RequestHeader {
            file_name: "big.bin".into(),
            file_size: MAX_FILE_SIZE,
        };

        let mut buf = Vec::new();
        write_request_header(&mut buf, &header).await.unwrap();

        let mut cursor = &buf[..];
        let parsed = read_request_header(&mut cursor).await.unwrap();
        assert_eq!(parsed.file_size, MAX_FILE_SIZE);
    }

    #[tokio::test]
    async fn file_size_boundary_rejected() {
        let name = b"big.bin";
        let mut buf = Vec::new();
        buf.extend_from_slice(&(name.len() as i32).to_le_bytes());
        buf.extend_from_slice(name);
        buf.extend_from_slice(&(MAX_FILE_SIZE + 1).to_le_bytes());

        let mut cursor = &buf[..];
        let err = read_request_header(&mut cursor).await.unwrap_err();
        assert!(matches!(err, ProtocolError::BadFileSize(s) if s == MAX_FILE_SIZE + 1));
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn zero_file_size_rejected() {
        let name = b"empty.txt";
        let mut buf = Vec::new();
        buf.extend_from_slice(&(name.len() as i32).to_le_bytes());
        buf.extend_from_slice(name);
        buf.extend_from_slice(&0i64.to_le_bytes());

        let mut cursor = &buf[..];
        let err = read_request_header(&mut cursor).await.unwrap_err();
        assert!(matches!(err, ProtocolError::BadFileSize(0)));
    }

    #[tokio::test]
    async fn parent_traversal_rejected() {
        for name in ["../secret", "a/../../etc", ".."] {
            let mut buf = Vec::new();
            buf.extend_from_slice(&(name.len() as i32).to_le_bytes());
            buf.extend_from_slice(name.as_bytes());
            buf.extend_from_slice(&1i64.to_le_bytes());

            let mut cursor = &buf[..];
            let err = read_request_header(&mut cursor).await.unwrap_err();
            assert!(matches!(err, ProtocolError::BadFileName(_)), "{name}");
        }
    }

    #[tokio::test]
    async fn absolute_path_rejected() {
        let name = "/etc/passwd";
        let mut buf = Vec::new();
        buf.extend_from_slice(&(name.len() as i32).to_le_bytes());
        buf.extend_from_slice(name.as_bytes());
        buf.extend_from_slice(&1i64.to_le_bytes());

        let mut cursor = &buf[..];
        let err = read_request_header(&mut cursor).await.unwrap_err();
        assert!(matches!(err, ProtocolError::BadFileName(_)));
    }

    #[tokio::test]
    async fn normal_names_accepted() {
        for name in ["notes.txt", "data/level1.bin", "./config.toml"] {
            let header = RequestHeader {
                file_name: name.into(),
                file_size: 10,
            };
            let mut buf = Vec::new();
            write_request_header(&mut buf, &header).await.unwrap();

            let mut cursor = &buf[..];
            assert!(read_request_header(&mut cursor).await.is_ok(), "{name}");
        }
    }

    #[tokio::test]
    async fn invalid_utf8_name_is_malformed() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&4i32.to_le_bytes());
        buf.extend_from_slice(&[0xff, 0xfe, 0xfd, 0xfc]);
        buf.extend_from_slice(&1i64.to_le_bytes());

        let mut cursor = &buf[..];
        let err = read_request_header(&mut cursor).await.unwrap_err();
        assert!(matches!(err, ProtocolError::Malformed(_)));
        assert!(!err.is_validation());
    }

    #[tokio::test]
    async fn truncated_header_is_io_error() {
        // Name length says 10 bytes but only 3 follow.
        let mut buf = Vec::new();
        buf.extend_from_slice(&10i32.to_le_bytes());
        buf.extend_from_slice(b"abc");

        let mut cursor = &buf[..];
        let err = read_request_header(&mut cursor).await.unwrap_err();
        assert!(matches!(err, ProtocolError::Io(_)));
    }

    #[tokio::test]
    async fn negative_response_length_rejected() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(-1i32).to_le_bytes());

        let mut cursor = &buf[..];
        let err = read_response(&mut cursor).await.unwrap_err();
        assert!(matches!(err, ProtocolError::Malformed(_)));
    }

    #[tokio::test]
    async fn error_marker_prefix_detection() {
        let mut buf = Vec::new();
        write_response(&mut buf, &format!("{} file too large", crate::ERROR_MARKER))
            .await
            .unwrap();

        let mut cursor = &buf[..];
        let message = read_response(&mut cursor).await.unwrap();
        assert!(message.starts_with(crate::ERROR_MARKER));
    }
}
