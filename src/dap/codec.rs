//! Content-Length framing for the front-end transport
//!
//! Each message on the wire is an HTTP-style header block terminated by a
//! blank line, followed by exactly `Content-Length` bytes of JSON body.

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::common::{Error, Result};

/// Upper bound on a single message body
const MAX_BODY_BYTES: usize = 100 * 1024 * 1024;

/// Read one framed message and return its JSON body
pub async fn read_message<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<String> {
    let len = read_headers(reader).await?;
    if len > MAX_BODY_BYTES {
        return Err(Error::Protocol(format!(
            "refusing {} byte message body",
            len
        )));
    }

    let mut body = vec![0u8; len];
    reader
        .read_exact(&mut body)
        .await
        .map_err(eof_is_disconnect)?;

    String::from_utf8(body).map_err(|e| Error::Protocol(format!("body is not UTF-8: {}", e)))
}

/// Consume one header block and extract the Content-Length value
///
/// Headers other than Content-Length are tolerated and skipped.
async fn read_headers<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<usize> {
    let mut content_length = None;
    let mut line = String::new();

    loop {
        line.clear();
        let n = reader.read_line(&mut line).await.map_err(eof_is_disconnect)?;
        if n == 0 {
            return Err(Error::Disconnected);
        }

        let header = line.trim();
        if header.is_empty() {
            break;
        }

        if let Some(value) = header.strip_prefix("Content-Length:") {
            let value = value.trim();
            content_length = Some(value.parse().map_err(|_| {
                Error::Protocol(format!("bad Content-Length value: {}", value))
            })?);
        }
    }

    content_length
        .ok_or_else(|| Error::Protocol("header block has no Content-Length".to_string()))
}

/// A closed stream mid-message is a peer disconnect, not an I/O fault
fn eof_is_disconnect(e: io::Error) -> Error {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        Error::Disconnected
    } else {
        Error::Io(e)
    }
}

/// Frame and write one JSON message
pub async fn write_message<W: AsyncWrite + Unpin>(writer: &mut W, json: &str) -> Result<()> {
    writer
        .write_all(format!("Content-Length: {}\r\n\r\n", json.len()).as_bytes())
        .await?;
    writer.write_all(json.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tokio::io::BufReader;

    async fn decode(raw: &[u8]) -> Result<String> {
        let mut reader = BufReader::new(Cursor::new(raw.to_vec()));
        read_message(&mut reader).await
    }

    #[tokio::test]
    async fn test_frame_round_trip() {
        let mut framed = Vec::new();
        write_message(&mut framed, r#"{"seq":1}"#).await.unwrap();
        assert_eq!(framed, b"Content-Length: 9\r\n\r\n{\"seq\":1}");
        assert_eq!(decode(&framed).await.unwrap(), r#"{"seq":1}"#);
    }

    #[tokio::test]
    async fn test_unknown_headers_are_skipped() {
        let raw = b"Content-Type: application/json\r\nContent-Length: 2\r\n\r\n{}";
        assert_eq!(decode(raw).await.unwrap(), "{}");
    }

    #[tokio::test]
    async fn test_missing_content_length_is_protocol_error() {
        let raw = b"Content-Type: application/json\r\n\r\n{}";
        assert!(matches!(decode(raw).await, Err(Error::Protocol(_))));
    }

    #[tokio::test]
    async fn test_truncated_body_is_disconnect() {
        let raw = b"Content-Length: 99\r\n\r\n{}";
        assert!(matches!(decode(raw).await, Err(Error::Disconnected)));
    }

    #[tokio::test]
    async fn test_consecutive_messages() {
        let mut framed = Vec::new();
        write_message(&mut framed, "{}").await.unwrap();
        write_message(&mut framed, r#"{"seq":2}"#).await.unwrap();

        let mut reader = BufReader::new(Cursor::new(framed));
        assert_eq!(read_message(&mut reader).await.unwrap(), "{}");
        assert_eq!(read_message(&mut reader).await.unwrap(), r#"{"seq":2}"#);
    }
}
