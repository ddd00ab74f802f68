//! Length-prefixed text framing
//!
//! Each frame is a fixed-width ASCII decimal header holding the UTF-8 byte
//! length of the payload, followed by exactly that many payload bytes:
//! `[HEADER_WIDTH digits][payload]`. Reads accumulate partial transport
//! reads until the declared count is satisfied, never more and never less.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::FramingError;

/// Width of the decimal length header in bytes
pub const HEADER_WIDTH: usize = 4;

/// Largest payload the header can describe (9999 for a 4-digit header)
pub const MAX_PAYLOAD: usize = 10usize.pow(HEADER_WIDTH as u32) - 1;

/// Encode text into a complete frame
pub fn encode(text: &str) -> Result<Vec<u8>, FramingError> {
    let len = text.len();
    if len > MAX_PAYLOAD {
        return Err(FramingError::TooLong(len));
    }

    let mut frame = Vec::with_capacity(HEADER_WIDTH + len);
    frame.extend_from_slice(format!("{:0width$}", len, width = HEADER_WIDTH).as_bytes());
    frame.extend_from_slice(text.as_bytes());
    Ok(frame)
}

/// Parse a header into a payload length
///
/// Surrounding ASCII spaces are tolerated so space-padded headers decode
/// the same as zero-padded ones.
fn parse_header(header: &[u8]) -> Result<usize, FramingError> {
    let invalid = || FramingError::InvalidHeader(String::from_utf8_lossy(header).into_owned());

    let digits = std::str::from_utf8(header)
        .map_err(|_| invalid())?
        .trim_matches(' ');
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let len: usize = digits.parse().map_err(|_| invalid())?;
    if len > MAX_PAYLOAD {
        return Err(FramingError::TooLong(len));
    }
    Ok(len)
}

/// Read one frame from the stream
///
/// Returns `Ok(None)` when the peer closes cleanly on a frame boundary.
/// A close anywhere inside a frame is `FramingError::Truncated`.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<String>, FramingError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; HEADER_WIDTH];
    let mut filled = 0;
    while filled < HEADER_WIDTH {
        let n = reader.read(&mut header[filled..]).await?;
        if n == 0 {
            return if filled == 0 {
                Ok(None)
            } else {
                Err(FramingError::Truncated)
            };
        }
        filled += n;
    }

    let len = parse_header(&header)?;
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;

    Ok(Some(String::from_utf8(payload)?))
}

/// Write one frame to the stream and flush it
pub async fn write_frame<W>(writer: &mut W, text: &str) -> Result<(), FramingError>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode(text)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Cursor;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use tokio::io::ReadBuf;

    /// Reader that hands out at most one byte per poll
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
    }

    impl AsyncRead for Trickle {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            if self.pos < self.data.len() && buf.remaining() > 0 {
                let byte = self.data[self.pos];
                buf.put_slice(&[byte]);
                self.pos += 1;
            }
            Poll::Ready(Ok(()))
        }
    }

    #[test]
    fn test_encode_header() {
        assert_eq!(encode("hi").unwrap(), b"0002hi".to_vec());
        assert_eq!(encode("").unwrap(), b"0000".to_vec());
        // Header counts bytes, not chars
        assert_eq!(&encode("é").unwrap()[..HEADER_WIDTH], b"0002");
    }

    #[test]
    fn test_encode_too_long() {
        let text = "x".repeat(MAX_PAYLOAD + 1);
        assert!(matches!(encode(&text), Err(FramingError::TooLong(10000))));
        assert!(encode(&"x".repeat(MAX_PAYLOAD)).is_ok());
    }

    #[tokio::test]
    async fn test_decode_consecutive_frames_exactly() {
        let mut bytes = encode("short").unwrap();
        bytes.extend(encode("a much longer second frame").unwrap());
        bytes.extend(encode("").unwrap());
        let mut reader = Cursor::new(bytes);

        assert_eq!(read_frame(&mut reader).await.unwrap().as_deref(), Some("short"));
        assert_eq!(
            read_frame(&mut reader).await.unwrap().as_deref(),
            Some("a much longer second frame")
        );
        assert_eq!(read_frame(&mut reader).await.unwrap().as_deref(), Some(""));
        assert!(read_frame(&mut reader).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_decode_one_byte_at_a_time() {
        let long = "ünïcode ".repeat(500);
        let mut bytes = encode(&long).unwrap();
        bytes.extend(encode("tail").unwrap());

        let mut whole = Cursor::new(bytes.clone());
        let mut trickle = Trickle { data: bytes, pos: 0 };

        for _ in 0..2 {
            let a = read_frame(&mut whole).await.unwrap();
            let b = read_frame(&mut trickle).await.unwrap();
            assert_eq!(a, b);
        }
        assert!(read_frame(&mut trickle).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_max_payload_round_trip() {
        // 3333 three-byte chars land exactly on the limit
        let multibyte = "€".repeat(MAX_PAYLOAD / 3);
        assert_eq!(multibyte.len(), MAX_PAYLOAD);
        let ascii = "x".repeat(MAX_PAYLOAD);

        for text in [ascii, multibyte] {
            let bytes = encode(&text).unwrap();
            assert_eq!(&bytes[..HEADER_WIDTH], b"9999");

            let mut whole = Cursor::new(bytes.clone());
            let mut trickle = Trickle { data: bytes, pos: 0 };
            assert_eq!(read_frame(&mut whole).await.unwrap(), Some(text.clone()));
            assert_eq!(read_frame(&mut trickle).await.unwrap(), Some(text));
            assert!(read_frame(&mut trickle).await.unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn test_decode_space_padded_header() {
        let mut reader = Cursor::new(b"  3 abc".to_vec());
        assert_eq!(read_frame(&mut reader).await.unwrap().as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_decode_invalid_header() {
        let mut reader = Cursor::new(b"12abhello".to_vec());
        assert!(matches!(
            read_frame(&mut reader).await,
            Err(FramingError::InvalidHeader(_))
        ));

        let mut reader = Cursor::new(b"-001x".to_vec());
        assert!(matches!(
            read_frame(&mut reader).await,
            Err(FramingError::InvalidHeader(_))
        ));
    }

    #[tokio::test]
    async fn test_decode_truncated() {
        let mut reader = Cursor::new(b"00".to_vec());
        assert!(matches!(
            read_frame(&mut reader).await,
            Err(FramingError::Truncated)
        ));

        let mut reader = Cursor::new(b"0010short".to_vec());
        assert!(matches!(
            read_frame(&mut reader).await,
            Err(FramingError::Truncated)
        ));
    }

    #[tokio::test]
    async fn test_decode_invalid_utf8() {
        let mut reader = Cursor::new(b"0002\xff\xfe".to_vec());
        assert!(matches!(
            read_frame(&mut reader).await,
            Err(FramingError::InvalidUtf8(_))
        ));
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let (mut client, mut server) = tokio::io::duplex(64);
        write_frame(&mut client, "[DM] alice: hello").await.unwrap();
        drop(client);

        assert_eq!(
            read_frame(&mut server).await.unwrap().as_deref(),
            Some("[DM] alice: hello")
        );
        assert!(read_frame(&mut server).await.unwrap().is_none());
    }
}
