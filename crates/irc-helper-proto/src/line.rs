//! Line-based codec for tokio.
//!
//! Decoding yields one `String` per LF-terminated line with the terminator
//! (and a preceding CR) stripped. Bytes after the last LF stay in the buffer
//! until a later read completes the line, so a line split across two socket
//! reads is never misparsed. Encoding writes a [`Command`] followed by CRLF.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::command::Command;
use crate::error::{self, ProtocolError};

/// Maximum inbound line length (8191 bytes as per modern IRC conventions).
pub const MAX_LINE_LEN: usize = 8191;

/// Line-based codec that handles CRLF-terminated messages.
#[derive(Debug)]
pub struct LineCodec {
    /// Index of next byte to check for newline
    next_index: usize,
    /// Maximum line length
    max_len: usize,
    /// Dropping the tail of an overlong line until its LF arrives
    discarding: bool,
}

impl LineCodec {
    /// Create a codec with the default limit of [`MAX_LINE_LEN`].
    pub fn new() -> Self {
        Self::with_max_len(MAX_LINE_LEN)
    }

    /// Create a codec with a custom max line length.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len,
            discarding: false,
        }
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> error::Result<Option<String>> {
        if self.discarding {
            match src.iter().position(|b| *b == b'\n') {
                Some(offset) => {
                    src.advance(offset + 1);
                    self.discarding = false;
                }
                None => {
                    src.clear();
                    return Ok(None);
                }
            }
        }

        // Look for newline starting from where we left off
        if let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') {
            let line = src.split_to(self.next_index + offset + 1);
            self.next_index = 0;

            if line.len() > self.max_len {
                return Err(ProtocolError::MessageTooLong {
                    actual: line.len(),
                    limit: self.max_len,
                });
            }

            let mut body = &line[..line.len() - 1];
            if let Some(stripped) = body.strip_suffix(b"\r") {
                body = stripped;
            }

            // Servers relay whatever bytes users send; decode lossily rather
            // than dropping the line.
            Ok(Some(String::from_utf8_lossy(body).into_owned()))
        } else if src.len() > self.max_len {
            // Drop what we have and skip the rest of the line when it arrives.
            let actual = src.len();
            src.clear();
            self.next_index = 0;
            self.discarding = true;
            Err(ProtocolError::MessageTooLong {
                actual,
                limit: self.max_len,
            })
        } else {
            // No complete line yet - remember where we stopped
            self.next_index = src.len();
            Ok(None)
        }
    }
}

impl<'a> Encoder<&'a Command> for LineCodec {
    type Error = ProtocolError;

    fn encode(&mut self, cmd: &'a Command, dst: &mut BytesMut) -> error::Result<()> {
        cmd.validate()?;
        let line = cmd.to_string();
        dst.reserve(line.len() + 2);
        dst.put_slice(line.as_bytes());
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

impl Encoder<Command> for LineCodec {
    type Error = ProtocolError;

    fn encode(&mut self, cmd: Command, dst: &mut BytesMut) -> error::Result<()> {
        <Self as Encoder<&Command>>::encode(self, &cmd, dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(codec: &mut LineCodec, buf: &mut BytesMut) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(line) = codec.decode(buf).unwrap() {
            lines.push(line);
        }
        lines
    }

    #[test]
    fn test_decode_complete_line() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from("PING :test\r\n");

        let result = codec.decode(&mut buf).unwrap();
        assert_eq!(result, Some("PING :test".to_string()));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_block_of_lines() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(":a NOTICE * :one\r\n:a NOTICE * :two\n");
        assert_eq!(
            drain(&mut codec, &mut buf),
            vec![":a NOTICE * :one".to_string(), ":a NOTICE * :two".to_string()]
        );
    }

    #[test]
    fn test_partial_line_is_buffered() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from("PING :first\r\nPRIVMSG #ro");

        assert_eq!(drain(&mut codec, &mut buf), vec!["PING :first".to_string()]);
        assert_eq!(&buf[..], b"PRIVMSG #ro");

        buf.extend_from_slice(b"om :hi\r\n");
        assert_eq!(
            drain(&mut codec, &mut buf),
            vec!["PRIVMSG #room :hi".to_string()]
        );
    }

    #[test]
    fn test_decode_too_long() {
        let mut codec = LineCodec::with_max_len(10);
        let mut buf = BytesMut::from("this is way too long\n");

        let result = codec.decode(&mut buf);
        assert!(matches!(
            result,
            Err(ProtocolError::MessageTooLong { .. })
        ));
    }

    #[test]
    fn test_overlong_line_is_skipped_across_reads() {
        let mut codec = LineCodec::with_max_len(10);
        let mut buf = BytesMut::from("PRIVMSG #room :aaaaaaaa");

        assert!(matches!(
            codec.decode(&mut buf),
            Err(ProtocolError::MessageTooLong { actual: 23, limit: 10 })
        ));
        assert!(buf.is_empty());

        buf.extend_from_slice(b"aaaaaaaaaaaaaaaa");
        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        buf.extend_from_slice(b"aaaa\r\nPING :x\r\n");
        assert_eq!(drain(&mut codec, &mut buf), vec!["PING :x".to_string()]);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_continues_after_complete_overlong_line() {
        let mut codec = LineCodec::with_max_len(10);
        let mut buf = BytesMut::from("this is way too long\nPING :x\n");
        assert!(codec.decode(&mut buf).is_err());
        assert_eq!(drain(&mut codec, &mut buf), vec!["PING :x".to_string()]);
    }

    #[test]
    fn test_decode_invalid_utf8_is_lossy() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b"PRIVMSG #room :caf\xe9\r\n"[..]);
        let line = codec.decode(&mut buf).unwrap().unwrap();
        assert!(line.starts_with("PRIVMSG #room :caf"));
    }

    #[test]
    fn test_encode_appends_crlf() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::new();

        codec
            .encode(Command::Pong("test".to_string()), &mut buf)
            .unwrap();
        assert_eq!(&buf[..], b"PONG :test\r\n");
    }

    #[test]
    fn test_encode_rejects_embedded_newline() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::new();
        let result = codec.encode(Command::Nick("a\nb".into()), &mut buf);
        assert!(matches!(result, Err(ProtocolError::LineBreak { .. })));
        assert!(buf.is_empty());
    }
}
