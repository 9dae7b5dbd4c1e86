//! Length-prefixed wire codec.
//!
//! A frame is `<len>:<token>:<len>:<token>: ... :<len>:<token>` where each
//! `<len>` is the ASCII decimal byte count of the token that follows and `:`
//! is the delimiter. The first token is the command name; the rest are
//! positional parameters. Length-prefixing lets token bytes travel verbatim
//! and lets the receiver size each buffer exactly. A frame ends when the
//! sender shuts down its write half, so decoding consumes the stream until
//! no further length prefix appears.

use crate::error::{ProtocolError, Result};
use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Maximum size of a single frame (256 MB).
pub const MAX_FRAME_SIZE: usize = 256 * 1024 * 1024;

const DELIMITER: u8 = b':';

/// One complete protocol message: a command name plus its ordered
/// parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Command (or reply status) name.
    pub command: String,
    /// Positional parameters, verbatim bytes.
    pub params: Vec<Bytes>,
}

impl Frame {
    /// Create a frame from a command name and its parameters.
    pub fn new(command: impl Into<String>, params: Vec<Bytes>) -> Self {
        Self {
            command: command.into(),
            params,
        }
    }

    /// Encode to wire bytes. Zero-length tokens are unrepresentable in the
    /// grammar and rejected here.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let tokens =
            std::iter::once(self.command.as_bytes()).chain(self.params.iter().map(|p| p.as_ref()));
        for (i, token) in tokens.enumerate() {
            if token.is_empty() {
                return Err(ProtocolError::ZeroLength.into());
            }
            if i > 0 {
                out.push(DELIMITER);
            }
            out.extend_from_slice(token.len().to_string().as_bytes());
            out.push(DELIMITER);
            out.extend_from_slice(token);
        }
        if out.len() > MAX_FRAME_SIZE {
            return Err(ProtocolError::Oversize {
                limit: MAX_FRAME_SIZE,
            }
            .into());
        }
        Ok(out)
    }

    /// Decode a complete frame from received bytes.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut tokens: Vec<Bytes> = Vec::new();
        let mut pos = 0usize;
        while pos < buf.len() {
            if !tokens.is_empty() {
                if buf[pos] != DELIMITER {
                    return Err(ProtocolError::MissingDelimiter.into());
                }
                pos += 1;
            }
            let digits_start = pos;
            while pos < buf.len() && buf[pos] != DELIMITER {
                pos += 1;
            }
            if pos == buf.len() {
                return Err(ProtocolError::MissingDelimiter.into());
            }
            let len = parse_length(&buf[digits_start..pos])?;
            pos += 1;
            let available = buf.len() - pos;
            if available < len {
                return Err(ProtocolError::Truncated {
                    expected: len,
                    got: available,
                }
                .into());
            }
            tokens.push(Bytes::copy_from_slice(&buf[pos..pos + len]));
            pos += len;
        }
        let mut tokens = tokens.into_iter();
        let command = match tokens.next() {
            Some(first) => String::from_utf8(first.to_vec())
                .map_err(|_| ProtocolError::BadCommand)?,
            None => return Err(ProtocolError::EmptyFrame.into()),
        };
        Ok(Self {
            command,
            params: tokens.collect(),
        })
    }
}

fn parse_length(digits: &[u8]) -> Result<usize> {
    let text = String::from_utf8_lossy(digits);
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return Err(ProtocolError::BadLength(text.into_owned()).into());
    }
    // No leading zeros beyond a single `0`, and a lone `0` is itself illegal.
    if digits[0] == b'0' {
        if digits.len() > 1 {
            return Err(ProtocolError::BadLength(text.into_owned()).into());
        }
        return Err(ProtocolError::ZeroLength.into());
    }
    text.parse::<usize>()
        .map_err(|_| ProtocolError::BadLength(text.into_owned()).into())
}

/// Read one frame: consume the stream to EOF (the sender's write-side
/// shutdown is the frame terminator), then decode.
pub async fn read_frame<R>(reader: &mut R, limit: usize) -> Result<Frame>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    let mut limited = reader.take(limit as u64 + 1);
    limited.read_to_end(&mut buf).await?;
    if buf.len() > limit {
        return Err(ProtocolError::Oversize { limit }.into());
    }
    Frame::decode(&buf)
}

/// Encode and write one frame.
pub async fn write_frame<W>(writer: &mut W, frame: &Frame) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let encoded = frame.encode()?;
    writer.write_all(&encoded).await?;
    writer.flush().await?;
    Ok(())
}
