//! Fixed-size frame codec.
//!
//! Every message occupies exactly one frame: the ASCII payload followed by
//! NUL padding up to the frame length. The payload must leave room for at
//! least one terminating NUL.

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Size of a client request frame.
pub const REQUEST_FRAME_LEN: usize = 300;

/// Size of a server response frame.
pub const RESPONSE_FRAME_LEN: usize = 320;

/// Errors raised while framing.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("payload is not ASCII")]
    NonAscii,

    #[error("payload of {len} bytes does not fit a {frame_len}-byte frame")]
    TooLong { len: usize, frame_len: usize },

    #[error("connection closed after {received} of {expected} frame bytes")]
    Truncated { received: usize, expected: usize },
}

/// Pad `payload` into a frame of `frame_len` bytes.
pub fn encode(payload: &str, frame_len: usize) -> Result<Vec<u8>, FrameError> {
    if !payload.is_ascii() {
        return Err(FrameError::NonAscii);
    }
    if payload.len() >= frame_len {
        return Err(FrameError::TooLong {
            len: payload.len(),
            frame_len,
        });
    }
    let mut frame = vec![0u8; frame_len];
    frame[..payload.len()].copy_from_slice(payload.as_bytes());
    Ok(frame)
}

/// Extract the payload: bytes before the first NUL, whitespace-trimmed.
pub fn decode(frame: &[u8]) -> Result<String, FrameError> {
    let end = frame.iter().position(|&b| b == 0).unwrap_or(frame.len());
    let payload = &frame[..end];
    if !payload.is_ascii() {
        return Err(FrameError::NonAscii);
    }
    let text = String::from_utf8_lossy(payload);
    Ok(text.trim().to_string())
}

/// Write one frame and flush.
pub async fn write_frame<W>(writer: &mut W, payload: &str, frame_len: usize) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode(payload, frame_len)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads whole frames from a byte stream.
///
/// Partially received frames are kept across calls, so `read_frame` can be
/// raced in `tokio::select!` without losing bytes.
#[derive(Debug)]
pub struct FrameReader<R> {
    inner: R,
    buf: Vec<u8>,
    filled: usize,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(inner: R, frame_len: usize) -> Self {
        Self {
            inner,
            buf: vec![0u8; frame_len],
            filled: 0,
        }
    }

    /// Next frame's payload, or `None` on a clean close between frames.
    ///
    /// A frame that fails to decode is consumed, so the next call starts on
    /// the following frame.
    pub async fn read_frame(&mut self) -> Result<Option<String>, FrameError> {
        while self.filled < self.buf.len() {
            let n = self.inner.read(&mut self.buf[self.filled..]).await?;
            if n == 0 {
                if self.filled == 0 {
                    return Ok(None);
                }
                return Err(FrameError::Truncated {
                    received: self.filled,
                    expected: self.buf.len(),
                });
            }
            self.filled += n;
        }
        self.filled = 0;
        decode(&self.buf).map(Some)
    }
}
