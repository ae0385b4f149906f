//! Wire framing: length prefix codec and the receive state machine.
//!
//! Every datagram travels as one frame:
//!
//! ```text
//! ┌────────────────┬──────────────────────┐
//! │ Length         │ Payload              │
//! │ 2 bytes        │ `length` bytes       │
//! │ uint16 LE      │ raw datagram bytes   │
//! └────────────────┴──────────────────────┘
//! ```
//!
//! The prefix width is fixed and agreed out-of-band with the peer; it is not
//! negotiated here. The payload needs no decode step — the received bytes
//! are the datagram verbatim.

use std::io::IoSlice;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::datagram::Datagram;
use crate::error::{FramelinkError, Result};

/// Length prefix width in bytes (fixed, exactly 2).
pub const PREFIX_LEN: usize = 2;

/// Maximum payload length representable by the prefix.
pub const MAX_PAYLOAD_LEN: usize = u16::MAX as usize;

/// Encode a payload length as a little-endian prefix.
///
/// The payload itself is never copied by the codec; callers pass the prefix
/// and the payload as two spans of a gather write.
#[inline]
pub fn encode_prefix(len: u16) -> [u8; PREFIX_LEN] {
    len.to_le_bytes()
}

/// Decode a little-endian length prefix.
///
/// Byte-wise reinterpretation; no type punning.
#[inline]
pub fn decode_prefix(buf: &[u8; PREFIX_LEN]) -> u16 {
    u16::from_le_bytes(*buf)
}

/// Receive-side state machine: alternates between reading a length prefix
/// and reading a payload of exactly that length.
///
/// The payload buffer grows on demand and never shrinks for the lifetime of
/// the reader, so a burst of large frames does not cause reallocation churn
/// on the smaller frames that follow. Each completed frame is copied out
/// into a [`Datagram`] because the buffer is reused for the next frame.
pub struct FrameReader {
    /// Fixed buffer for the length prefix.
    prefix: [u8; PREFIX_LEN],
    /// Grow-only payload buffer.
    payload: Vec<u8>,
}

impl FrameReader {
    /// Create a reader with an empty payload buffer.
    pub fn new() -> Self {
        Self {
            prefix: [0u8; PREFIX_LEN],
            payload: Vec::new(),
        }
    }

    /// Read the next complete frame from `reader`.
    ///
    /// Completes only when both the prefix and the full payload have
    /// arrived. An EOF in the middle of either part maps to
    /// [`FramelinkError::BrokenPipe`]; the exact-length read contract means
    /// a short transfer is a broken channel, not a protocol error.
    pub async fn next<R>(&mut self, reader: &mut R) -> Result<Datagram>
    where
        R: AsyncRead + Unpin,
    {
        reader
            .read_exact(&mut self.prefix)
            .await
            .map_err(map_read_error)?;

        let len = decode_prefix(&self.prefix) as usize;
        if len > self.payload.len() {
            // Grow to exactly the new length; never shrink afterwards.
            self.payload.resize(len, 0);
        }

        reader
            .read_exact(&mut self.payload[..len])
            .await
            .map_err(map_read_error)?;

        Ok(Datagram::copy_from_slice(&self.payload[..len]))
    }

    /// Current payload buffer size, for observing the grow-only policy.
    #[cfg(test)]
    fn buffer_len(&self) -> usize {
        self.payload.len()
    }
}

impl Default for FrameReader {
    fn default() -> Self {
        Self::new()
    }
}

fn map_read_error(err: std::io::Error) -> FramelinkError {
    if err.kind() == std::io::ErrorKind::UnexpectedEof {
        FramelinkError::BrokenPipe
    } else {
        FramelinkError::Io(err)
    }
}

/// Write one frame as a single logical gather write: prefix and payload as
/// two `IoSlice`s, looping on partial writes, then flush.
///
/// The caller guarantees `datagram.len() <= MAX_PAYLOAD_LEN`.
pub(crate) async fn write_frame<W>(writer: &mut W, datagram: &Datagram) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let payload = datagram.as_slice();
    debug_assert!(payload.len() <= MAX_PAYLOAD_LEN);
    let prefix = encode_prefix(payload.len() as u16);
    let total = PREFIX_LEN + payload.len();

    let mut written = 0;
    while written < total {
        let n = if written < PREFIX_LEN {
            let slices = [IoSlice::new(&prefix[written..]), IoSlice::new(payload)];
            writer.write_vectored(&slices).await?
        } else {
            writer.write(&payload[written - PREFIX_LEN..]).await?
        };

        if n == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::WriteZero,
                "write returned 0",
            ));
        }
        written += n;
    }

    writer.flush().await
}
