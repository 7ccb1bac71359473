use std::io::Write;

use crate::frame::FrameEncodeError;

const ESC: u8 = 0x1B;

/// Encodes commands into the printer's framed, checksummed envelope.
///
/// Holds the only piece of state the wire format needs from the caller: a
/// per-writer sequence counter that increments with every frame written.
#[derive(Debug)]
pub struct FrameWriter<W: Write> {
    writer: W,
    seq: u8,
}

impl<W: Write> FrameWriter<W> {
    /// Creates a new `FrameWriter` with the sequence counter at zero.
    pub fn new(writer: W) -> Self {
        Self { writer, seq: 0 }
    }

    /// Creates a `FrameWriter` that resumes from a given sequence number.
    ///
    /// Used when a session needs to interleave writes with reads on the
    /// same duplex handle (see [`crate::device`]): each write is done
    /// through a short-lived `FrameWriter` borrowing the handle, and the
    /// sequence counter is threaded through by hand between them.
    pub fn with_seq(writer: W, seq: u8) -> Self {
        Self { writer, seq }
    }

    /// Consumes the `FrameWriter` and returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// The sequence number that will be used by the next frame.
    pub fn next_seq(&self) -> u8 {
        self.seq
    }

    /// Writes one command frame: header, payload, and checksum.
    ///
    /// The sequence counter is incremented (and wraps at 256) regardless of
    /// whether the write succeeds midway; a caller seeing an error should
    /// treat the stream as unusable rather than retry the same frame.
    pub fn write_frame(&mut self, cmd: u8, payload: &[u8]) -> Result<(), FrameEncodeError> {
        let len = payload.len();
        let len_u16 = u16::try_from(len).map_err(|_| FrameEncodeError::PayloadTooLarge(len))?;
        let [len_lo, len_hi] = len_u16.to_le_bytes();
        let not_cmd = !cmd;
        let seq = self.seq;
        self.seq = self.seq.wrapping_add(1);

        let mut checksum: u8 = cmd
            .wrapping_add(seq)
            .wrapping_add(len_lo)
            .wrapping_add(len_hi)
            .wrapping_add(not_cmd);
        for &b in payload {
            checksum = checksum.wrapping_add(b);
        }

        self.writer
            .write_all(&[ESC, cmd, seq, len_lo, len_hi, not_cmd])?;
        self.writer.write_all(payload)?;
        self.writer.write_all(&[checksum])?;
        Ok(())
    }

    /// Writes raw bytes that travel outside any envelope, such as the
    /// compressed raster continuation that follows a `0x52` frame's header.
    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<(), FrameEncodeError> {
        self.writer.write_all(bytes)?;
        Ok(())
    }

    /// Flushes the underlying writer.
    pub fn flush(&mut self) -> Result<(), FrameEncodeError> {
        self.writer.flush()?;
        Ok(())
    }
}
