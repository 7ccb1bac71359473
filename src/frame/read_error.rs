//! Frame decoding errors.

/// Errors that can occur when decoding a captured command stream.
#[derive(Debug)]
pub enum FrameDecodeError {
    /// A `std::io::Error`.
    IoError(std::io::Error),
    /// The envelope's fixed bytes (escape, zero separator, or negated
    /// command) didn't hold where expected.
    Framing {
        /// Byte offset into the stream where the violation was found.
        offset: u64,
        /// Human-readable description of what was expected.
        reason: &'static str,
    },
    /// The trailing checksum byte didn't match the computed sum.
    Checksum {
        /// Byte offset of the checksum byte.
        offset: u64,
        /// Checksum computed from the frame bytes actually read.
        expected: u8,
        /// Checksum byte found in the stream.
        found: u8,
    },
    /// The frame's sequence byte broke the monotonic-increment invariant
    /// without being a valid job-boundary reset (`cmd == 0x51 && seq == 0`).
    Sequence {
        /// Byte offset of the sequence byte.
        offset: u64,
        /// Sequence value the reader expected next.
        expected: u8,
        /// Sequence value found in the stream.
        found: u8,
    },
}

impl std::fmt::Display for FrameDecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameDecodeError::IoError(err) => write!(f, "{}", err),
            FrameDecodeError::Framing { offset, reason } => {
                write!(f, "framing error at offset {}: {}", offset, reason)
            }
            FrameDecodeError::Checksum {
                offset,
                expected,
                found,
            } => {
                write!(
                    f,
                    "checksum mismatch at offset {}: expected {:#04x}, found {:#04x}",
                    offset, expected, found
                )
            }
            FrameDecodeError::Sequence {
                offset,
                expected,
                found,
            } => {
                write!(
                    f,
                    "sequence error at offset {}: expected {}, found {}",
                    offset, expected, found
                )
            }
        }
    }
}

impl From<std::io::Error> for FrameDecodeError {
    fn from(err: std::io::Error) -> FrameDecodeError {
        FrameDecodeError::IoError(err)
    }
}

impl std::error::Error for FrameDecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            FrameDecodeError::IoError(ref e) => Some(e),
            _ => None,
        }
    }
}
