//! Frame encoding errors.

/// Errors that can occur when encoding a command frame.
#[derive(Debug)]
pub enum FrameEncodeError {
    /// A `std::io::Error`.
    IoError(std::io::Error),
    /// Payload longer than the 16-bit length field can express.
    PayloadTooLarge(usize),
}

impl std::fmt::Display for FrameEncodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameEncodeError::IoError(err) => write!(f, "{}", err),
            FrameEncodeError::PayloadTooLarge(len) => {
                write!(f, "payload of {} bytes exceeds the 65535 byte frame limit", len)
            }
        }
    }
}

impl From<std::io::Error> for FrameEncodeError {
    fn from(err: std::io::Error) -> FrameEncodeError {
        FrameEncodeError::IoError(err)
    }
}

impl std::error::Error for FrameEncodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            FrameEncodeError::IoError(ref e) => Some(e),
            FrameEncodeError::PayloadTooLarge(_) => None,
        }
    }
}
