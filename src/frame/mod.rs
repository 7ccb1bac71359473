//! The envelope codec shared by the encoder and the decoder.
//!
//! Every command the printer understands rides inside a seven-byte header,
//! a payload, and a one-byte checksum trailer: `[0x1B, cmd, seq, len_lo,
//! len_hi, !cmd, ...payload, checksum]`. The encoder always writes the full
//! 16-bit little-endian length; captured streams read back by the verifier
//! use a narrower dialect where the length is one byte followed by a
//! mandatory zero, which [`FrameReader`] implements.

mod read_error;
mod reader;
mod write_error;
mod writer;

pub use read_error::FrameDecodeError;
pub use reader::{Frame, FrameReader};
pub use write_error::FrameEncodeError;
pub use writer::FrameWriter;
