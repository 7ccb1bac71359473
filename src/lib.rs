#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::as_conversions)]
#![deny(clippy::panic)]
#![deny(clippy::unwrap_used)]
//! Print filter and command-stream decoder for the Minolta PagePro
//! 1200W/1250W/1300W/1350W/1400W family of host-based laser printers.
//!
//! The printer speaks a framed, checksummed command language over whatever
//! byte-duplex channel the host opens (parallel port, USB-to-parallel
//! adapter, or a captured file for offline decoding). This crate provides:
//!
//! - [`frame`]: the envelope codec shared by the encoder and the decoder.
//! - [`command`]: builders for the fixed command payloads the printer accepts.
//! - [`compress`]: the scanline compressor (RLE / table / literal opcodes).
//! - [`pbm`]: a minimal reader for the `P4` raw PBM format used as page input.
//! - [`page`]: the page pipeline tying the compressor to the command stream.
//! - [`device`]: the register query loop used for status/firmware/page-count.
//! - [`decode`]: the inverse of `frame` + `command`, used by the verifier.
//! - [`config`]: printer configuration and the CLI option lookup tables.

pub mod command;
pub mod compress;
pub mod config;
pub mod decode;
pub mod device;
pub mod frame;
pub mod page;
pub mod pbm;

pub use config::{ConfigError, Model, PaperFormat, PaperType, PrinterConfig, Resolution, Tray};
pub use device::{DeviceError, DeviceStatus};
pub use frame::{FrameDecodeError, FrameEncodeError, FrameReader, FrameWriter};

/// Margin skip table, in units of 8 pixels, indexed by the low byte of a
/// [`Resolution`] code.
///
/// `1200x600` (code `0x0101`) shares the 600 dpi entry because its low byte
/// is also `0x01` — this is intentional, not an oversight (see DESIGN.md).
pub(crate) const MARGIN_TABLE: [u32; 3] = [6, 13, 25];

/// Every page is split into this many bands regardless of height.
pub(crate) const BANDS_PER_PAGE: usize = 8;
