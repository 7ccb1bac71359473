//! A minimal reader for the `P4` raw PBM ("portable bitmap") format used as
//! page input.
//!
//! Only the handful of things the filter actually needs are implemented:
//! the magic number, `#`-prefixed comment lines, and the whitespace-
//! separated `width height` pair that precedes the binary scanline data.
//! Pixel semantics (`0` = white, `1` = black, MSB-first) are the caller's
//! concern; this module only frames the header and hands back raw bytes.

use std::io::BufRead;

/// Errors that can occur while reading a PBM job stream.
#[derive(Debug)]
pub enum PbmError {
    /// A `std::io::Error` from the underlying reader.
    IoError(std::io::Error),
    /// The stream didn't start with the `P4` magic.
    BadMagic,
    /// The dimensions line wasn't two decimal integers.
    BadDimensions,
    /// A scanline (or the header) was shorter than expected.
    Truncated,
}

impl std::fmt::Display for PbmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PbmError::IoError(err) => write!(f, "{}", err),
            PbmError::BadMagic => write!(f, "input is not valid pbmraw (no valid signature)"),
            PbmError::BadDimensions => {
                write!(f, "input is not valid pbmraw (ill formatted bitmap dimensions)")
            }
            PbmError::Truncated => {
                write!(f, "input is not valid pbmraw (premature end of file)")
            }
        }
    }
}

impl From<std::io::Error> for PbmError {
    fn from(err: std::io::Error) -> PbmError {
        PbmError::IoError(err)
    }
}

impl std::error::Error for PbmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PbmError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

/// A page's pixel dimensions, as parsed from its `P4` header.
///
/// `width` is rounded up to the next multiple of 8, since scanlines are
/// byte-aligned; the printer treats the padding bits as white.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHeader {
    /// Page width in pixels, rounded up to a multiple of 8.
    pub width: u32,
    /// Page height in pixels.
    pub height: u32,
}

impl PageHeader {
    /// Scanline width in bytes (`width / 8`).
    pub fn scanline_bytes(self) -> u32 {
        self.width / 8
    }
}

/// Reads a concatenated stream of `P4` pages, one after another, the way a
/// multi-page job arrives on stdin.
pub struct PbmJobReader<R: BufRead> {
    reader: R,
}

impl<R: BufRead> PbmJobReader<R> {
    /// Wraps a buffered reader positioned at the start of a job (or at the
    /// start of the next page's header, mid-job).
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    fn read_line(&mut self) -> Result<Option<String>, PbmError> {
        let mut line = Vec::new();
        let n = self.reader.read_until(b'\n', &mut line)?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&line).into_owned()))
    }

    /// Reads the next page's header, or `None` if the job stream is
    /// cleanly exhausted (no bytes left before the magic line).
    pub fn next_page(&mut self) -> Result<Option<PageHeader>, PbmError> {
        let magic = match self.read_line()? {
            Some(line) => line,
            None => return Ok(None),
        };
        let magic = magic.trim_end();
        if !magic.starts_with("P4") {
            return Err(PbmError::BadMagic);
        }

        let dims = loop {
            let line = self.read_line()?.ok_or(PbmError::Truncated)?;
            let trimmed = line.trim_start();
            if trimmed.starts_with('#') {
                continue;
            }
            break line;
        };

        let mut parts = dims.split_whitespace();
        let width: u32 = parts
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or(PbmError::BadDimensions)?;
        let height: u32 = parts
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or(PbmError::BadDimensions)?;

        let width = if width & 0x7 != 0 { 8 + (width & !0x7) } else { width };

        Ok(Some(PageHeader { width, height }))
    }

    /// Reads exactly one scanline (`sclbytes` bytes) into `buf`.
    ///
    /// Fails with [`PbmError::Truncated`] on a short read, matching the
    /// filter's "fatal on short read" policy — a partial scanline means
    /// the input lied about its own dimensions.
    pub fn read_scanline(&mut self, buf: &mut [u8]) -> Result<(), PbmError> {
        self.reader
            .read_exact(buf)
            .map_err(|_| PbmError::Truncated)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::as_conversions)]
    #![allow(clippy::unwrap_used)]

    use super::*;
    use std::io::Cursor;

    #[test]
    fn parses_simple_header() {
        let data = b"P4\n4 2\n\x00\x00".to_vec();
        let mut reader = PbmJobReader::new(Cursor::new(data));
        let header = reader.next_page().unwrap().unwrap();
        assert_eq!(header.width, 8); // rounded up to a byte boundary
        assert_eq!(header.height, 2);
    }

    #[test]
    fn rejects_bad_magic() {
        let data = b"P5\n4 2\n".to_vec();
        let mut reader = PbmJobReader::new(Cursor::new(data));
        assert!(matches!(reader.next_page(), Err(PbmError::BadMagic)));
    }

    #[test]
    fn skips_comment_lines() {
        let data = b"P4\n# a comment\n# another\n8 1\n\x00".to_vec();
        let mut reader = PbmJobReader::new(Cursor::new(data));
        let header = reader.next_page().unwrap().unwrap();
        assert_eq!(header.width, 8);
        assert_eq!(header.height, 1);
    }

    #[test]
    fn clean_eof_between_pages_returns_none() {
        let data = Vec::new();
        let mut reader = PbmJobReader::new(Cursor::new(data));
        assert!(reader.next_page().unwrap().is_none());
    }

    #[test]
    fn truncated_scanline_is_an_error() {
        let data = b"P4\n8 2\n\x00".to_vec();
        let mut reader = PbmJobReader::new(Cursor::new(data));
        let header = reader.next_page().unwrap().unwrap();
        let mut buf = vec![0u8; header.scanline_bytes() as usize];
        reader.read_scanline(&mut buf).unwrap();
        assert!(matches!(reader.read_scanline(&mut buf), Err(PbmError::Truncated)));
    }

    #[test]
    fn width_not_multiple_of_eight_rounds_up() {
        let data = b"P4\n10 1\n\x00\x00".to_vec();
        let mut reader = PbmJobReader::new(Cursor::new(data));
        let header = reader.next_page().unwrap().unwrap();
        assert_eq!(header.width, 16);
    }
}
