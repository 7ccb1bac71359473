//! A verifier/dumper for captured command streams: walks a frame stream
//! and renders a human-readable interpretation of each command, tracking
//! a little running state (resolution, page size, tray) the way the
//! original dumper's `dump50`/`dump51`/`dump52` did.
//!
//! This is read-only: it never writes frames, only interprets them.

use std::io::Read;

use crate::frame::{Frame, FrameDecodeError, FrameReader};

/// The 300/600/1200 dpi resolution families the `0x50` command selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionFamily {
    /// 300 dpi.
    Dpi300,
    /// 600 dpi.
    Dpi600,
    /// 1200 dpi.
    Dpi1200,
    /// A resolution code this decoder doesn't recognize.
    Unknown(u8),
}

impl ResolutionFamily {
    fn from_code(code: u8) -> ResolutionFamily {
        match code {
            0 => ResolutionFamily::Dpi300,
            1 => ResolutionFamily::Dpi600,
            2 => ResolutionFamily::Dpi1200,
            other => ResolutionFamily::Unknown(other),
        }
    }

    fn base_dpi(self) -> Option<f64> {
        match self {
            ResolutionFamily::Dpi300 => Some(300.0),
            ResolutionFamily::Dpi600 => Some(600.0),
            ResolutionFamily::Dpi1200 => Some(1200.0),
            ResolutionFamily::Unknown(_) => None,
        }
    }
}

impl std::fmt::Display for ResolutionFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionFamily::Dpi300 => write!(f, "300 dpi"),
            ResolutionFamily::Dpi600 => write!(f, "600 dpi"),
            ResolutionFamily::Dpi1200 => write!(f, "1200 dpi"),
            ResolutionFamily::Unknown(code) => write!(f, "unknown ({:#04x})", code),
        }
    }
}

fn paper_type_name(code: u8) -> &'static str {
    match code {
        0 => "normal paper",
        1 => "thick paper",
        2 => "transparency",
        3 => "envelope/postcard",
        _ => "unknown paper",
    }
}

fn tray_name(code: u8) -> &'static str {
    match code {
        0xff => "auto",
        0x00 => "tray 1",
        0x01 => "tray 2",
        0x80 => "manual feed",
        _ => "unknown",
    }
}

fn paper_format_name(code: u8) -> &'static str {
    match code {
        0x04 => "a4",
        0x06 => "b5",
        0x08 => "a5",
        0x0c => "j-post",
        0x0d => "cor. post",
        0x10 => "jis y6",
        0x11 => "jis y0",
        0x13 => "chinese 16k",
        0x15 => "chinese 32k",
        0x19 => "legal",
        0x1a => "g. legal",
        0x1b => "letter",
        0x1d => "g. letter",
        0x1f => "executive",
        0x21 => "half letter",
        0x24 => "env monarch",
        0x25 => "env #10",
        0x26 => "env dl",
        0x27 => "env c5",
        0x28 => "env c6",
        0x29 => "env b5",
        0x2d => "choukei-3gou",
        0x2e => "choukei-4gou",
        0x31 => "custom",
        _ => "unknown",
    }
}

/// The running session state a `0x51` frame updates and a `0x52` frame's
/// physical-size printout depends on.
#[derive(Debug, Clone, Copy, Default)]
struct Session {
    resolution: Option<ResolutionFamily>,
    /// Horizontal resolution, which may be doubled by the `0x50` modifier.
    horizontal_dpi: Option<f64>,
}

/// One decoded, human-readable interpretation of a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    /// The command byte, for callers that want to branch on it directly.
    pub cmd: u8,
    /// Rendered description lines, already formatted for display.
    pub lines: Vec<String>,
}

fn hex_dump(data: &[u8]) -> Vec<String> {
    let mut lines = Vec::new();
    for chunk in data.chunks(16) {
        let hex: Vec<String> = chunk.iter().map(|b| format!("{:02x}", b)).collect();
        lines.push(hex.join(" "));
    }
    lines
}

fn dump_unknown(frame: &Frame) -> Decoded {
    let mut lines = vec![format!("ESC {:02x}: raw data dump:", frame.cmd)];
    lines.extend(hex_dump(&frame.payload));
    Decoded {
        cmd: frame.cmd,
        lines,
    }
}

fn dump_select_resolution(frame: &Frame, session: &mut Session) -> Decoded {
    let mut lines = vec!["ESC 50: select resolution and paper type:".to_string()];
    if frame.payload.len() != 8 {
        lines.push(format!(
            "Expected 8 data bytes for ESC 0x50 command, received {}.",
            frame.payload.len()
        ));
        lines.extend(hex_dump(&frame.payload));
        return Decoded {
            cmd: frame.cmd,
            lines,
        };
    }

    let res = ResolutionFamily::from_code(frame.payload[0]);
    let modifier = frame.payload[1];
    let (modifier_desc, horizontal_dpi) = match modifier {
        0 => ("none", res.base_dpi()),
        1 => (
            "double horizontal resolution",
            res.base_dpi().map(|d| d * 2.0),
        ),
        _ => ("unknown horizontal resolution modifier", None),
    };
    let paper = frame.payload[3];

    session.resolution = Some(res);
    session.horizontal_dpi = horizontal_dpi;

    lines.push(format!("resolution code {:#04x} ({})", frame.payload[0], res));
    lines.push(format!(
        "horizontal resolution modifier: {:#04x} ({})",
        modifier, modifier_desc
    ));
    match (horizontal_dpi, res.base_dpi()) {
        (Some(h), Some(v)) => lines.push(format!("effective resolution is {} x {} dpi", h, v)),
        _ => lines.push("effective resolution is unknown".to_string()),
    }
    lines.push(format!(
        "paper code {:#04x} ({})",
        paper,
        paper_type_name(paper)
    ));

    Decoded {
        cmd: frame.cmd,
        lines,
    }
}

/// Mirrors the verifier's `getdword`: a mixed-endian 32-bit read used for
/// the page dimension fields of a `0x51` frame.
fn get_dword(data: &[u8; 4]) -> u32 {
    u32::from(data[1]) << 24 | u32::from(data[0]) << 16 | u32::from(data[3]) << 8 | u32::from(data[2])
}

fn dump_new_page(frame: &Frame, session: &Session) -> Decoded {
    let mut lines = vec!["ESC 51: start new page and set paper format:".to_string()];
    if frame.payload.len() != 22 {
        lines.push(format!(
            "Expected 22 data bytes for ESC 0x51 command, received {}.",
            frame.payload.len()
        ));
        lines.extend(hex_dump(&frame.payload));
        return Decoded {
            cmd: frame.cmd,
            lines,
        };
    }

    let x = get_dword(&[
        frame.payload[2],
        frame.payload[3],
        frame.payload[4],
        frame.payload[5],
    ]);
    let y = get_dword(&[
        frame.payload[6],
        frame.payload[7],
        frame.payload[8],
        frame.payload[9],
    ]);
    let tray = frame.payload[14];
    let format = frame.payload[15];

    lines.push(format!(
        "paper format is {:#04x} ({}).",
        format,
        paper_format_name(format)
    ));

    match (session.horizontal_dpi, session.resolution.and_then(ResolutionFamily::base_dpi)) {
        (Some(hdpi), Some(vdpi)) if hdpi > 0.0 && vdpi > 0.0 => {
            lines.push(format!(
                "page size is {} x {} dots ({:.3} x {:.3} \" or {:.2} x {:.2} mm).",
                x,
                y,
                f64::from(x) / hdpi,
                f64::from(y) / vdpi,
                25.4 * f64::from(x) / hdpi,
                25.4 * f64::from(y) / vdpi,
            ));
        }
        _ => {
            lines.push(format!(
                "page size is {} x {} dots (physical size unknown: no prior resolution selection).",
                x, y
            ));
        }
    }
    lines.push(format!(
        "paper tray id {:#04x} ({})",
        tray,
        tray_name(tray)
    ));

    Decoded {
        cmd: frame.cmd,
        lines,
    }
}

/// Decodes a `0x52` raster-data header and reads past its continuation
/// bytes (which travel outside the frame's checksum envelope), returning
/// the description and leaving the reader positioned after them.
fn dump_raster_data<R: Read>(
    frame: &Frame,
    reader: &mut FrameReader<R>,
) -> Result<Decoded, FrameDecodeError> {
    let mut lines = vec!["ESC 52: send raster data:".to_string()];
    if frame.payload.len() != 6 {
        lines.push(format!(
            "Expected 6 data bytes for ESC 0x52 command, received {}.",
            frame.payload.len()
        ));
        lines.extend(hex_dump(&frame.payload));
        return Ok(Decoded {
            cmd: frame.cmd,
            lines,
        });
    }

    let byte_count = u32::from_le_bytes([
        frame.payload[0],
        frame.payload[1],
        frame.payload[2],
        frame.payload[3],
    ]);
    let line_count = u16::from_le_bytes([frame.payload[4], frame.payload[5]]);

    let raw = reader.read_raw(usize::try_from(byte_count).unwrap_or(usize::MAX))?;
    lines.push(format!(
        "dumping {} raster data bytes ({} lines):",
        byte_count, line_count
    ));
    lines.extend(hex_dump(&raw));

    Ok(Decoded {
        cmd: frame.cmd,
        lines,
    })
}

/// Walks an entire captured command stream, decoding each frame in turn.
///
/// Returns as soon as a frame fails to decode (bad checksum, framing, or
/// sequence error) so the caller can report exactly where the stream went
/// wrong, along with the frames successfully decoded up to that point.
pub fn decode_stream<R: Read>(
    reader: R,
) -> (Vec<Decoded>, Option<FrameDecodeError>) {
    let mut fr = FrameReader::new(reader);
    let mut session = Session::default();
    let mut decoded = Vec::new();

    loop {
        let frame = match fr.read_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => return (decoded, None),
            Err(err) => return (decoded, Some(err)),
        };

        let sequence_restart = frame.sequence_restart;
        let result = match frame.cmd {
            0x50 => Ok(dump_select_resolution(&frame, &mut session)),
            0x51 => Ok(dump_new_page(&frame, &session)),
            0x52 => dump_raster_data(&frame, &mut fr),
            _ => Ok(dump_unknown(&frame)),
        };

        match result {
            Ok(mut d) => {
                if let Some(offset) = sequence_restart {
                    d.lines.insert(0, format!("Sequence restarts at {:08x}.", offset));
                }
                decoded.push(d);
            }
            Err(err) => return (decoded, Some(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic)]
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::frame::FrameWriter;
    use std::io::Cursor;

    #[test]
    fn decodes_resolution_and_paper_type() {
        let mut fw = FrameWriter::new(Cursor::new(Vec::new()));
        // resolution=600dpi(1), no h-modifier, don't-care, paper=normal
        fw.write_frame(0x50, &[1, 0, 0, 0, 0, 0, 0, 0]).unwrap();
        let bytes = fw.into_inner().into_inner();

        let (decoded, err) = decode_stream(Cursor::new(bytes));
        assert!(err.is_none());
        assert_eq!(decoded.len(), 1);
        assert!(decoded[0].lines.iter().any(|l| l.contains("600 dpi")));
        assert!(decoded[0].lines.iter().any(|l| l.contains("normal paper")));
    }

    #[test]
    fn decodes_new_page_with_prior_resolution() {
        let mut fw = FrameWriter::new(Cursor::new(Vec::new()));
        fw.write_frame(0x50, &[1, 0, 0, 0, 0, 0, 0, 0]).unwrap();
        let (cmd, payload) = crate::command::new_page(
            4800,
            7200,
            crate::config::Tray::Auto,
            crate::config::PaperFormat::DEFAULT,
            0x01,
        );
        fw.write_frame(cmd, &payload).unwrap();
        let bytes = fw.into_inner().into_inner();

        let (decoded, err) = decode_stream(Cursor::new(bytes));
        assert!(err.is_none());
        assert_eq!(decoded.len(), 2);
        let page = &decoded[1];
        assert!(page.lines.iter().any(|l| l.contains("4800 x 7200 dots")));
        assert!(page.lines.iter().any(|l| l.contains("a4")));
        assert!(page.lines.iter().any(|l| l.contains("auto")));
    }

    #[test]
    fn decodes_raster_data_and_consumes_continuation_bytes() {
        let mut fw = FrameWriter::new(Cursor::new(Vec::new()));
        let (cmd, payload) = crate::command::raster_data_header(3, 1);
        fw.write_frame(cmd, &payload).unwrap();
        let mut bytes = fw.into_inner().into_inner();
        bytes.extend_from_slice(&[0xAA, 0xBB, 0xCC]);

        let (decoded, err) = decode_stream(Cursor::new(bytes));
        assert!(err.is_none());
        assert_eq!(decoded.len(), 1);
        assert!(decoded[0].lines.iter().any(|l| l.contains("3 raster data bytes")));
        assert!(decoded[0].lines.iter().any(|l| l.contains("aa bb cc")));
    }

    #[test]
    fn unrecognized_command_falls_back_to_hex_dump() {
        let mut fw = FrameWriter::new(Cursor::new(Vec::new()));
        fw.write_frame(0x6a, &[0x78, 0x00, 0x04]).unwrap();
        let bytes = fw.into_inner().into_inner();

        let (decoded, err) = decode_stream(Cursor::new(bytes));
        assert!(err.is_none());
        assert_eq!(decoded[0].cmd, 0x6a);
        assert!(decoded[0].lines[0].contains("raw data dump"));
    }

    #[test]
    fn job_boundary_reset_emits_sequence_restart_note() {
        let mut fw = FrameWriter::new(Cursor::new(Vec::new()));
        fw.write_frame(0x41, &[0x00]).unwrap(); // seq 0
        fw.write_frame(0x41, &[0x00]).unwrap(); // seq 1
        let bytes = fw.into_inner().into_inner();

        // A second job's new-page frame, seq reset to 0, concatenated on.
        let mut fw2 = FrameWriter::new(Cursor::new(Vec::new()));
        fw2.write_frame(0x51, &[0x00]).unwrap();
        let mut combined = bytes;
        combined.extend_from_slice(&fw2.into_inner().into_inner());

        let (decoded, err) = decode_stream(Cursor::new(combined));
        assert!(err.is_none());
        let boundary = &decoded[2];
        assert_eq!(boundary.cmd, 0x51);
        assert!(boundary.lines[0].contains("Sequence restarts at"));
    }

    #[test]
    fn bad_checksum_stops_decoding_and_reports_the_error() {
        let mut fw = FrameWriter::new(Cursor::new(Vec::new()));
        fw.write_frame(0x41, &[0x00]).unwrap();
        let mut bytes = fw.into_inner().into_inner();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;

        let (decoded, err) = decode_stream(Cursor::new(bytes));
        assert!(decoded.is_empty());
        assert!(matches!(err, Some(FrameDecodeError::Checksum { .. })));
    }
}
