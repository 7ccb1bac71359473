//! The page pipeline: PBM header parsing, margin skip, 8-band
//! partitioning, scanline compression, and raster-data commands.
//!
//! [`run_job`] is the whole encoder: it owns the [`FrameWriter`] sequence
//! counter and the [`ScanlineTable`] dictionary for the lifetime of one job,
//! mirroring the process-wide state the original filter kept in statics
//! (see `DESIGN.md`).

use std::io::{BufRead, Write};

use crate::command;
use crate::compress::ScanlineTable;
use crate::config::PrinterConfig;
use crate::frame::{FrameEncodeError, FrameWriter};
use crate::pbm::{PageHeader, PbmError, PbmJobReader};
use crate::{BANDS_PER_PAGE, MARGIN_TABLE};

/// Errors that can occur while running a print job end to end.
#[derive(Debug)]
pub enum PageError {
    /// Failure writing a frame (or raw continuation bytes) to the sink.
    Frame(FrameEncodeError),
    /// Failure reading or parsing the PBM input.
    Pbm(PbmError),
}

impl std::fmt::Display for PageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageError::Frame(err) => write!(f, "{}", err),
            PageError::Pbm(err) => write!(f, "{}", err),
        }
    }
}

impl From<FrameEncodeError> for PageError {
    fn from(err: FrameEncodeError) -> PageError {
        PageError::Frame(err)
    }
}

impl From<PbmError> for PageError {
    fn from(err: PbmError) -> PageError {
        PageError::Pbm(err)
    }
}

impl std::error::Error for PageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PageError::Frame(err) => Some(err),
            PageError::Pbm(err) => Some(err),
        }
    }
}

/// Converts a small, known-non-negative `u32` into a `usize` without an
/// `as` cast, falling back to `0` (never hit in practice: all callers pass
/// margin-table entries or byte counts well under `usize::MAX`).
fn to_usize(n: u32) -> usize {
    usize::try_from(n).unwrap_or(0)
}

/// The per-side margin skip, in units of 8 pixels (one scanline byte), for
/// the active resolution. `0` when margins are not currently enforced.
fn skip_unit(config: &PrinterConfig, margins_enabled: bool) -> u32 {
    if !margins_enabled {
        return 0;
    }
    let res_low = config.resolution.code().to_le_bytes()[0];
    MARGIN_TABLE[usize::from(res_low)]
}

/// Runs an entire print job: reads PBM pages from `input` and writes the
/// framed command stream to `output`.
///
/// Margin auto-disable (triggered by a page too small to carry its own
/// margins) is sticky for the rest of the job, matching the original
/// filter's behavior.
pub fn run_job<R: BufRead, W: Write>(
    input: R,
    output: W,
    config: &PrinterConfig,
) -> Result<(), PageError> {
    let mut writer = FrameWriter::new(output);

    let (cmd, payload) = command::start(config.model);
    writer.write_frame(cmd, &payload)?;
    let (cmd, payload) =
        command::start_job(config.resolution.code(), config.paper_type, config.model);
    writer.write_frame(cmd, &payload)?;

    let mut pages = PbmJobReader::new(input);
    let mut table = ScanlineTable::new();
    let mut margins_enabled = config.margins_enabled;
    let mut page_count = 0u32;

    while let Some(header) = pages.next_page()? {
        process_page(
            &mut writer,
            &mut pages,
            &mut table,
            header,
            config,
            &mut margins_enabled,
        )?;
        page_count += 1;
    }
    tracing::info!(pages = page_count, "job complete");

    let (cmd, payload) = command::end_job();
    writer.write_frame(cmd, &payload)?;
    let (cmd, payload) = command::stop();
    writer.write_frame(cmd, &payload)?;
    writer.flush()?;
    Ok(())
}

fn process_page<R: BufRead, W: Write>(
    writer: &mut FrameWriter<W>,
    pages: &mut PbmJobReader<R>,
    table: &mut ScanlineTable,
    header: PageHeader,
    config: &PrinterConfig,
    margins_enabled: &mut bool,
) -> Result<(), PageError> {
    let res_low = config.resolution.code().to_le_bytes()[0];

    let mut s = skip_unit(config, *margins_enabled);
    let mut skip_total = 16 * s;
    if *margins_enabled && skip_total > 0 {
        let h = i64::from(header.height);
        let w = i64::from(header.width);
        let st = i64::from(skip_total);
        if (h - st) / 8 <= st || w <= 2 * st {
            tracing::warn!(
                "page dimensions are so small that I won't enforce page \
                 margins for this and all subsequent pages"
            );
            *margins_enabled = false;
            s = 0;
            skip_total = 0;
        }
    }

    let sclbytes = to_usize(header.scanline_bytes());
    if sclbytes < 2 * to_usize(s) {
        // Never let the horizontal skip consume the whole scanline.
        s = 0;
        skip_total = 0;
    }

    let printed_w = header.width.saturating_sub(skip_total);
    let printed_h = header.height.saturating_sub(skip_total);
    let (cmd, payload) = command::new_page(
        printed_w,
        printed_h,
        config.tray,
        config.paper_format,
        res_low,
    );
    writer.write_frame(cmd, &payload)?;

    let sclperbl = (header.height + 7) / 8;

    let mut scl = vec![0u8; sclbytes];
    for _ in 0..(s * 8) {
        pages.read_scanline(&mut scl)?;
    }

    let mut yc = s * 8;
    let mut ecofl = false;
    for band in 0..BANDS_PER_PAGE {
        let mut band_buf = Vec::new();
        let mut band_len = 0u32;
        let mut yy = 0u32;
        while yy < sclperbl && yc < header.height {
            pages.read_scanline(&mut scl)?;
            let include = yc + s * 8 <= header.height;
            if include {
                if config.ecomode {
                    if ecofl {
                        scl.iter_mut().for_each(|b| *b = 0);
                    }
                    ecofl = !ecofl;
                }
                let lo = to_usize(s);
                let hi = sclbytes - lo;
                let region = &scl[lo..hi];
                let mut ops = Vec::new();
                table.compress(region, &mut ops);
                band_buf.push(0x80 | table.len());
                band_buf.extend_from_slice(table.entries());
                band_buf.extend_from_slice(&ops);
                let ops_len = u32::try_from(ops.len()).unwrap_or(u32::MAX);
                band_len += 1 + u32::from(table.len()) + ops_len;
            }
            yy += 1;
            yc += 1;
        }

        let reported_lines = if band + 1 == BANDS_PER_PAGE {
            yy.saturating_sub(8 * s)
        } else {
            yy
        };
        let line_count = u16::try_from(reported_lines).unwrap_or(u16::MAX);
        let (cmd, payload) = command::raster_data_header(band_len, line_count);
        writer.write_frame(cmd, &payload)?;
        writer.write_raw(&band_buf)?;
    }

    Ok(())
}
