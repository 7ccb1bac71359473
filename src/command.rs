//! Builders for the fixed command payloads the printer accepts.
//!
//! Each function returns the `(cmd, payload)` pair that
//! [`crate::frame::FrameWriter::write_frame`] expects; none of them touch
//! I/O directly, which keeps them trivial to unit test.

use crate::config::{Model, PaperFormat, PaperType, Tray};

/// `0x40`: select the printer model at the start of a session.
pub fn start(model: Model) -> (u8, Vec<u8>) {
    (0x40, vec![model.code(), 0x00])
}

/// `0x41`: stop the current session.
pub fn stop() -> (u8, Vec<u8>) {
    (0x41, vec![0x00])
}

/// `0x50`: begin a job, selecting resolution and paper type.
pub fn start_job(resolution_code: u16, paper_type: PaperType, model: Model) -> (u8, Vec<u8>) {
    let [res_lo, res_hi] = resolution_code.to_le_bytes();
    let model_flag = if model.is_1300_series_or_newer() {
        0x04
    } else {
        0x00
    };
    (
        0x50,
        vec![res_lo, res_hi, 0x00, paper_type.code(), 0x04, 0x00, model_flag, 0x00],
    )
}

/// `0x51`: start a new page with the given printable dimensions (in
/// pixels, already reduced by any enforced margin).
///
/// `resolution_low_byte` is the low byte of the active resolution code;
/// it selects the `0xC0` flag used for the 300 dpi case.
pub fn new_page(
    width: u32,
    height: u32,
    tray: Tray,
    paper_format: PaperFormat,
    resolution_low_byte: u8,
) -> (u8, Vec<u8>) {
    let x = width.to_le_bytes();
    let y = height.to_le_bytes();
    let flag = if resolution_low_byte == 0 { 0xC0 } else { 0x00 };
    (
        0x51,
        vec![
            0x00,
            0x01,
            x[2],
            x[3],
            x[0],
            x[1],
            y[2],
            y[3],
            y[0],
            y[1],
            0x08,
            0x00,
            0x08,
            0x00,
            tray.code(),
            paper_format.code(),
            0x00,
            0x00,
            0x00,
            0x00,
            flag,
            0x00,
        ],
    )
}

/// `0x52`: the six-byte raster-data header. The compressed band bytes that
/// follow are written separately, outside the envelope's checksum, via
/// [`crate::frame::FrameWriter::write_raw`].
pub fn raster_data_header(byte_count: u32, line_count: u16) -> (u8, Vec<u8>) {
    let bc = byte_count.to_le_bytes();
    let lc = line_count.to_le_bytes();
    (0x52, vec![bc[0], bc[1], bc[2], bc[3], lc[0], lc[1]])
}

/// `0x55`: end the current job. Callers follow this with [`stop`].
pub fn end_job() -> (u8, Vec<u8>) {
    (0x55, vec![0x00])
}

/// `0x6A`: enable the device's register interface before querying it.
pub fn enable_registers(model: Model) -> (u8, Vec<u8>) {
    let magic = if model.is_1300_series_or_newer() {
        0x1C
    } else {
        0x78
    };
    (0x6A, vec![magic, 0x00, 0x04])
}

/// `0x60`: request the contents of register `reg`.
pub fn read_register(reg: u8) -> (u8, Vec<u8>) {
    (0x60, vec![reg, 0x00])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_job_sets_model_flag_for_newer_models() {
        let (_, payload) = start_job(0x0001, PaperType::Normal, Model::M1400W);
        assert_eq!(payload[6], 0x04);
        let (_, payload) = start_job(0x0001, PaperType::Normal, Model::M1200W);
        assert_eq!(payload[6], 0x00);
    }

    #[test]
    fn new_page_uses_mixed_endian_layout() {
        let (cmd, payload) = new_page(0x00010203, 0x04050607, Tray::Auto, PaperFormat::DEFAULT, 0x01);
        assert_eq!(cmd, 0x51);
        // x = 0x00010203 -> le bytes [0x03,0x02,0x01,0x00]
        assert_eq!(payload[2], 0x01); // x[2]
        assert_eq!(payload[3], 0x00); // x[3]
        assert_eq!(payload[4], 0x03); // x[0]
        assert_eq!(payload[5], 0x02); // x[1]
    }

    #[test]
    fn new_page_sets_300dpi_flag_only_when_low_byte_zero() {
        let (_, payload) = new_page(10, 10, Tray::Auto, PaperFormat::DEFAULT, 0x00);
        assert_eq!(payload[20], 0xC0);
        let (_, payload) = new_page(10, 10, Tray::Auto, PaperFormat::DEFAULT, 0x01);
        assert_eq!(payload[20], 0x00);
    }

    #[test]
    fn raster_data_header_layout() {
        let (cmd, payload) = raster_data_header(0x01020304, 0x0506);
        assert_eq!(cmd, 0x52);
        assert_eq!(payload, vec![0x04, 0x03, 0x02, 0x01, 0x06, 0x05]);
    }

    #[test]
    fn enable_registers_picks_magic_by_model() {
        assert_eq!(enable_registers(Model::M1200W).1[0], 0x78);
        assert_eq!(enable_registers(Model::M1300W).1[0], 0x1C);
        assert_eq!(enable_registers(Model::M1400W).1[0], 0x1C);
    }
}
