//! The register query loop used for status, firmware, and page-count
//! queries over a bidirectional device channel.
//!
//! The device side of the wire is not framed the way outgoing commands
//! are: each response is a bare `(register, length)` byte pair followed
//! by `length` payload bytes. The printer sometimes answers with the
//! wrong register while it's still getting its act together, so every
//! read is wrapped in a short, bounded retry loop.

use std::io::{Read, Write};
use std::time::Duration;

use crate::command;
use crate::config::Model;
use crate::frame::{FrameEncodeError, FrameWriter};

const MAX_ATTEMPTS: u32 = 10;
const RETRY_DELAY: Duration = Duration::from_millis(100);

/// Errors that can occur while querying the device.
#[derive(Debug)]
pub enum DeviceError {
    /// A `std::io::Error` from the underlying channel.
    Io(std::io::Error),
    /// Failure encoding an outgoing command frame.
    Frame(FrameEncodeError),
    /// The requested register never arrived within [`MAX_ATTEMPTS`] tries.
    NoResponse {
        /// The register that was requested.
        register: u8,
    },
    /// A register replied with a payload length this model's firmware
    /// isn't expected to send.
    UnexpectedLength {
        /// The register that was requested.
        register: u8,
        /// The length the protocol expects.
        expected: usize,
        /// The length actually read.
        found: usize,
    },
}

impl std::fmt::Display for DeviceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceError::Io(err) => write!(f, "{}", err),
            DeviceError::Frame(err) => write!(f, "{}", err),
            DeviceError::NoResponse { register } => {
                write!(f, "no response from register {:#04x} after {} tries", register, MAX_ATTEMPTS)
            }
            DeviceError::UnexpectedLength {
                register,
                expected,
                found,
            } => write!(
                f,
                "register {:#04x} replied with {} bytes, expected {}",
                register, found, expected
            ),
        }
    }
}

impl From<std::io::Error> for DeviceError {
    fn from(err: std::io::Error) -> DeviceError {
        DeviceError::Io(err)
    }
}

impl From<FrameEncodeError> for DeviceError {
    fn from(err: FrameEncodeError) -> DeviceError {
        DeviceError::Frame(err)
    }
}

impl std::error::Error for DeviceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DeviceError::Io(err) => Some(err),
            DeviceError::Frame(err) => Some(err),
            DeviceError::NoResponse { .. } | DeviceError::UnexpectedLength { .. } => None,
        }
    }
}

/// Everything the `--status` flag can report about the printer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceStatus {
    /// The printer's free-form status string (register `0x04`).
    pub status: String,
    /// Controller firmware version (register `0x02`).
    pub controller_firmware: String,
    /// Engine firmware version (register `0x81`), absent on models that
    /// don't expose it.
    pub engine_firmware: Option<String>,
    /// Lifetime page counter (register `0x53`).
    pub page_count: u32,
}

fn send<D: Write>(
    device: &mut D,
    seq: &mut u8,
    (cmd, payload): (u8, Vec<u8>),
) -> Result<(), DeviceError> {
    let mut writer = FrameWriter::with_seq(&mut *device, *seq);
    writer.write_frame(cmd, &payload)?;
    *seq = writer.next_seq();
    Ok(())
}

fn fail_with_stop<D: Write>(device: &mut D, seq: &mut u8, err: DeviceError) -> DeviceError {
    let _ = send(device, seq, command::stop());
    err
}

/// Reads the next response for `register`, retrying up to
/// [`MAX_ATTEMPTS`] times if the device answers with a different one
/// (which happens while it's still warming up).
fn recv_register<D: Read>(device: &mut D, register: u8) -> Result<Vec<u8>, DeviceError> {
    for _ in 0..MAX_ATTEMPTS {
        std::thread::sleep(RETRY_DELAY);
        let mut header = [0u8; 2];
        device.read_exact(&mut header)?;
        let (got_reg, len) = (header[0], header[1]);
        let mut payload = vec![0u8; usize::from(len)];
        device.read_exact(&mut payload)?;
        if got_reg == register {
            return Ok(payload);
        }
    }
    Err(DeviceError::NoResponse { register })
}

fn ascii_trim(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches('\0')
        .to_string()
}

/// Runs the full status/firmware/page-counter query flow against an open
/// device channel: `start`, `enable-registers`, four register reads, then
/// `stop`.
pub fn query_status<D: Read + Write>(
    device: &mut D,
    model: Model,
) -> Result<DeviceStatus, DeviceError> {
    let mut seq = 0u8;

    send(device, &mut seq, command::start(model))?;
    send(device, &mut seq, command::enable_registers(model))?;

    send(device, &mut seq, command::read_register(0x04))?;
    let raw_status = recv_register(device, 0x04)?;
    let status = if raw_status.is_empty() {
        String::new()
    } else {
        ascii_trim(&raw_status[1..])
    };

    send(device, &mut seq, command::read_register(0x02))?;
    let cfw = recv_register(device, 0x02)?;
    if cfw.len() != 14 {
        return Err(fail_with_stop(
            device,
            &mut seq,
            DeviceError::UnexpectedLength {
                register: 0x02,
                expected: 14,
                found: cfw.len(),
            },
        ));
    }
    let controller_firmware = [
        char::from(cfw[3]),
        char::from(cfw[2]),
        char::from(cfw[1]),
        char::from(cfw[0]),
    ]
    .iter()
    .collect();

    send(device, &mut seq, command::read_register(0x81))?;
    let efw = recv_register(device, 0x81)?;
    let engine_firmware = match efw.len() {
        0 => None,
        30 => Some(ascii_trim(&efw[18..30])),
        found => {
            return Err(fail_with_stop(
                device,
                &mut seq,
                DeviceError::UnexpectedLength {
                    register: 0x81,
                    expected: 30,
                    found,
                },
            ))
        }
    };

    send(device, &mut seq, command::read_register(0x53))?;
    let pcnt = recv_register(device, 0x53)?;
    if pcnt.len() != 38 {
        return Err(fail_with_stop(
            device,
            &mut seq,
            DeviceError::UnexpectedLength {
                register: 0x53,
                expected: 38,
                found: pcnt.len(),
            },
        ));
    }
    let page_count = u32::from_le_bytes([pcnt[30], pcnt[31], pcnt[32], pcnt[33]]);

    send(device, &mut seq, command::stop())?;

    Ok(DeviceStatus {
        status,
        controller_firmware,
        engine_firmware,
        page_count,
    })
}
