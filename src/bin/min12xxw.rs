//! The print filter: converts a PBM raw raster stream on stdin into the
//! printer's command language on stdout, or (with `--status`) queries the
//! device directly and prints its state.

use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::os::unix::fs::FileTypeExt;

use anyhow::{Context, Result};
use clap::Parser;
use min12xxw::config::{
    resolve_model, resolve_paper_format, resolve_paper_type, resolve_resolution, resolve_tray,
};
use min12xxw::{Model, PrinterConfig};

/// Print filter for the Minolta PagePro 1200W/1250W/1300W/1350W/1400W.
#[derive(Parser, Debug)]
#[command(name = "min12xxw", version, about, disable_version_flag = true)]
struct Args {
    /// Print version information and exit.
    #[arg(short = 'v', long, action = clap::ArgAction::Version)]
    version: (),

    /// Open the device, print its status/firmware/page-counter, and exit.
    #[arg(short, long)]
    status: bool,

    /// Toner-saving mode (blanks every other scanline).
    #[arg(short, long)]
    ecomode: bool,

    /// Disable margin enforcement.
    #[arg(short = 'n', long)]
    nomargins: bool,

    /// Device path used for `--status` queries.
    #[arg(short, long, default_value = "/dev/lp0")]
    device: String,

    /// Printer model: 1200W, 1250W, 1300W, 1350W, 1400W.
    #[arg(short, long, default_value = "1200W")]
    model: String,

    /// Resolution: 300, 600, 1200, 1200x600.
    #[arg(short, long, default_value = "600")]
    res: String,

    /// Paper tray: auto, tray1, tray2, manual.
    #[arg(short, long, default_value = "auto")]
    tray: String,

    /// Paper type: normal, thick, transparency, postcard, envelope.
    #[arg(short, long, default_value = "normal")]
    papertype: String,

    /// Paper format (see `min12xxw::config::PaperFormat::names` for the
    /// full list).
    #[arg(short = 'f', long, default_value = "a4")]
    paperformat: String,
}

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

/// Resolves CLI option values to a [`PrinterConfig`], preferring the model
/// implied by the executable's basename (see [`Model::from_argv0`]) over
/// the `--model` flag, matching the original filter's symlink convention.
fn resolve_config(args: &Args, preselected_model: Option<Model>) -> PrinterConfig {
    let (mut model, model_err) = resolve_model(&args.model);
    if let Some(preselected) = preselected_model {
        model = preselected;
    } else if let Some(err) = model_err {
        tracing::warn!("{}", err);
    }

    let (resolution, err) = resolve_resolution(&args.res);
    if let Some(err) = err {
        tracing::warn!("{}", err);
    }
    let (tray, err) = resolve_tray(&args.tray);
    if let Some(err) = err {
        tracing::warn!("{}", err);
    }
    let (paper_type, err) = resolve_paper_type(&args.papertype);
    if let Some(err) = err {
        tracing::warn!("{}", err);
    }
    let (paper_format, err) = resolve_paper_format(&args.paperformat);
    if let Some(err) = err {
        tracing::warn!("{}", err);
    }

    PrinterConfig {
        model,
        resolution,
        tray,
        paper_type,
        paper_format,
        margins_enabled: !args.nomargins,
        ecomode: args.ecomode,
    }
}

fn run_status(args: &Args, config: &PrinterConfig) -> Result<()> {
    let mut device = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open(&args.device)
        .with_context(|| format!("couldn't open device {}", args.device))?;

    let status = min12xxw::device::query_status(&mut device, config.model)
        .context("read unexpected data from printer")?;

    println!("printer status: {}", status.status);
    println!(
        "controller firmware version: {}",
        status.controller_firmware
    );
    if let Some(engine_firmware) = &status.engine_firmware {
        println!("engine firmware version: {}", engine_firmware);
    }
    println!("page counter: {} pages", status.page_count);
    Ok(())
}

/// Runs the job pipeline, spooling through a tempfile when stdout isn't a
/// regular file or FIFO.
fn run_job(config: &PrinterConfig) -> Result<()> {
    let stdout_metadata = std::io::stdout()
        .lock()
        .metadata()
        .context("couldn't examine stdout")?;
    let spool_directly =
        stdout_metadata.file_type().is_file() || stdout_metadata.file_type().is_fifo();

    let stdin = std::io::stdin();
    let input = BufReader::new(stdin.lock());

    if spool_directly {
        let stdout = std::io::stdout();
        min12xxw::page::run_job(input, stdout.lock(), config)?;
        return Ok(());
    }

    let mut tmp = tempfile::tempfile().context("couldn't create temporary file")?;
    min12xxw::page::run_job(input, &mut tmp, config)?;
    tmp.seek(SeekFrom::Start(0))?;

    let mut buf = [0u8; 16384];
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    loop {
        let n = tmp.read(&mut buf)?;
        if n == 0 {
            break;
        }
        out.write_all(&buf[..n])?;
    }
    Ok(())
}

fn main() -> Result<()> {
    init_logging();

    let args = Args::parse();
    let preselected_model = std::env::args()
        .next()
        .and_then(|argv0| Model::from_argv0(&argv0));
    let config = resolve_config(&args, preselected_model);

    let result = if args.status {
        run_status(&args, &config)
    } else {
        run_job(&config)
    };

    if let Err(err) = &result {
        tracing::error!("{:#}", err);
    }
    result
}
