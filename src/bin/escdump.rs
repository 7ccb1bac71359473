//! A verifier/dumper for captured command streams: reads a previously
//! captured command stream on stdin and pretty-prints its opcode
//! semantics to stdout.

use std::io::{self, BufReader};

use anyhow::{bail, Result};
use clap::Parser;
use min12xxw::decode::decode_stream;

/// Decodes and pretty-prints a captured Minolta PagePro command stream.
#[derive(Parser, Debug)]
#[command(name = "escdump", version, about)]
struct Args {}

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    init_logging();
    let _args = Args::parse();

    let stdin = io::stdin();
    let reader = BufReader::new(stdin.lock());
    let (decoded, err) = decode_stream(reader);

    for frame in &decoded {
        for line in &frame.lines {
            println!("{}", line);
        }
        println!();
    }

    if let Some(err) = err {
        tracing::error!("{}", err);
        bail!(err);
    }
    Ok(())
}
