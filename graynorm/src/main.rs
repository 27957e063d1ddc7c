use graynorm::normalize_file;
use std::path::PathBuf;
use tracing::{info, Level};

use anyhow::Result;
use clap::Parser;

#[cfg(not(debug_assertions))]
const DEFAULT_DEBUG_LEVEL: u8 = 1;
#[cfg(debug_assertions)]
const DEFAULT_DEBUG_LEVEL: u8 = 99;

/// Reads a 24-bit bitmap, converts it to grayscale, stretches its contrast to the full
/// 0-255 range and writes it as a 264 image (or as a bitmap, if OUTPUT ends in .bmp)
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Turn debugging information on
    #[arg(short, long, default_value_t = DEFAULT_DEBUG_LEVEL, action = clap::ArgAction::Count)]
    verbosity: u8,

    /// The input image (bitmap or 264 image)
    input: PathBuf,

    /// The output file name
    output: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbosity {
        0 => Level::ERROR,
        1 => Level::WARN,
        2 => Level::INFO,
        3 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();

    let extent = normalize_file(&cli.input, &cli.output)?;
    info!(
        "Normalized {} ({}..={}) into {}",
        cli.input.display(),
        extent.min,
        extent.max,
        cli.output.display()
    );
    Ok(())
}
