//! Delivery Dispatch - Binary Entry Point
//!
//! Reads a command file, runs every command against one dispatch engine and
//! writes the protocol output to `<INPUT>_output_file.txt` (or stdout).

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use delivery_dispatch::protocol::Session;

/// Single-vehicle delivery dispatcher
#[derive(Parser, Debug)]
#[command(name = "delivery-dispatch", version, about)]
struct Cli {
    /// Command file, one command per line
    input: PathBuf,

    /// Output file (defaults to `<INPUT>_output_file.txt`)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write output to stdout instead of a file
    #[arg(long, conflicts_with = "output")]
    stdout: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn default_output(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push("_output_file.txt");
    PathBuf::from(name)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .context("invalid log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let commands = fs::read_to_string(&cli.input)
        .with_context(|| format!("failed to read {}", cli.input.display()))?;

    let mut out: Box<dyn Write> = if cli.stdout {
        Box::new(BufWriter::new(io::stdout().lock()))
    } else {
        let path = cli.output.clone().unwrap_or_else(|| default_output(&cli.input));
        let file = fs::File::create(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        info!(path = %path.display(), "writing output");
        Box::new(BufWriter::new(file))
    };

    let mut session = Session::new();
    for (number, line) in commands.lines().enumerate() {
        match session.handle_line(line) {
            Ok(lines) => {
                for line in lines {
                    writeln!(out, "{line}")?;
                }
            }
            Err(err) => warn!(line = number + 1, %err, "skipping command"),
        }
        if session.is_finished() {
            break;
        }
    }

    info!(
        tracked = session.engine().len(),
        state_root = %session.engine().state_root_hex(),
        "input processed"
    );
    let pending = session.finish();
    info!(pending = pending.len(), "session closed");
    out.flush().context("failed to flush output")?;

    Ok(())
}
