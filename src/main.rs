// src/main.rs
// Command-line converter for ISF Reader

use std::io;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use isf_reader::{ExportOptions, IsfFile};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Convert a Tektronix ISF waveform file to delimited text
#[derive(Parser, Debug)]
#[command(name = "isf_reader", version)]
struct Args {
    /// ISF file to decode
    #[arg(value_name = "INPUT_FILE")]
    input: PathBuf,

    /// Write output to this file instead of stdout
    #[arg(short = 'o', long = "out", value_name = "OUTPUT_FILE")]
    output: Option<PathBuf>,

    /// Show a summary of the decoded waveform
    #[arg(short, long)]
    verbose: bool,

    /// Log decoding details
    #[arg(short, long)]
    debug: bool,

    /// Column delimiter
    #[arg(long, default_value_t = ',')]
    delimiter: char,

    /// Omit the commented header block
    #[arg(long)]
    no_metadata: bool,
}

fn init_tracing(args: &Args) {
    let level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(args: &Args) -> isf_reader::Result<()> {
    let isf = IsfFile::open(&args.input)?;

    if args.verbose || args.debug {
        eprint!("{}", isf.summary());
    }

    let options = ExportOptions {
        delimiter: args.delimiter,
        metadata: !args.no_metadata,
    };

    match &args.output {
        Some(output_file) => {
            isf.write_csv(output_file, &options)?;
            info!(
                "converted {} to {} ({} points)",
                args.input.display(),
                output_file.display(),
                isf.point_count()
            );
        }
        None => isf.write_delimited(io::stdout().lock(), &options)?,
    }

    Ok(())
}

fn main() {
    let args = Args::parse();
    init_tracing(&args);

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
