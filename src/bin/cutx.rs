//! Select fields from delimited lines, optionally replacing them with the
//! output of a command.
//!
//! Usage:
//!   cutx -f 1,3 -d ,              like `cut -f 1,3 -d ,`
//!   cutx -f '1=date -d@{}',2- log replace field 1 with `date -d@<field 1>`

use clap::Parser;
use cutx::{Config, DEFAULT_DELIMITER, DEFAULT_FIELDS, ShellRunner};
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

/// Remove fields from each line or replace them with the output of a command.
#[derive(Parser)]
#[command(name = "cutx", version)]
struct Cli {
    /// Separator between fields, used for input and output
    #[arg(short, long, default_value = DEFAULT_DELIMITER)]
    delimiter: String,

    /// Fields to keep: N, N-M or N-, optionally followed by =COMMAND ({} is the field)
    #[arg(short, long, default_value = DEFAULT_FIELDS, allow_hyphen_values = true)]
    fields: String,

    /// Log field mappers and line counts on stderr
    #[arg(short, long)]
    verbose: bool,

    /// Input file (default: stdin)
    file: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let config = Config::new(cli.delimiter, cli.fields).with_input(cli.file);
    let stdout = io::stdout();
    let output = BufWriter::new(stdout.lock());

    if let Err(e) = cutx::run(&config, &ShellRunner, output) {
        eprintln!("cutx: {e}");
        process::exit(1);
    }
}
