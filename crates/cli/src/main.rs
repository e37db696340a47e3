//! # CLI - BTable command-line tool
//!
//! Writes sparse binary tables from delimited text and inspects existing
//! tables.
//!
//! ## Commands
//!
//! ```text
//! btable write <DEST> --labels a,b,c [--strict] [--no-sync] [--input FILE]
//!     Read rows (one per line) from stdin or FILE and write a table.
//! btable dump <SRC> [--sparse] [--strict]
//!     Print the column labels, then every row.
//! btable info <SRC>
//!     Print version, columns, row count and density.
//! ```
//!
//! ## Configuration
//!
//! Defaults come from the environment (see the `config` crate):
//!
//! ```text
//! BTABLE_SYNC       fsync the table before closing   (default: "true")
//! BTABLE_STRICT     strict row/index validation      (default: "false")
//! BTABLE_DELIMITER  field delimiter                  (default: ",")
//! BTABLE_LOG        log filter directive             (default: "warn")
//! ```
//!
//! Logs go to stderr; table data and results go to stdout.
//!
//! ## Example
//!
//! ```text
//! $ printf '0,0,0\n1.5,0,0\n0,0,-3.25\n' | btable write t.bt --labels a,b,c
//! OK (3 rows, 3 columns, 54 bytes)
//! $ btable dump t.bt --sparse
//! a,b,c
//! (empty)
//! 0:1.5
//! 2:-3.25
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use config::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Write and inspect sparse binary tables
#[derive(Parser, Debug)]
#[command(name = "btable")]
#[command(about = "Write and inspect sparse binary tables")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a table from delimited text rows
    Write {
        /// Destination file (created or truncated)
        dest: PathBuf,

        /// Column names, comma separated
        #[arg(short, long, value_delimiter = ',', required = true)]
        labels: Vec<String>,

        /// Read rows from this file instead of stdin
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Reject rows whose length differs from the column count
        #[arg(long)]
        strict: bool,

        /// Skip the fsync before closing
        #[arg(long)]
        no_sync: bool,
    },
    /// Print a table's labels and rows
    Dump {
        /// Table file to read
        src: PathBuf,

        /// Print stored `index:value` pairs instead of dense rows
        #[arg(long)]
        sparse: bool,

        /// Reject unordered or repeated column indices
        #[arg(long)]
        strict: bool,
    },
    /// Print a summary of a table
    Info {
        /// Table file to read
        src: PathBuf,
    },
}

fn main() -> Result<()> {
    let (cfg, ignored) = Config::from_env();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(cfg.log_filter.parse()?))
        .init();

    for value in &ignored {
        tracing::warn!("{}", value);
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::Write {
            dest,
            labels,
            input,
            strict,
            no_sync,
        } => {
            let opts = commands::WriteOptions {
                strict: strict || cfg.strict,
                sync: cfg.sync && !no_sync,
                delimiter: cfg.delimiter,
            };
            commands::write(&dest, &labels, input.as_deref(), &opts)
        }
        Commands::Dump {
            src,
            sparse,
            strict,
        } => commands::dump(&src, sparse, strict || cfg.strict, cfg.delimiter),
        Commands::Info { src } => commands::describe(&src),
    }
}
