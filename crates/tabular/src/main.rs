//! Tabular command-line front end
//!
//! Standalone utilities over the change-set core:
//! - **infer**: suggest a schema for a CSV upload
//! - **validate**: turn a row set or partial row set into a validated change set
//! - **diff**: column changes between two schemas
//! - **pack / unpack**: the compressed change-set frame

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tabular_logging::LogConfig;
use tabular_protocol::TableLimits;
use tracing::debug;

mod cli;

#[derive(Parser, Debug)]
#[command(name = "tabular", about = "Validate and package tabular change sets")]
struct Cli {
    /// Enable verbose logging (debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Limits file (defaults to <TABULAR_HOME>/config.toml)
    #[arg(long, global = true, env = "TABULAR_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Suggest column types for a CSV file
    Infer {
        /// CSV file to scan
        file: PathBuf,

        /// Field separator (default: ',')
        #[arg(long)]
        separator: Option<String>,

        /// Quote character (default: '"')
        #[arg(long)]
        quote: Option<String>,

        /// Escape character (default: '\')
        #[arg(long)]
        escape: Option<String>,

        /// The first line is data, not a header
        #[arg(long)]
        no_header: bool,

        /// Lines to skip before the header
        #[arg(long)]
        skip_lines: Option<u64>,

        /// Scan every row instead of the preview window
        #[arg(long)]
        full_scan: bool,
    },

    /// Validate rows against a schema and print the change set
    Validate {
        /// JSON array of column models
        #[arg(long)]
        schema: PathBuf,

        /// Row set (or partial row set with --partial) as JSON
        #[arg(long)]
        rows: PathBuf,

        /// Treat --rows as a partial row set
        #[arg(long)]
        partial: bool,

        /// Last change applied to the table, as JSON (partial row sets only)
        #[arg(long, requires = "partial")]
        last_change: Option<PathBuf>,

        /// Write the change set JSON here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Column changes between two schemas
    Diff {
        /// Old column ids, comma separated (omit for a new table)
        #[arg(long, value_delimiter = ',')]
        old: Option<Vec<String>>,

        /// New column ids, comma separated (omit to clear the schema)
        #[arg(long, value_delimiter = ',')]
        new: Option<Vec<String>>,
    },

    /// Compress a change set JSON file into a frame
    Pack {
        input: PathBuf,
        output: PathBuf,

        /// Store the JSON uncompressed
        #[arg(long)]
        raw: bool,
    },

    /// Print the change set held in a frame
    Unpack { input: PathBuf },
}

fn load_limits(config: Option<PathBuf>) -> Result<TableLimits> {
    let path = match config {
        Some(path) => path,
        None => tabular_protocol::config_path(&tabular_logging::tabular_home()?),
    };
    let limits = tabular_protocol::load_limits(&path)
        .with_context(|| format!("Failed to load limits from {}", path.display()))?;
    debug!(path = %path.display(), ?limits, "limits loaded");
    Ok(limits)
}

fn run_command(cli: Cli) -> Result<()> {
    let limits = load_limits(cli.config)?;
    match cli.command {
        Commands::Infer {
            file,
            separator,
            quote,
            escape,
            no_header,
            skip_lines,
            full_scan,
        } => cli::infer::run(
            cli::infer::InferArgs {
                file,
                separator,
                quote,
                escape,
                no_header,
                skip_lines,
                full_scan,
            },
            &limits,
        ),
        Commands::Validate {
            schema,
            rows,
            partial,
            last_change,
            out,
        } => cli::validate::run(
            cli::validate::ValidateArgs {
                schema,
                rows,
                partial,
                last_change,
                out,
            },
            &limits,
        ),
        Commands::Diff { old, new } => cli::diff::run(old, new),
        Commands::Pack { input, output, raw } => cli::pack::run_pack(&input, &output, raw),
        Commands::Unpack { input } => cli::pack::run_unpack(&input),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let logging = tabular_logging::init_logging(LogConfig {
        app_name: "tabular",
        verbose: cli.verbose,
        log_to_file: true,
    })
    .or_else(|err| {
        eprintln!("Warning: file logging disabled: {:#}", err);
        tabular_logging::init_logging(LogConfig {
            app_name: "tabular",
            verbose: cli.verbose,
            log_to_file: false,
        })
    });
    if let Err(err) = logging {
        eprintln!("Warning: logging disabled: {:#}", err);
    }

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{:#}", err);
            ExitCode::from(1)
        }
    }
}
