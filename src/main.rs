use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use paraprint::{commands, diagnostics, error};

#[derive(Parser)]
#[command(name = "paraprint", about = "Content-derived paragraph fingerprints for document review")]
struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every paragraph's identifier
    Ids {
        /// Document snapshot (.json or .toml)
        file: PathBuf,
    },
    /// Build, replay selections, attach comments, and filter to the selection
    Review {
        /// Keep every paragraph instead of narrowing to the selection
        #[arg(long)]
        all: bool,
        /// Document snapshot (.json or .toml)
        file: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print section, paragraph, and word counts
    Stats {
        /// Document snapshot (.json or .toml)
        file: PathBuf,
    },
}

/// Install the stderr log subscriber. `RUST_LOG` overrides the `warn` default.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_err| return EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result: Result<(), error::Error> = match cli.command {
        Commands::Ids { file } => commands::ids(&file),
        Commands::Review { all, file, json } => commands::review(&file, all, json),
        Commands::Stats { file } => commands::stats(&file),
    };

    return match result {
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::FAILURE
        },
        Ok(()) => ExitCode::SUCCESS,
    };
}
