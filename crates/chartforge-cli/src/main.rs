//! Chartforge CLI - Helm chart templates from operator manifests

use clap::{Parser, Subcommand};
use miette::Result;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "chartforge")]
#[command(author = "Chartforge Contributors")]
#[command(version)]
#[command(about = "Generate Helm chart templates from operator manifests", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate chart templates from the project's manifests
    Generate {
        /// Directory holding the generated manifests
        #[arg(long, default_value = "config")]
        manifest_dir: PathBuf,

        /// Chart directory (default: the PROJECT file's chartDir, else "dist")
        #[arg(long)]
        chart_dir: Option<PathBuf>,

        /// Project name (default: the PROJECT file's projectName)
        #[arg(long, env = "CHARTFORGE_PROJECT_NAME")]
        project_name: Option<String>,

        /// Project configuration file
        #[arg(long, default_value = "PROJECT")]
        project_file: PathBuf,

        /// Show what would be written without touching the chart
        #[arg(long)]
        dry_run: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Show progress logs
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> Result<()> {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            manifest_dir,
            chart_dir,
            project_name,
            project_file,
            dry_run,
            json,
            verbose,
        } => {
            init_logging(cli.debug, verbose);
            commands::generate::run(commands::generate::GenerateArgs {
                manifest_dir,
                chart_dir,
                project_name,
                project_file,
                dry_run,
                json,
            })
        }
    }
}

/// Logs go to stderr so `--json` output stays parseable. `RUST_LOG` wins over
/// the flags when set.
fn init_logging(debug: bool, verbose: bool) {
    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(debug)
        .init();
}
