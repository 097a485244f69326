//! Gridwire Command-Line Interface
//!
//! Runs the circuit import pipeline on a serialized Structural Record.
//!
//! ```text
//! record.json --> validate (repair, normalize, resolve, layout) --> register
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{catalog, import, validate, version};

/// Gridwire - validate, lay out and register logic circuits
#[derive(Parser)]
#[command(name = "gridwire")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (YAML)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a record and register it as a circuit
    Import {
        /// Input file (JSON Structural Record)
        #[arg(short, long)]
        input: String,

        /// Register as a reusable composite component type
        #[arg(long)]
        composite: bool,

        /// Write a JSON summary of the registration
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Validate a record and print what each stage changed
    Validate {
        /// Input file (JSON Structural Record)
        #[arg(short, long)]
        input: String,
    },

    /// List the component types of a fresh catalog
    Catalog,

    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Import {
            input,
            composite,
            output,
        } => import::execute(&input, config, composite, output.as_deref()),

        Commands::Validate { input } => validate::execute(&input, config),

        Commands::Catalog => {
            catalog::execute();
            Ok(())
        }

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
