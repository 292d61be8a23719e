//! rowstore CLI
//!
//! Command-line tools for trying out a rowstore store.
//!
//! # Commands
//!
//! - `demo` - List products, add one with a generated id, and list again
//! - `stress` - Insert generated rows from many threads into one store
//! - `version` - Show version information

mod commands;

use clap::{Parser, Subcommand};
use rowstore_core::LEGACY_SHARED_NAME;
use tracing_subscriber::EnvFilter;

/// rowstore command-line tools.
#[derive(Parser)]
#[command(name = "rowstore")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Store name
    #[arg(global = true, short, long, default_value = LEGACY_SHARED_NAME)]
    store: String,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List products, add one, save, and list again
    Demo {
        /// Name of the product to add
        #[arg(short, long, default_value = "xxx")]
        name: String,

        /// Show key values in errors and logs
        #[arg(long)]
        sensitive: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Insert generated rows from many threads into one store
    Stress {
        /// Number of worker threads
        #[arg(short, long, default_value = "4")]
        threads: usize,

        /// Inserts per thread
        #[arg(short, long, default_value = "1000")]
        ops: usize,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Demo {
            name,
            sensitive,
            format,
        } => {
            commands::demo::run(&cli.store, &name, sensitive, &format)?;
        }
        Commands::Stress {
            threads,
            ops,
            format,
        } => {
            if threads == 0 {
                return Err("--threads must be at least 1".into());
            }
            commands::stress::run(&cli.store, threads, ops, &format)?;
        }
        Commands::Version => {
            println!("rowstore CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("rowstore core v{}", rowstore_core::VERSION);
        }
    }

    Ok(())
}
