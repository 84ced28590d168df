// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "barcode-scanner")]
#[command(about = "Scan QR codes and barcodes with a camera")]
#[command(version = env!("GIT_VERSION"))]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan until a code is found (default)
    Scan(cli::ScanOptions),

    /// List available cameras
    List,

    /// Decode a code from a still image
    Decode {
        /// Image file (PNG, JPEG, ...)
        image: PathBuf,
    },

    /// Show the persisted scanner debug log
    Logs {
        /// Delete all entries instead of printing them
        #[arg(long)]
        clear: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG to control log level, e.g. RUST_LOG=barcode_scanner=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Scan(options)) => cli::scan(options),
        Some(Commands::List) => cli::list_cameras(),
        Some(Commands::Decode { image }) => cli::decode_image(&image),
        Some(Commands::Logs { clear }) => cli::show_logs(clear),
        None => cli::scan(cli::ScanOptions::default()),
    }
}
