// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! - Scanning from a live camera
//! - Listing cameras
//! - Decoding still images
//! - Inspecting the debug log

use barcode_scanner::backends::camera::{VideoFrame, get_backend};
use barcode_scanner::frame_processor::{FrameCropDecoder, MultiFormatDecoder};
use barcode_scanner::storage::DebugLog;
use barcode_scanner::{Config, Scanner, ScannerError};
use clap::Args;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Args, Debug, Default)]
pub struct ScanOptions {
    /// Camera device path (e.g. /dev/video0)
    #[arg(short, long)]
    pub device: Option<String>,

    /// Give up after this many seconds
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Record attempts in the debug log and print them afterwards
    #[arg(long)]
    pub debug: bool,

    /// Only print the decoded value
    #[arg(short, long)]
    pub minimal: bool,

    /// Switch the torch on while scanning
    #[arg(long)]
    pub torch: bool,

    /// Config file (default: ~/.config/barcode-scanner/config.json)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Scan until a code is found, Ctrl+C or timeout
pub fn scan(options: ScanOptions) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &options.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    if options.device.is_some() {
        config.device = options.device.clone();
    }
    config.show_debug |= options.debug;
    config.minimal_view |= options.minimal;
    config.auto_start = true;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run_scan(config, options))
}

async fn run_scan(config: Config, options: ScanOptions) -> Result<(), Box<dyn std::error::Error>> {
    let scanner = Scanner::builder(config).mount().await;
    if let Some(error) = scanner.error() {
        return Err(ScannerError::Camera(error).into());
    }

    let handle = scanner.cancel_handle();
    ctrlc::set_handler(move || handle.cancel())?;

    if options.torch {
        scanner.toggle_torch(true);
        if !scanner.torch_on() {
            eprintln!("Torch not available");
        }
    }

    if !scanner.minimal_view() {
        println!("Scanning... (press Ctrl+C to cancel)");
    }

    let result = match options.timeout {
        Some(secs) => {
            match tokio::time::timeout(Duration::from_secs(secs), scanner.wait_for_result()).await
            {
                Ok(result) => result,
                Err(_) => {
                    scanner.cancel();
                    eprintln!("Timed out after {} seconds", secs);
                    None
                }
            }
        }
        None => scanner.wait_for_result().await,
    };

    if scanner.config().show_debug {
        for entry in scanner.debug_entries() {
            eprintln!("  {}", entry);
        }
    }

    match result {
        Some(result) if scanner.minimal_view() => {
            println!("{}", result.value);
            Ok(())
        }
        Some(result) => {
            println!("Detected ({}): {}", result.strategy, result.value);
            Ok(())
        }
        None => Err("No code detected".into()),
    }
}

/// List all available cameras
pub fn list_cameras() -> Result<(), Box<dyn std::error::Error>> {
    let cameras = get_backend().enumerate_cameras();

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras:");
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        println!("  [{}] {}", index, camera.name);
        println!("      Path: {}", camera.path);
        if let Some(driver) = &camera.driver {
            println!("      Driver: {}", driver);
        }
    }

    Ok(())
}

/// Decode a still image with the crop and multi-format decoders
pub fn decode_image(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load();
    let luma = image::open(path)?.to_luma8();
    let (width, height) = luma.dimensions();
    let frame = VideoFrame::from_luma(width, height, luma.into_raw());
    println!("Image: {}x{}", width, height);

    let crop = FrameCropDecoder::new(config.crop_fraction(), config.crop_target_size());
    if let Some(value) = crop.decode_frame(&frame)? {
        println!("frame-crop: {}", value);
        return Ok(());
    }

    let multi = MultiFormatDecoder::new(
        config.preferred_formats.clone(),
        config.multi_format_timeout(),
    );
    match multi.decode_still(&frame)? {
        Some(value) => {
            println!("multi-format: {}", value);
            Ok(())
        }
        None => Err("No code found".into()),
    }
}

/// Print or clear the persisted debug log
pub fn show_logs(clear: bool) -> Result<(), Box<dyn std::error::Error>> {
    let log = DebugLog::persistent(true);
    if clear {
        log.clear();
        println!("Debug log cleared.");
        return Ok(());
    }

    let entries = log.entries();
    if entries.is_empty() {
        println!("Debug log is empty.");
    }
    for entry in entries {
        println!("{}", entry);
    }
    Ok(())
}
