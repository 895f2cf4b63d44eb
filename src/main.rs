// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! ExamGuard server binary

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use examguard::{web, Config, ExamEngine, NAME, VERSION};

/// ExamGuard - exam session monitor
#[derive(Parser, Debug)]
#[command(name = "examguard")]
#[command(version = VERSION)]
#[command(about = "Prohibited object detection for exam sessions")]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Control API port
    #[arg(short, long)]
    port: Option<u16>,

    /// Camera board address (IP, host:port or URL)
    #[arg(long)]
    device: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace-level logging
    #[arg(long)]
    trace: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.trace {
        Level::TRACE
    } else if args.debug {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(args.debug)
        .with_line_number(args.debug)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("{} v{}", NAME, VERSION);

    let config_path = args.config.unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_create(&config_path)?;
    config.apply_env()?;

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(device) = args.device {
        config.device.address = device;
    }
    config.validate()?;

    info!("Configuration loaded from {:?}", config_path);
    info!("Camera board: {}", config.device.address);
    info!("Detector: {}", config.detection.detector_url);

    let server = config.server.clone();
    let engine = Arc::new(ExamEngine::from_config(config).await?);

    web::serve(engine, &server).await
}
