// Copyright (c) 2026 Pegasus Heavy Industries LLC
// Licensed under the MIT License

//! gpufanctl: drives an NVIDIA GPU fan from a step curve, polling the
//! GPU through `nvidia-settings` until stopped.

use anyhow::Context;
use clap::Parser;
use gpu_fan_control::config;
use gpu_fan_control::control::{ControlLoop, LoopConfig, TokioScheduler};
use gpu_fan_control::nvidia::NvidiaSettings;
use std::sync::Arc;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::Notify;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "gpufanctl", about = "NVIDIA GPU fan curve daemon")]
struct Cli {
    /// Path to the fan curve file.
    #[arg(default_value = config::DEFAULT_CONFIG_PATH)]
    config: String,

    /// Log level; DEBUG for verbose output, INFO otherwise.
    #[arg(default_value = "INFO")]
    log_level: String,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = config::log_filter_for(Some(&cli.log_level));
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level.to_string()))
        .init();

    let config_path = config::resolve_config_path(Some(&cli.config));
    log::info!("Opening config file: {}", config_path.display());
    let curve = config::load_curve(&config_path)
        .with_context(|| format!("Could not load fan curve from {}", config_path.display()))?;

    let shutdown = Arc::new(Notify::new());
    let shutdown_signal = shutdown.clone();
    let mut terminate = signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;

    // Signal handler
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = terminate.recv() => {}
        }
        log::info!("Received shutdown signal");
        shutdown_signal.notify_one();
    });

    let mut control = ControlLoop::new(curve, NvidiaSettings::new(), LoopConfig::default());
    let mut scheduler = TokioScheduler::new(shutdown);
    control
        .run(&mut scheduler)
        .await
        .context("Control loop aborted")?;

    log::info!("Daemon shutting down");
    Ok(())
}
