//! Main entry point for the fan controller daemon

use std::sync::atomic::Ordering;

use anyhow::Context;
use clap::Parser;
use log::info;
use tokio::signal::unix::{signal, SignalKind};

use pi5_fan_controller::{args::Args, config::Config, controller::FanController, logging};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Print version and build metadata for binary identity verification
    let pkg_version = env!("CARGO_PKG_VERSION");
    let git_hash = option_env!("GIT_HASH").unwrap_or("unknown");
    let build_time = option_env!("BUILD_TIME").unwrap_or("unknown");
    eprintln!(
        "pi5-fan-controller v{} (git {}) built {}",
        pkg_version, git_hash, build_time
    );

    let args = Args::parse();

    // Resolution priority: --config file > default config file > environment
    // > built-in defaults. The logging level depends on the config debug
    // flag, so discovery runs only once the logger is up.
    let mut config =
        Config::resolve(args.config.as_deref()).context("failed to resolve configuration")?;

    logging::setup(args.verbose, config.debug).context("failed to initialize logging")?;

    config.discover_sensors();

    let mut controller = FanController::new(config);
    controller
        .initialize()
        .context("failed to initialize fan controller")?;

    // SIGINT/SIGTERM clear the running flag; the loop observes it once per
    // iteration, so shutdown latency is bounded by the poll interval.
    let mut sigterm =
        signal(SignalKind::terminate()).context("failed to register SIGTERM handler")?;
    let running = controller.stop_handle();
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("Received SIGINT, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
        running.store(false, Ordering::SeqCst);
    });

    controller.run().await;

    Ok(())
}
