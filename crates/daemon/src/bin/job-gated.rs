// SPDX-License-Identifier: MIT

//! job-gated: the job gate daemon's process entry point.
//!
//! Loads its TOML config, acquires the single-instance lock, stands up
//! logging, runs `JobManager::startup` reconciliation, then drives the
//! tick loop on its own thread until a termination signal arrives, at
//! which point it runs the two-phase graceful shutdown.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use jg_daemon::{env, lifecycle, logging, DaemonConfig};
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("job-gated {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            other => {
                eprintln!("error: unexpected argument '{other}'");
                eprintln!("Usage: job-gated [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config_path = env::config_path();
    let config = DaemonConfig::load(&config_path)?;

    let lock = lifecycle::acquire_lock(&config.gate_root)?;
    let log_path = env::log_path(&config.gate_root);
    let _log_guard = logging::init(&log_path)?;

    info!(gate_root = %config.gate_root.display(), "starting job gate daemon");

    // Concrete scheduler backends (PBS submission, SSH dispatch) are out of
    // scope for this crate; a deployment that needs them wires its own
    // adapters in before calling `lifecycle::startup`. Running with
    // none is valid — every tick step still runs, just with nothing for
    // `check_new_jobs`/`check_running_jobs` to hand jobs to.
    let schedulers = HashMap::new();
    let manager = Arc::new(lifecycle::startup(&config, schedulers)?);

    let shutdown = Arc::new(AtomicBool::new(false));
    let tick_manager = Arc::clone(&manager);
    let tick_shutdown = Arc::clone(&shutdown);
    let sleep_time = config.manager.sleep_time;
    let tick_handle = std::thread::spawn(move || {
        jg_daemon::run::tick_loop(&tick_manager, sleep_time, &tick_shutdown);
    });

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => info!("received SIGINT, shutting down"),
    }

    shutdown.store(true, Ordering::SeqCst);
    if tick_handle.join().is_err() {
        tracing::error!("tick loop thread panicked");
    }

    manager.shutdown();
    drop(lock);
    info!("job gate daemon stopped");
    Ok(())
}

fn print_help() {
    println!("job-gated {}", env!("CARGO_PKG_VERSION"));
    println!("Job orchestration daemon: mediates between clients and backend batch schedulers.");
    println!();
    println!("USAGE:");
    println!("    job-gated");
    println!();
    println!("Configuration is read from $JOBGATE_CONFIG, or /etc/jobgate/jobgate.toml.");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Print help information");
    println!("    -V, --version    Print version information");
}
