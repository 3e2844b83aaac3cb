// SPDX-License-Identifier: MIT

//! Daemon lifecycle: acquire the single-instance lock, stand up the gate
//! directory tree, run `JobManager::startup`, and hand back a guard whose
//! `Drop` releases the lock.

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use fs2::FileExt;
use jg_adapters::SchedulerAdapter;
use jg_core::SystemClock;
use jg_engine::JobManager;
use jg_gatefs::GateFs;

use crate::config::DaemonConfig;
use crate::env;
use crate::error::LifecycleError;

/// Holds the exclusive lock file open for the process lifetime; releasing
/// it (on `Drop`) is the signal to any other `job-gated` instance that this
/// one has exited.
pub struct LockGuard {
    #[allow(dead_code)]
    file: File,
    path: PathBuf,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Acquire the single-instance lock under `gate_root`, failing fast if
/// another daemon already holds it — a single daemon owns the directory
/// tree at a time.
pub fn acquire_lock(gate_root: &std::path::Path) -> Result<LockGuard, LifecycleError> {
    std::fs::create_dir_all(gate_root).map_err(|e| LifecycleError::CreateDirs(gate_root.to_path_buf(), e))?;

    let path = env::lock_path(gate_root);
    let file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&path)
        .map_err(|e| LifecycleError::Lock(path.clone(), e))?;

    file.try_lock_exclusive()
        .map_err(|_| LifecycleError::AlreadyRunning(path.clone()))?;

    file.set_len(0).map_err(|e| LifecycleError::WritePid(path.clone(), e))?;
    let mut file = file;
    writeln!(file, "{}", std::process::id()).map_err(|e| LifecycleError::WritePid(path.clone(), e))?;

    Ok(LockGuard { file, path })
}

/// Build the `GateFs`, ensure every named directory exists, construct the
/// `JobManager` over the configured schedulers, and run its startup
/// reconciliation pass.
///
/// `schedulers` is supplied by the caller rather than built here: concrete
/// scheduler backends (PBS submission, SSH dispatch) are out of scope for
/// this crate and are expected to be registered by whatever deployment
/// wires this binary together. An empty map is valid — the
/// daemon still runs every step but `check_new_jobs`/`check_running_jobs`
/// have nothing to submit jobs to.
pub fn startup(
    config: &DaemonConfig,
    schedulers: std::collections::HashMap<String, Arc<dyn SchedulerAdapter>>,
) -> Result<JobManager, LifecycleError> {
    config
        .gate
        .ensure_dirs()
        .map_err(|e| LifecycleError::CreateDirs(config.gate_root.clone(), e))?;

    for name in &config.scheduler_names {
        if !schedulers.contains_key(name) {
            tracing::warn!(scheduler = %name, "configured scheduler has no registered adapter");
        }
    }

    let gate = GateFs::new(config.gate.clone());
    let manager = JobManager::new(
        gate,
        schedulers,
        config.registry.clone(),
        Arc::new(SystemClock),
        config.manager.clone(),
    );
    manager.startup();
    Ok(manager)
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
