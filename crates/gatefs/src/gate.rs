// SPDX-License-Identifier: MIT

use std::fs;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use jg_core::JobState;
use tracing::debug;

use crate::config::GateConfig;
use crate::error::GateFsError;
use crate::opts::OptsRecord;

/// Typed wrapper over the shared directory tree.
///
/// `GateFs` is the only thing in this workspace allowed to issue raw
/// filesystem calls against the gate tree; everything else goes through it.
#[derive(Debug, Clone)]
pub struct GateFs {
    config: GateConfig,
}

impl GateFs {
    pub fn new(config: GateConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// List the ids present in a state directory (or any other named
    /// directory). A listing failure is the caller's signal to skip that
    /// tick's step rather than abort the whole loop.
    pub fn list_dir(&self, dir: &Path) -> Result<Vec<String>, GateFsError> {
        let entries =
            fs::read_dir(dir).map_err(|e| GateFsError::ListDir(dir.to_path_buf(), e))?;
        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| GateFsError::ListDir(dir.to_path_buf(), e))?;
            if let Some(name) = entry.file_name().to_str() {
                ids.push(name.to_string());
            }
        }
        Ok(ids)
    }

    pub fn list_waiting(&self) -> Result<Vec<String>, GateFsError> {
        self.list_dir(&self.config.waiting)
    }

    pub fn list_closing(&self) -> Result<Vec<String>, GateFsError> {
        self.list_dir(&self.config.closing)
    }

    pub fn list_stop(&self) -> Result<Vec<String>, GateFsError> {
        self.list_dir(&self.config.stop)
    }

    pub fn list_delete(&self) -> Result<Vec<String>, GateFsError> {
        self.list_dir(&self.config.delete)
    }

    pub fn list_jobs(&self) -> Result<Vec<String>, GateFsError> {
        self.list_dir(&self.config.jobs)
    }

    /// Probe every state directory in precedence order and return the first
    /// hit — readers tolerate a job momentarily holding more than one state
    /// symlink mid-transition by trusting this precedence order.
    pub fn check_state(&self, id: &str) -> Option<JobState> {
        for state in JobState::PROBE_ORDER {
            if self.config.state_dir(state).join(id).exists() {
                return Some(state);
            }
        }
        None
    }

    /// Atomically create the `new` state symlink, then best-effort unlink
    /// every other state's symlink for this job. No-op if `new` already
    /// matches `current`.
    pub fn set_state(
        &self,
        id: &str,
        current: Option<JobState>,
        new: JobState,
    ) -> Result<(), GateFsError> {
        if current == Some(new) {
            return Ok(());
        }
        debug!(job = id, ?new, "gatefs: set_state");

        let target = self.config.jobs.join(id);
        let link = self.config.state_dir(new).join(id);
        // Tolerate a stale symlink left over from a previous crash.
        let _ = fs::remove_file(&link);
        symlink(&target, &link).map_err(|e| GateFsError::io(link, e))?;

        for state in JobState::ALL {
            if state == new {
                continue;
            }
            let other = self.config.state_dir(state).join(id);
            let _ = fs::remove_file(other);
        }
        Ok(())
    }

    pub fn read_request(
        &self,
        id: &str,
    ) -> Result<serde_json::Map<String, serde_json::Value>, GateFsError> {
        let path = self.config.jobs.join(id);
        let raw = fs::read_to_string(&path).map_err(|e| GateFsError::io(path.clone(), e))?;
        let value: serde_json::Value =
            serde_json::from_str(&raw).map_err(|e| GateFsError::serde(path, e))?;
        match value {
            serde_json::Value::Object(map) => Ok(map),
            _ => Ok(serde_json::Map::new()),
        }
    }

    pub fn read_opts(&self, id: &str) -> Option<OptsRecord> {
        let path = self.config.opts.join(id);
        let raw = fs::read_to_string(path).ok()?;
        serde_json::from_str(&raw).ok()
    }

    pub fn write_opts(&self, id: &str, record: &OptsRecord) -> Result<(), GateFsError> {
        let path = self.config.opts.join(id);
        let raw = serde_json::to_string(record).map_err(|e| GateFsError::serde(&path, e))?;
        fs::write(&path, raw).map_err(|e| GateFsError::io(path, e))
    }

    pub fn write_exit(&self, id: &str, message: &str) -> Result<(), GateFsError> {
        let path = self.config.exit.join(id);
        fs::write(&path, message).map_err(|e| GateFsError::io(path, e))
    }

    pub fn create_delete_mark(&self, id: &str) -> Result<(), GateFsError> {
        let target = self.config.jobs.join(id);
        let link = self.config.delete.join(id);
        if link.exists() {
            return Ok(());
        }
        symlink(target, &link).map_err(|e| GateFsError::io(link, e))
    }

    pub fn remove_delete_mark(&self, id: &str) -> Result<(), GateFsError> {
        let link = self.config.delete.join(id);
        fs::remove_file(&link).or_else(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Ok(())
            } else {
                Err(GateFsError::io(link, e))
            }
        })
    }

    pub fn remove_stop_mark(&self, id: &str) -> Result<(), GateFsError> {
        let link = self.config.stop.join(id);
        fs::remove_file(&link).or_else(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Ok(())
            } else {
                Err(GateFsError::io(link, e))
            }
        })
    }

    pub fn output_dir(&self, id: &str) -> PathBuf {
        self.config.output.join(id)
    }

    /// Creation time of a path, used by the aging and quota-retention rules
    /// that decide when a job's output is old enough to reclaim.
    pub fn created_at(&self, path: &Path) -> Result<SystemTime, GateFsError> {
        let meta = fs::metadata(path).map_err(|e| GateFsError::io(path.to_path_buf(), e))?;
        meta.created()
            .or_else(|_| meta.modified())
            .map_err(|e| GateFsError::io(path.to_path_buf(), e))
    }

    /// Recursively sum file sizes under `path`. Returns 0 if the path does
    /// not exist. An in-process walk rather than shelling out to `du`.
    pub fn dir_size(&self, path: &Path) -> u64 {
        fn walk(path: &Path) -> u64 {
            let Ok(meta) = fs::symlink_metadata(path) else {
                return 0;
            };
            if meta.is_dir() {
                let mut total = 0;
                if let Ok(entries) = fs::read_dir(path) {
                    for entry in entries.flatten() {
                        total += walk(&entry.path());
                    }
                }
                total
            } else {
                meta.len()
            }
        }
        if !path.exists() {
            return 0;
        }
        walk(path)
    }

    /// Unlink every state symlink, `jobs/<id>`, and `exit/<id>` (if present),
    /// in that order — the request body is removed last, since its presence
    /// is what other readers use to decide a job is still live.
    pub fn remove_job_files(&self, id: &str) -> Result<(), GateFsError> {
        for state in JobState::ALL {
            let link = self.config.state_dir(state).join(id);
            let _ = fs::remove_file(link);
        }
        let job_file = self.config.jobs.join(id);
        fs::remove_file(&job_file).or_else(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Ok(())
            } else {
                Err(GateFsError::io(job_file, e))
            }
        })?;
        let exit_file = self.config.exit.join(id);
        let _ = fs::remove_file(exit_file);
        let opts_file = self.config.opts.join(id);
        let _ = fs::remove_file(opts_file);
        Ok(())
    }

    /// Move `output/<id>` into `dump/<id>` and recursively delete it there:
    /// moving first keeps the `output/` directory listing free of
    /// partially-removed trees if deletion is interrupted.
    pub fn purge_output(&self, id: &str) -> Result<(), GateFsError> {
        let output = self.config.output.join(id);
        if !output.is_dir() {
            return Ok(());
        }
        let dump = self.config.dump.join(id);
        let _ = fs::remove_dir_all(&dump);
        fs::rename(&output, &dump).map_err(|e| GateFsError::io(output, e))?;
        fs::remove_dir_all(&dump).map_err(|e| GateFsError::io(dump, e))
    }
}

#[cfg(test)]
#[path = "gate_tests.rs"]
mod tests;
