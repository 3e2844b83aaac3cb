// SPDX-License-Identifier: MIT

//! Configuration-driven directory layout: every subdirectory path is
//! resolvable relative to a single configured root.

use std::path::{Path, PathBuf};

/// Root paths for every named directory under the gate tree.
///
/// All fields default to `<root>/<name>` but each can be overridden
/// independently via a `gate_path_*` config key per directory.
#[derive(Debug, Clone)]
pub struct GateConfig {
    pub jobs: PathBuf,
    pub opts: PathBuf,
    pub waiting: PathBuf,
    pub queued: PathBuf,
    pub running: PathBuf,
    pub closing: PathBuf,
    pub cleanup: PathBuf,
    pub done: PathBuf,
    pub failed: PathBuf,
    pub aborted: PathBuf,
    pub killed: PathBuf,
    pub exit: PathBuf,
    pub stop: PathBuf,
    pub delete: PathBuf,
    pub output: PathBuf,
    pub dump: PathBuf,
}

impl GateConfig {
    /// Build the default layout: every directory as an immediate child of
    /// `root`.
    pub fn under(root: &Path) -> Self {
        Self {
            jobs: root.join("jobs"),
            opts: root.join("opts"),
            waiting: root.join("waiting"),
            queued: root.join("queued"),
            running: root.join("running"),
            closing: root.join("closing"),
            cleanup: root.join("cleanup"),
            done: root.join("done"),
            failed: root.join("failed"),
            aborted: root.join("aborted"),
            killed: root.join("killed"),
            exit: root.join("exit"),
            stop: root.join("stop"),
            delete: root.join("delete"),
            output: root.join("output"),
            dump: root.join("dump"),
        }
    }

    /// Create every directory named in this layout, idempotently.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        for dir in self.all_dirs() {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    fn all_dirs(&self) -> [&Path; 16] {
        [
            &self.jobs,
            &self.opts,
            &self.waiting,
            &self.queued,
            &self.running,
            &self.closing,
            &self.cleanup,
            &self.done,
            &self.failed,
            &self.aborted,
            &self.killed,
            &self.exit,
            &self.stop,
            &self.delete,
            &self.output,
            &self.dump,
        ]
    }

    /// Path to the directory holding state-marker symlinks for `state`.
    pub fn state_dir(&self, state: jg_core::JobState) -> &Path {
        use jg_core::JobState::*;
        match state {
            Waiting => &self.waiting,
            Queued => &self.queued,
            Running => &self.running,
            Closing => &self.closing,
            Cleanup => &self.cleanup,
            Done => &self.done,
            Failed => &self.failed,
            Aborted => &self.aborted,
            Killed => &self.killed,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
