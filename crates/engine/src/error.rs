// SPDX-License-Identifier: MIT

use jg_core::{JobId, JobState};
use thiserror::Error;

/// Failures from a single `Job` operation. These are confined to the job
/// that raised them; the control loop never propagates them.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("job {0}: gatefs operation failed: {1}")]
    Gate(JobId, #[source] jg_gatefs::GateFsError),

    #[error("job {id}: cannot mark as killed, currently {state}")]
    NotKillable { id: JobId, state: JobState },

    #[error("job {0}: exit() called with no exit_state set")]
    NoExitState(JobId),
}

/// Failures a whole control-loop step may raise before it can iterate
/// individual jobs — currently only a directory listing failure, which the
/// caller logs and skips for this tick.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("cannot list {0}: {1}")]
    ListDir(std::path::PathBuf, #[source] jg_gatefs::GateFsError),

    #[error("unknown service: {0}")]
    UnknownService(String),

    #[error("unknown scheduler: {0}")]
    UnknownScheduler(String),
}
