// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors an adapter call may raise. These are fatal for the job that
/// triggered them — the caller turns them into `job.die(...)`.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("scheduler {scheduler} rejected job {job_id}: {reason}")]
    Rejected {
        scheduler: String,
        job_id: String,
        reason: String,
    },

    #[error("scheduler {scheduler} I/O failure: {source}")]
    Io {
        scheduler: String,
        #[source]
        source: std::io::Error,
    },

    #[error("scheduler {0} is unreachable")]
    Unreachable(String),
}
