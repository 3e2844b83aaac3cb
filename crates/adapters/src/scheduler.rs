// SPDX-License-Identifier: MIT

//! The `SchedulerAdapter` contract. Concrete PBS/SSH backends are out of
//! scope; this crate only defines the trait and read-only job snapshots
//! adapters act on.
//!
//! Adapters never get a mutable handle into the engine's `Job` — that would
//! force this crate to depend on `jg-engine`, inverting the dependency the
//! rest of the workspace relies on (`jg-engine` depends on `jg-adapters`,
//! not the other way around). Instead every mutating call returns a
//! [`JobOutcome`] directive that the caller applies to its own `Job` under
//! its own lock. This also lets `finalise`/`abort` cross into worker threads
//! as a plain value rather than a borrowed job handle.

use std::collections::BTreeMap;
use std::path::Path;

use jg_core::{ExitCode, ExitState, JobId, VarValue};

use crate::error::SchedulerError;

/// A named scheduler backend, as registered in `DaemonConfig::config_schedulers`
/// and referenced by a job's `CIS_SCHEDULER` variable.
pub type SchedulerName = String;

/// A read-only, owned snapshot of the job fields an adapter needs. Cloned
/// out of the engine's `Job` at each call site.
#[derive(Debug, Clone)]
pub struct JobView {
    pub id: JobId,
    pub service: String,
    pub valid_data: BTreeMap<String, VarValue>,
    pub chain: Vec<JobId>,
}

/// The directive an adapter hands back after a call that may change a job's
/// lifecycle state. Adapters never get a mutable `Job`, so every transition
/// they can cause is expressed here and applied by the caller under its own
/// lock.
#[derive(Debug, Clone)]
pub enum JobOutcome {
    /// No state change; the job is still progressing.
    Unchanged,
    /// The backend has started executing a previously `queued` job. The
    /// caller should run `job.run()`.
    Running,
    /// The caller should run `job.finish(message, exit_state, exit_code)`.
    Finish {
        message: String,
        exit_state: ExitState,
        exit_code: ExitCode,
    },
}

/// Per-backend hooks the control loop drives jobs through.
pub trait SchedulerAdapter: Send + Sync {
    /// The name this adapter is registered under (matches `CIS_SCHEDULER`).
    fn name(&self) -> &str;

    /// Directory of live scheduler-handle marker files for `check_running_jobs`.
    fn queue_path(&self) -> &Path;

    /// Render submission scripts for `job`. `false` means the job's request
    /// could not be turned into scripts (not a transient condition).
    fn generate_scripts(&self, job: &JobView) -> Result<bool, SchedulerError>;

    /// Stage input data chained from upstream jobs (a job's `chain` field).
    fn chain_input_data(&self, job: &JobView) -> Result<bool, SchedulerError>;

    /// Submit `job` to the backend. `false` means the backend queue is
    /// temporarily full; exceptions are fatal for the job.
    fn submit(&self, job: &JobView) -> Result<bool, SchedulerError>;

    /// Poll the backend for state changes across all live `jobs`. Returns
    /// one outcome per job that changed; jobs not present in the result are
    /// still in flight.
    fn update(&self, jobs: &[JobView]) -> Result<Vec<(JobId, JobOutcome)>, SchedulerError>;

    /// Ask the backend to stop `job`, whether for a user kill request, a
    /// delete request on a live job, or shutdown.
    fn stop(
        &self,
        job: &JobView,
        message: &str,
        exit_code: ExitCode,
    ) -> Result<JobOutcome, SchedulerError>;

    /// Run on a cleanup worker for a normally-finishing job. The job's
    /// `exit_state` was already fixed before cleanup began; this hook only
    /// performs backend-side teardown. The engine calls `job.exit()` itself
    /// once this returns, regardless of outcome.
    fn finalise(&self, job: &JobView) -> Result<(), SchedulerError>;

    /// Run on a cleanup worker for a job whose exit_state is `aborted`.
    fn abort(&self, job: &JobView) -> Result<(), SchedulerError>;
}
