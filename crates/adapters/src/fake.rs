// SPDX-License-Identifier: MIT

//! A programmable fake scheduler for engine-crate tests (grounded in the
//! teacher's `FakeSession`/`FakeAgentAdapter` pattern).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use jg_core::JobId;
use parking_lot::Mutex;

use crate::error::SchedulerError;
use crate::scheduler::{JobOutcome, JobView, SchedulerAdapter};

/// Scripted responses the fake hands back, keyed by job id.
#[derive(Debug, Default)]
struct Script {
    submit_results: BTreeMap<JobId, Result<bool, String>>,
    update_results: BTreeMap<JobId, JobOutcome>,
    stop_results: BTreeMap<JobId, JobOutcome>,
    finalise_results: BTreeMap<JobId, Result<(), String>>,
    abort_results: BTreeMap<JobId, Result<(), String>>,
}

/// A `SchedulerAdapter` whose every call is scripted ahead of time, and
/// which records every call it received for assertions.
pub struct FakeSchedulerAdapter {
    name: String,
    queue_path: PathBuf,
    script: Mutex<Script>,
    submitted: Mutex<Vec<JobId>>,
    finalised: Mutex<Vec<JobId>>,
    aborted: Mutex<Vec<JobId>>,
}

impl FakeSchedulerAdapter {
    pub fn new(name: impl Into<String>, queue_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            queue_path: queue_path.into(),
            script: Mutex::new(Script::default()),
            submitted: Mutex::new(Vec::new()),
            finalised: Mutex::new(Vec::new()),
            aborted: Mutex::new(Vec::new()),
        }
    }

    pub fn will_accept_submit(&self, id: &JobId) {
        self.script
            .lock()
            .submit_results
            .insert(id.clone(), Ok(true));
    }

    pub fn will_reject_submit_transiently(&self, id: &JobId) {
        self.script
            .lock()
            .submit_results
            .insert(id.clone(), Ok(false));
    }

    pub fn will_fail_submit(&self, id: &JobId, reason: impl Into<String>) {
        self.script
            .lock()
            .submit_results
            .insert(id.clone(), Err(reason.into()));
    }

    pub fn will_update_to(&self, id: &JobId, outcome: JobOutcome) {
        self.script.lock().update_results.insert(id.clone(), outcome);
    }

    pub fn will_start_running(&self, id: &JobId) {
        self.will_update_to(id, JobOutcome::Running);
    }

    pub fn will_stop_with(&self, id: &JobId, outcome: JobOutcome) {
        self.script.lock().stop_results.insert(id.clone(), outcome);
    }

    pub fn will_fail_finalise(&self, id: &JobId, reason: impl Into<String>) {
        self.script
            .lock()
            .finalise_results
            .insert(id.clone(), Err(reason.into()));
    }

    pub fn will_fail_abort(&self, id: &JobId, reason: impl Into<String>) {
        self.script
            .lock()
            .abort_results
            .insert(id.clone(), Err(reason.into()));
    }

    pub fn submitted_ids(&self) -> Vec<JobId> {
        self.submitted.lock().clone()
    }

    pub fn finalised_ids(&self) -> Vec<JobId> {
        self.finalised.lock().clone()
    }

    pub fn aborted_ids(&self) -> Vec<JobId> {
        self.aborted.lock().clone()
    }
}

impl SchedulerAdapter for FakeSchedulerAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn queue_path(&self) -> &Path {
        &self.queue_path
    }

    fn generate_scripts(&self, _job: &JobView) -> Result<bool, SchedulerError> {
        Ok(true)
    }

    fn chain_input_data(&self, _job: &JobView) -> Result<bool, SchedulerError> {
        Ok(true)
    }

    fn submit(&self, job: &JobView) -> Result<bool, SchedulerError> {
        self.submitted.lock().push(job.id.clone());
        match self.script.lock().submit_results.remove(&job.id) {
            Some(Ok(accepted)) => Ok(accepted),
            Some(Err(reason)) => Err(SchedulerError::Rejected {
                scheduler: self.name.clone(),
                job_id: job.id.to_string(),
                reason,
            }),
            None => Ok(true),
        }
    }

    fn update(&self, jobs: &[JobView]) -> Result<Vec<(JobId, JobOutcome)>, SchedulerError> {
        let mut script = self.script.lock();
        let mut out = Vec::new();
        for job in jobs {
            if let Some(outcome) = script.update_results.remove(&job.id) {
                out.push((job.id.clone(), outcome));
            }
        }
        Ok(out)
    }

    fn stop(
        &self,
        job: &JobView,
        message: &str,
        exit_code: jg_core::ExitCode,
    ) -> Result<JobOutcome, SchedulerError> {
        let scripted = self.script.lock().stop_results.remove(&job.id);
        Ok(scripted.unwrap_or(JobOutcome::Finish {
            message: message.to_string(),
            exit_state: jg_core::ExitState::Killed,
            exit_code,
        }))
    }

    fn finalise(&self, job: &JobView) -> Result<(), SchedulerError> {
        self.finalised.lock().push(job.id.clone());
        match self.script.lock().finalise_results.remove(&job.id) {
            Some(Err(reason)) => Err(SchedulerError::Rejected {
                scheduler: self.name.clone(),
                job_id: job.id.to_string(),
                reason,
            }),
            _ => Ok(()),
        }
    }

    fn abort(&self, job: &JobView) -> Result<(), SchedulerError> {
        self.aborted.lock().push(job.id.clone());
        match self.script.lock().abort_results.remove(&job.id) {
            Some(Err(reason)) => Err(SchedulerError::Rejected {
                scheduler: self.name.clone(),
                job_id: job.id.to_string(),
                reason,
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
