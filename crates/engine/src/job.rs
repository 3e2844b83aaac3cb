// SPDX-License-Identifier: MIT

//! The per-job entity. Every state transition goes through this type's
//! methods; nothing else in the workspace writes to the job's state
//! symlinks directly.

use std::collections::BTreeMap;

use jg_core::{ExitCode, ExitState, JobId, JobState, VarValue};
use jg_gatefs::{GateFs, OptsRecord};
use serde_json::{Map, Value};

use crate::error::JobError;

#[derive(Debug, Clone)]
pub struct Job {
    id: JobId,
    service: Option<String>,
    data: Option<Map<String, Value>>,
    valid_data: Option<BTreeMap<String, VarValue>>,
    chain: Vec<JobId>,
    state: JobState,
    exit_state: Option<ExitState>,
    exit_code: ExitCode,
    exit_message: String,
    size: u64,
}

impl Job {
    /// Build a job from its freshly-read request body and its current
    /// filesystem state (`None` means not yet placed in any state
    /// directory — the caller is expected to `queue`/`set_state` it).
    pub fn new(id: JobId, data: Map<String, Value>, state: Option<JobState>) -> Self {
        Self {
            id,
            service: None,
            data: Some(data),
            valid_data: None,
            chain: Vec::new(),
            state: state.unwrap_or(JobState::Waiting),
            exit_state: None,
            exit_code: ExitCode::Undefined,
            exit_message: String::new(),
            size: 0,
        }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn exit_state(&self) -> Option<ExitState> {
        self.exit_state
    }

    pub fn exit_code(&self) -> ExitCode {
        self.exit_code
    }

    pub fn exit_message(&self) -> &str {
        &self.exit_message
    }

    pub fn service(&self) -> Option<&str> {
        self.service.as_deref()
    }

    pub fn data(&self) -> Option<&Map<String, Value>> {
        self.data.as_ref()
    }

    pub fn valid_data(&self) -> Option<&BTreeMap<String, VarValue>> {
        self.valid_data.as_ref()
    }

    pub fn chain(&self) -> &[JobId] {
        &self.chain
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Restore a previously-persisted exit triple from `opts/<id>`, used
    /// whenever a `Job` is (re)built from the filesystem — startup
    /// reconciliation, and every lazy construction of an in-memory job from
    /// a directory-listing entry.
    pub fn restore_exit_state(&mut self, record: OptsRecord) {
        self.exit_state = Some(record.exit_state);
        self.exit_code = record.exit_code;
        self.exit_message = record.exit_message;
    }

    /// Recorded by the validator on success.
    pub fn set_validated(
        &mut self,
        service: String,
        valid_data: BTreeMap<String, VarValue>,
        chain: Vec<JobId>,
    ) {
        self.service = Some(service);
        self.valid_data = Some(valid_data);
        self.chain = chain;
    }

    pub fn queue(&mut self, gate: &GateFs) -> Result<(), JobError> {
        self.set_state(gate, JobState::Queued)
    }

    pub fn run(&mut self, gate: &GateFs) -> Result<(), JobError> {
        self.set_state(gate, JobState::Running)
    }

    pub fn cleanup(&mut self, gate: &GateFs) -> Result<(), JobError> {
        self.set_state(gate, JobState::Cleanup)
    }

    /// Create the `delete/<id>` mark. Actual removal happens in
    /// `check_deleted_jobs`.
    pub fn delete(&self, gate: &GateFs) -> Result<(), JobError> {
        gate.create_delete_mark(self.id.as_str())
            .map_err(|e| JobError::Gate(self.id.clone(), e))
    }

    /// Mark as killed by the user. Only valid while the job hasn't already
    /// finished.
    pub fn mark(
        &mut self,
        gate: &GateFs,
        message: impl Into<String>,
        exit_code: ExitCode,
    ) -> Result<(), JobError> {
        if !matches!(
            self.state,
            JobState::Waiting | JobState::Queued | JobState::Running
        ) {
            return Err(JobError::NotKillable {
                id: self.id.clone(),
                state: self.state,
            });
        }
        self.set_exit_state(gate, message, ExitState::Killed, exit_code)
    }

    /// Set the exit state and move the job to `closing`.
    pub fn finish(
        &mut self,
        gate: &GateFs,
        message: impl Into<String>,
        exit_state: ExitState,
        exit_code: ExitCode,
    ) -> Result<(), JobError> {
        self.set_exit_state(gate, message, exit_state, exit_code)?;
        self.set_state(gate, JobState::Closing)
    }

    /// Abort further processing. Logs, then tries `finish(..., Aborted,
    /// ...)`; if that itself fails, forces the in-memory state to `aborted`
    /// without touching the filesystem.
    pub fn die(&mut self, gate: &GateFs, message: impl Into<String>, exit_code: ExitCode) {
        let message = message.into();
        tracing::error!(job = %self.id, %message, "job died");
        if let Err(e) = self.finish(gate, message, ExitState::Aborted, exit_code) {
            tracing::error!(job = %self.id, error = %e, "unable to mark job for finalise step");
            self.state = JobState::Aborted;
        }
    }

    /// Finalise cleanup: write the exit file and switch the state symlink to
    /// the recorded exit state. Only valid after `finish()`. Best-effort:
    /// logs and moves on rather than propagating an error the caller has no
    /// job-specific way to act on.
    pub fn exit(&mut self, gate: &GateFs) {
        let Some(exit_state) = self.exit_state else {
            self.die(gate, "exit status is not defined", ExitCode::Abort);
            return;
        };

        if let Err(e) = self.set_state(gate, exit_state.as_job_state()) {
            tracing::error!(job = %self.id, error = %e, "cannot switch to exit state");
        }
        if let Err(e) = gate.write_exit(self.id.as_str(), &self.exit_message) {
            tracing::error!(job = %self.id, error = %e, "cannot write exit status file");
        }
        tracing::info!(job = %self.id, state = %self.state, "job finished");
    }

    /// Measure bytes under `output/<id>`. Only meaningful once the job could
    /// have produced output.
    pub fn calculate_size(&mut self, gate: &GateFs) {
        if !matches!(
            self.state,
            JobState::Cleanup | JobState::Done | JobState::Failed | JobState::Killed | JobState::Aborted
        ) {
            self.size = 0;
            return;
        }
        self.size = gate.dir_size(&gate.output_dir(self.id.as_str()));
    }

    /// Release `data`/`valid_data` to reduce memory for long-lived terminal
    /// jobs.
    pub fn compact(&mut self) {
        self.data = None;
        self.valid_data = None;
    }

    fn set_state(&mut self, gate: &GateFs, new: JobState) -> Result<(), JobError> {
        if self.state == new {
            return Ok(());
        }
        gate.set_state(self.id.as_str(), Some(self.state), new)
            .map_err(|e| JobError::Gate(self.id.clone(), e))?;
        self.state = new;
        Ok(())
    }

    /// Apply the sticky-priority rule, then persist the triple to
    /// `opts/<id>`. A persistence failure is fatal unless the exit state is
    /// already `aborted`.
    fn set_exit_state(
        &mut self,
        gate: &GateFs,
        message: impl Into<String>,
        new_state: ExitState,
        exit_code: ExitCode,
    ) -> Result<(), JobError> {
        if let Some(current) = self.exit_state {
            if !current.may_transition_to(new_state) {
                return Ok(());
            }
        }

        self.exit_state = Some(new_state);
        self.exit_code = exit_code;
        self.exit_message.push_str(&format!(
            "{}:{} {}\n",
            new_state.titlecase(),
            exit_code,
            message.into()
        ));

        let record = OptsRecord {
            exit_state: new_state,
            exit_code,
            exit_message: self.exit_message.clone(),
        };
        match gate.write_opts(self.id.as_str(), &record) {
            Ok(()) => Ok(()),
            Err(e) if new_state == ExitState::Aborted => {
                tracing::error!(job = %self.id, error = %e, "unable to store job internal state");
                Ok(())
            }
            Err(e) => Err(JobError::Gate(self.id.clone(), e)),
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
