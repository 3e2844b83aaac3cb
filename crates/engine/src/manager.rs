// SPDX-License-Identifier: MIT

//! The control loop: six per-tick steps plus startup and shutdown, driving
//! every `Job` through the filesystem-mediated gate.
//!
//! Each `check_*` step isolates both per-job failures (logged, the job dies
//! or is skipped) and step-level failures (a directory listing error skips
//! the whole step for this tick) — nothing here ever propagates an error
//! out of `tick()`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use jg_adapters::{JobOutcome, JobView, SchedulerAdapter, SchedulerName};
use jg_core::{Clock, ExitCode, ExitState, JobId, JobState};
use jg_gatefs::GateFs;
use parking_lot::Mutex;
use serde_json::{Map, Value};

use crate::gc::{collect_garbage, epoch_ms};
use crate::job::Job;
use crate::service::ServiceRegistry;
use crate::warn_limiter::{WarnLimiter, WarnOutcome};

/// Tunables that don't belong to any one service: tick cadence, shutdown
/// grace period, and the cleanup worker pool's bound.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    pub sleep_time: Duration,
    pub shutdown_time: Duration,
    pub cleanup_workers: usize,
}

/// Owns the job index, the service registry, and every registered scheduler
/// adapter; drives them through one tick of the control loop at a time.
pub struct JobManager {
    gate: GateFs,
    schedulers: HashMap<SchedulerName, Arc<dyn SchedulerAdapter>>,
    registry: Mutex<ServiceRegistry>,
    jobs: Arc<Mutex<HashMap<JobId, Job>>>,
    clock: Arc<dyn Clock>,
    config: ManagerConfig,
    paused: AtomicBool,
    warn_limiters: Mutex<HashMap<String, WarnLimiter>>,
    cleanup_pool: CleanupPool,
}

impl JobManager {
    pub fn new(
        gate: GateFs,
        schedulers: HashMap<SchedulerName, Arc<dyn SchedulerAdapter>>,
        registry: ServiceRegistry,
        clock: Arc<dyn Clock>,
        config: ManagerConfig,
    ) -> Self {
        let cleanup_pool = CleanupPool::new(config.cleanup_workers);
        Self {
            gate,
            schedulers,
            registry: Mutex::new(registry),
            jobs: Arc::new(Mutex::new(HashMap::new())),
            clock,
            config,
            paused: AtomicBool::new(false),
            warn_limiters: Mutex::new(HashMap::new()),
            cleanup_pool,
        }
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Number of jobs currently tracked in memory. Used by the daemon binary
    /// for a coarse liveness log line.
    pub fn job_count(&self) -> usize {
        self.jobs.lock().len()
    }

    /// Enumerate `jobs/`, reconstruct each `Job`, re-validate it, reconcile
    /// service accounting for jobs with surviving output, and compact
    /// terminal jobs.
    pub fn startup(&self) {
        let ids = match self.gate.list_jobs() {
            Ok(ids) => ids,
            Err(e) => {
                tracing::error!(error = %e, "unable to read jobs directory at startup");
                return;
            }
        };

        for id in ids {
            if !self.ensure_job(&id) {
                continue;
            }

            {
                let mut jobs = self.jobs.lock();
                if let Some(job) = jobs.get_mut(id.as_str()) {
                    self.validate_job(job);
                }
            }

            let service_name = {
                let jobs = self.jobs.lock();
                jobs.get(id.as_str())
                    .and_then(|j| j.service().map(str::to_string))
            };
            if let Some(service_name) = service_name {
                let output = self.gate.output_dir(&id);
                if output.is_dir() {
                    let size = self.gate.dir_size(&output);
                    let mut registry = self.registry.lock();
                    if let Some(service) = registry.get_mut(&service_name) {
                        service.update_job(size);
                    }
                }
            }

            let mut jobs = self.jobs.lock();
            if let Some(job) = jobs.get_mut(id.as_str()) {
                if job.state().is_terminal() {
                    job.compact();
                }
            }
        }

        tracing::info!(jobs = self.job_count(), "startup reconciliation complete");
    }

    /// Run the six control-loop steps once, in a fixed order. `check_new_jobs`
    /// is skipped while paused.
    pub fn tick(&self) {
        if !self.is_paused() {
            self.check_new_jobs();
        }
        self.check_running_jobs();
        self.check_job_kill_requests();
        self.check_cleanup();
        self.check_old_jobs();
        self.check_deleted_jobs();
    }

    /// Two-phase graceful shutdown: stop/kill everything not already
    /// terminal, wait `shutdown_time` for schedulers to react, run
    /// one more cleanup pass, then force-finish and force-exit whatever is
    /// still alive before joining outstanding cleanup workers.
    pub fn shutdown(&self) {
        let ids: Vec<JobId> = {
            let jobs = self.jobs.lock();
            jobs.keys().cloned().collect()
        };

        for id in &ids {
            self.shutdown_stop_or_finish(id, false);
        }

        std::thread::sleep(self.config.shutdown_time);
        self.check_cleanup();

        for id in &ids {
            self.shutdown_stop_or_finish(id, true);
        }

        self.cleanup_pool.join_all();
        tracing::info!("shutdown complete");
    }

    fn shutdown_stop_or_finish(&self, id: &JobId, force_exit: bool) {
        let state = {
            let jobs = self.jobs.lock();
            jobs.get(id.as_str()).map(|j| j.state())
        };
        match state {
            None | Some(JobState::Done | JobState::Failed | JobState::Aborted | JobState::Killed) => {}
            Some(JobState::Running | JobState::Queued) if !force_exit => {
                if let Some((view, scheduler)) = self.job_view_and_scheduler(id.as_str()) {
                    match scheduler.stop(&view, "Server shutdown", ExitCode::Shutdown) {
                        Ok(outcome) => {
                            let mut jobs = self.jobs.lock();
                            apply_outcome(&mut jobs, &self.gate, &view.id, outcome);
                        }
                        Err(e) => tracing::error!(job = %id, error = %e, "shutdown stop failed"),
                    }
                }
            }
            Some(_) => {
                let mut jobs = self.jobs.lock();
                if let Some(job) = jobs.get_mut(id.as_str()) {
                    if job.finish(&self.gate, "Server shutdown", ExitState::Killed, ExitCode::Shutdown).is_ok()
                        && force_exit
                    {
                        job.exit(&self.gate);
                    }
                }
            }
        }
    }

    /// Admit waiting jobs, subject to per-service quota.
    pub fn check_new_jobs(&self) {
        let ids = match self.gate.list_waiting() {
            Ok(ids) => ids,
            Err(e) => {
                tracing::error!(error = %e, "unable to read waiting queue");
                return;
            }
        };

        for id in ids {
            if !self.ensure_job(&id) {
                continue;
            }

            let validated = {
                let mut jobs = self.jobs.lock();
                match jobs.get_mut(id.as_str()) {
                    Some(job) => self.validate_job(job),
                    None => continue,
                }
            };
            if !validated {
                continue;
            }

            let service_name = {
                let jobs = self.jobs.lock();
                jobs.get(id.as_str())
                    .and_then(|j| j.service().map(str::to_string))
            };
            let Some(service_name) = service_name else {
                continue;
            };

            let gc_ok = {
                let mut registry = self.registry.lock();
                let Some(service) = registry.get_mut(&service_name) else {
                    tracing::error!(service = %service_name, "unknown service during quota check");
                    continue;
                };
                let jobs = self.jobs.lock();
                collect_garbage(
                    &self.gate,
                    service,
                    jobs.values().filter(|j| j.service() == Some(service_name.as_str())),
                    self.clock.as_ref(),
                    false,
                )
            };

            if !gc_ok {
                let current_size = {
                    let registry = self.registry.lock();
                    registry.get(&service_name).map(|s| s.current_size()).unwrap_or(0)
                };
                let mut warn_limiters = self.warn_limiters.lock();
                let limiter = warn_limiters
                    .entry(service_name.clone())
                    .or_insert_with(|| WarnLimiter::new(self.config.sleep_time));
                match limiter.record(current_size) {
                    WarnOutcome::Warn => {
                        tracing::warn!(service = %service_name, "cannot collect garbage, quota exhausted")
                    }
                    WarnOutcome::Escalate => {
                        tracing::error!(service = %service_name, "quota has been exhausted for an extended period")
                    }
                    WarnOutcome::Suppressed => {}
                }
                continue;
            }
            if let Some(limiter) = self.warn_limiters.lock().get_mut(&service_name) {
                limiter.reset();
            }

            match self.submit(id.as_str()) {
                Ok(true) => {
                    let mut jobs = self.jobs.lock();
                    if let Some(job) = jobs.get_mut(id.as_str()) {
                        if let Err(e) = job.queue(&self.gate) {
                            tracing::error!(job = %id, error = %e, "cannot queue job");
                        } else {
                            let mut registry = self.registry.lock();
                            if let Some(service) = registry.get_mut(&service_name) {
                                service.add_job_proxy(job.id().clone());
                            }
                        }
                    }
                }
                Ok(false) => {
                    // Backend temporarily unable to accept the job; retry next tick.
                }
                Err(e) => {
                    let mut jobs = self.jobs.lock();
                    if let Some(job) = jobs.get_mut(id.as_str()) {
                        job.die(&self.gate, format!("cannot submit job: {e}"), ExitCode::Abort);
                    }
                }
            }
        }
    }

    /// Poll each scheduler's live jobs for state changes.
    pub fn check_running_jobs(&self) {
        for (name, scheduler) in &self.schedulers {
            let entries = match std::fs::read_dir(scheduler.queue_path()) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::error!(scheduler = %name, error = %e, "unable to read scheduler queue directory");
                    continue;
                }
            };

            let ids: Vec<String> = entries
                .flatten()
                .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
                .collect();

            let mut views = Vec::new();
            {
                let mut jobs = self.jobs.lock();
                for id in &ids {
                    let state = jobs.get(id.as_str()).map(|j| j.state());
                    match state {
                        None => {
                            tracing::error!(job = %id, scheduler = %name, "job in scheduler queue missing from index");
                            let _ = std::fs::remove_file(scheduler.queue_path().join(id));
                        }
                        Some(JobState::Closing | JobState::Cleanup) => {}
                        Some(JobState::Running | JobState::Queued) => {
                            if let Some(job) = jobs.get(id.as_str()) {
                                if let Some(view) = job_view(job) {
                                    views.push(view);
                                }
                            }
                        }
                        Some(other) => {
                            if let Some(job) = jobs.get_mut(id.as_str()) {
                                job.die(
                                    &self.gate,
                                    format!("job state {other} not valid while held by a scheduler"),
                                    ExitCode::Abort,
                                );
                            }
                        }
                    }
                }
            }

            if views.is_empty() {
                continue;
            }

            match scheduler.update(&views) {
                Ok(outcomes) => {
                    let mut jobs = self.jobs.lock();
                    for (id, outcome) in outcomes {
                        apply_outcome(&mut jobs, &self.gate, &id, outcome);
                    }
                }
                Err(e) => tracing::error!(scheduler = %name, error = %e, "adapter update failed"),
            }
        }
    }

    /// Handle user-requested kills.
    pub fn check_job_kill_requests(&self) {
        let ids = match self.gate.list_stop() {
            Ok(ids) => ids,
            Err(e) => {
                tracing::error!(error = %e, "unable to read stop-request directory");
                return;
            }
        };

        for id in ids {
            if !self.ensure_job(&id) {
                continue;
            }
            let state = {
                let jobs = self.jobs.lock();
                jobs.get(id.as_str()).map(|j| j.state())
            };

            match state {
                Some(JobState::Running | JobState::Queued) => {
                    if let Some((view, scheduler)) = self.job_view_and_scheduler(&id) {
                        match scheduler.stop(&view, "User request", ExitCode::UserKill) {
                            Ok(outcome) => {
                                let mut jobs = self.jobs.lock();
                                apply_outcome(&mut jobs, &self.gate, &view.id, outcome);
                            }
                            Err(e) => {
                                let mut jobs = self.jobs.lock();
                                if let Some(job) = jobs.get_mut(id.as_str()) {
                                    job.die(&self.gate, format!("stop request failed: {e}"), ExitCode::Abort);
                                }
                            }
                        }
                    }
                }
                Some(JobState::Waiting) => {
                    let mut jobs = self.jobs.lock();
                    if let Some(job) = jobs.get_mut(id.as_str()) {
                        if let Err(e) = job.finish(&self.gate, "User request", ExitState::Killed, ExitCode::UserKill) {
                            tracing::error!(job = %id, error = %e, "cannot kill waiting job");
                        }
                    }
                }
                Some(_) => tracing::warn!(job = %id, "kill requested but job already finished"),
                None => {}
            }

            if let Err(e) = self.gate.remove_stop_mark(&id) {
                tracing::error!(job = %id, error = %e, "cannot remove kill mark");
            }
        }
    }

    /// Dispatch jobs that have reached `closing` to a cleanup worker.
    pub fn check_cleanup(&self) {
        let ids = match self.gate.list_closing() {
            Ok(ids) => ids,
            Err(e) => {
                tracing::error!(error = %e, "unable to read closing directory");
                return;
            }
        };

        for id in ids {
            if !self.ensure_job(&id) {
                continue;
            }

            let exit_state = {
                let jobs = self.jobs.lock();
                jobs.get(id.as_str()).and_then(|j| j.exit_state())
            };
            let Some(exit_state) = exit_state else {
                let mut jobs = self.jobs.lock();
                if let Some(job) = jobs.get_mut(id.as_str()) {
                    job.die(&self.gate, "closing state reached with no exit_state set", ExitCode::Abort);
                }
                continue;
            };

            let has_valid_data = {
                let jobs = self.jobs.lock();
                jobs.get(id.as_str()).map(|j| j.valid_data().is_some())
            };
            if has_valid_data == Some(false) {
                let mut jobs = self.jobs.lock();
                if let Some(job) = jobs.get_mut(id.as_str()) {
                    if exit_state == ExitState::Aborted {
                        job.exit(&self.gate);
                    } else {
                        job.die(
                            &self.gate,
                            format!("\"{exit_state}\" exit state set with no validated input data"),
                            ExitCode::Abort,
                        );
                    }
                }
                continue;
            }

            let Some((view, scheduler)) = self.job_view_and_scheduler(&id) else {
                let mut jobs = self.jobs.lock();
                if let Some(job) = jobs.get_mut(id.as_str()) {
                    job.die(&self.gate, "no scheduler available for cleanup", ExitCode::Abort);
                }
                continue;
            };

            {
                let mut jobs = self.jobs.lock();
                if let Some(job) = jobs.get_mut(id.as_str()) {
                    if let Err(e) = job.cleanup(&self.gate) {
                        tracing::error!(job = %id, error = %e, "cannot enter cleanup state");
                        continue;
                    }
                }
            }

            self.spawn_cleanup_worker(view, scheduler, exit_state);
        }
    }

    /// Age out long-lived jobs and reap finished cleanup workers.
    pub fn check_old_jobs(&self) {
        let ids = match self.gate.list_jobs() {
            Ok(ids) => ids,
            Err(e) => {
                tracing::error!(error = %e, "unable to read jobs directory");
                return;
            }
        };

        for id in ids {
            if !self.ensure_job(&id) {
                continue;
            }

            let (state, service_name) = {
                let jobs = self.jobs.lock();
                match jobs.get(id.as_str()) {
                    Some(job) => (job.state(), job.service().map(str::to_string)),
                    None => continue,
                }
            };
            let Some(service_name) = service_name else {
                continue;
            };

            let (max_lifetime, max_runtime) = {
                let registry = self.registry.lock();
                match registry.get(&service_name) {
                    Some(service) => (service.config.max_lifetime, service.config.max_runtime),
                    None => continue,
                }
            };

            let (limit, path) = match state {
                JobState::Done | JobState::Failed => (max_lifetime, self.gate.output_dir(&id)),
                JobState::Killed | JobState::Aborted => {
                    let output = self.gate.output_dir(&id);
                    if output.is_dir() {
                        (max_lifetime, output)
                    } else {
                        (max_lifetime, self.gate.config().jobs.join(&id))
                    }
                }
                JobState::Running => (max_runtime, self.gate.config().running.join(&id)),
                _ => continue,
            };

            if limit.is_zero() {
                continue;
            }

            let ctime = match self.gate.created_at(&path) {
                Ok(t) => t,
                Err(e) => {
                    tracing::error!(job = %id, error = %e, "unable to read job change time");
                    continue;
                }
            };
            let age_ms = self.clock.epoch_ms().saturating_sub(epoch_ms(ctime));
            if Duration::from_millis(age_ms) > limit {
                tracing::info!(job = %id, "job reached its storage time limit, scheduling removal");
                let jobs = self.jobs.lock();
                if let Some(job) = jobs.get(id.as_str()) {
                    if let Err(e) = job.delete(&self.gate) {
                        tracing::error!(job = %id, error = %e, "cannot mark job for removal");
                    }
                }
            }
        }

        let reaped = self.cleanup_pool.reap();
        if reaped > 0 {
            tracing::debug!(count = reaped, "reaped finished cleanup workers");
        }
    }

    /// Physically remove jobs marked for deletion, lagging by one tick
    /// behind `collect_garbage`'s `delete/<id>` marks.
    pub fn check_deleted_jobs(&self) {
        let ids = match self.gate.list_delete() {
            Ok(ids) => ids,
            Err(e) => {
                tracing::error!(error = %e, "unable to read delete directory");
                return;
            }
        };

        for id in ids {
            if !self.ensure_job(&id) {
                continue;
            }

            let state = {
                let jobs = self.jobs.lock();
                jobs.get(id.as_str()).map(|j| j.state())
            };
            match state {
                Some(JobState::Running | JobState::Queued) => {
                    if let Some((view, scheduler)) = self.job_view_and_scheduler(&id) {
                        match scheduler.stop(&view, "User request", ExitCode::Delete) {
                            Ok(outcome) => {
                                let mut jobs = self.jobs.lock();
                                apply_outcome(&mut jobs, &self.gate, &view.id, outcome);
                            }
                            Err(e) => {
                                let mut jobs = self.jobs.lock();
                                if let Some(job) = jobs.get_mut(id.as_str()) {
                                    job.die(&self.gate, format!("stop-before-delete failed: {e}"), ExitCode::Abort);
                                }
                            }
                        }
                    }
                    continue;
                }
                Some(JobState::Cleanup) => continue,
                _ => {}
            }

            if let Err(e) = self.gate.remove_job_files(&id) {
                tracing::error!(job = %id, error = %e, "cannot remove job files");
            }

            let size = {
                let mut jobs = self.jobs.lock();
                jobs.get_mut(id.as_str()).map(|job| {
                    job.calculate_size(&self.gate);
                    job.size()
                })
            };

            let service_name = {
                let jobs = self.jobs.lock();
                jobs.get(id.as_str()).and_then(|j| j.service().map(str::to_string))
            };

            match self.gate.purge_output(&id) {
                Ok(()) => {
                    if let (Some(service_name), Some(size)) = (service_name, size) {
                        let mut registry = self.registry.lock();
                        if let Some(service) = registry.get_mut(&service_name) {
                            service.remove_job(size);
                        }
                    }
                }
                Err(e) => tracing::error!(job = %id, error = %e, "cannot remove job output"),
            }

            if let Err(e) = self.gate.remove_delete_mark(&id) {
                tracing::error!(job = %id, error = %e, "cannot remove delete mark");
            }

            self.jobs.lock().remove(id.as_str());
            tracing::info!(job = %id, "job removed with all data");
        }
    }

    /// Look up a job already in memory, or construct it lazily from
    /// `jobs/<id>` and `opts/<id>`. Returns `false` on a read failure,
    /// logging it as a queue entry with no backing request.
    fn ensure_job(&self, id: &str) -> bool {
        {
            let jobs = self.jobs.lock();
            if jobs.contains_key(id) {
                return true;
            }
        }

        let state = self.gate.check_state(id);
        let data = match self.gate.read_request(id) {
            Ok(data) => data,
            Err(e) => {
                tracing::error!(job = %id, error = %e, "cannot read job request, treating as zombie");
                return false;
            }
        };

        let mut job = Job::new(JobId::new(id), data, state);
        if let Some(record) = self.gate.read_opts(id) {
            job.restore_exit_state(record);
        }

        self.jobs.lock().insert(job.id().clone(), job);
        true
    }

    /// Resolve the service named by the job's request body, validate against
    /// its schema, and record the result on the job.
    fn validate_job(&self, job: &mut Job) -> bool {
        let Some(data) = job.data().cloned() else {
            return false;
        };

        let Some(service_name) = resolve_service_name(job.id().as_str(), &data) else {
            job.die(&self.gate, "cannot determine service for job", ExitCode::Abort);
            return false;
        };

        let mut body = data;
        body.remove("service");
        let chain = match body.remove("chain") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str())
                .map(JobId::new)
                .collect(),
            _ => Vec::new(),
        };

        let registry = self.registry.lock();
        let Some(service) = registry.get(&service_name) else {
            drop(registry);
            job.die(&self.gate, format!("unknown service: {service_name}"), ExitCode::Abort);
            return false;
        };

        let scheduler_names: Vec<&str> = self.schedulers.keys().map(String::as_str).collect();
        match jg_validator::validate_request(&service.schema, &body, &scheduler_names) {
            Ok(valid_data) => {
                drop(registry);
                job.set_validated(service_name, valid_data, chain);
                true
            }
            Err(e) => {
                drop(registry);
                job.die(&self.gate, format!("validation failed: {e}"), ExitCode::Abort);
                false
            }
        }
    }

    /// `generate_scripts` -> `chain_input_data` -> `submit`, short-circuiting
    /// on the first `false`.
    fn submit(&self, id: &str) -> Result<bool, jg_adapters::SchedulerError> {
        let Some((view, scheduler)) = self.job_view_and_scheduler(id) else {
            return Ok(false);
        };
        if !scheduler.generate_scripts(&view)? {
            return Ok(false);
        }
        if !scheduler.chain_input_data(&view)? {
            return Ok(false);
        }
        scheduler.submit(&view)
    }

    /// Build a `JobView` plus its resolved scheduler adapter for `id`, or
    /// `None` if the job, its validated data, or its scheduler isn't
    /// available (a zombie queue entry, or a race with compaction).
    fn job_view_and_scheduler(&self, id: &str) -> Option<(JobView, Arc<dyn SchedulerAdapter>)> {
        let jobs = self.jobs.lock();
        let job = jobs.get(id)?;
        let view = job_view(job)?;
        let scheduler_name = view.valid_data.get("CIS_SCHEDULER")?.as_str()?.to_string();
        let scheduler = self.schedulers.get(&scheduler_name)?.clone();
        Some((view, scheduler))
    }

    fn spawn_cleanup_worker(&self, view: JobView, scheduler: Arc<dyn SchedulerAdapter>, exit_state: ExitState) {
        let jobs = Arc::clone(&self.jobs);
        let gate = self.gate.clone();
        let id = view.id.clone();
        self.cleanup_pool.spawn(move || {
            let result = if exit_state == ExitState::Aborted {
                scheduler.abort(&view)
            } else {
                scheduler.finalise(&view)
            };
            if let Err(e) = result {
                tracing::error!(job = %id, error = %e, "cleanup worker failed");
            }
            let mut jobs = jobs.lock();
            if let Some(job) = jobs.get_mut(id.as_str()) {
                job.exit(&gate);
            }
        });
    }
}

/// Determine the service a raw request targets.
///
/// An explicit top-level `"service"` string field takes priority; absent
/// that, the id's prefix up to (not including) its first `_` names the
/// service (e.g. `AppFlexpart_<suffix>`). This key (and `"chain"`, the
/// job-chaining field) is stripped from the body before schema validation,
/// since `validate_request` rejects unknown top-level keys (see DESIGN.md
/// for the reasoning behind this convention).
fn resolve_service_name(id: &str, data: &Map<String, Value>) -> Option<String> {
    if let Some(Value::String(s)) = data.get("service") {
        if !s.is_empty() {
            return Some(s.clone());
        }
    }
    let prefix = id.split('_').next()?;
    if prefix.is_empty() {
        None
    } else {
        Some(prefix.to_string())
    }
}

fn job_view(job: &Job) -> Option<JobView> {
    Some(JobView {
        id: job.id().clone(),
        service: job.service()?.to_string(),
        valid_data: job.valid_data()?.clone(),
        chain: job.chain().to_vec(),
    })
}

fn apply_outcome(jobs: &mut HashMap<JobId, Job>, gate: &GateFs, id: &JobId, outcome: JobOutcome) {
    let Some(job) = jobs.get_mut(id.as_str()) else {
        return;
    };
    match outcome {
        JobOutcome::Unchanged => {}
        JobOutcome::Running => {
            if let Err(e) = job.run(gate) {
                tracing::error!(job = %id, error = %e, "unable to mark job as running");
            }
        }
        JobOutcome::Finish { message, exit_state, exit_code } => {
            if let Err(e) = job.finish(gate, message, exit_state, exit_code) {
                tracing::error!(job = %id, error = %e, "unable to finish job after adapter update");
            }
        }
    }
}

type CleanupTask = Box<dyn FnOnce() + Send + 'static>;

/// Bounded pool for cleanup work. `spawn` blocks the calling tick if the
/// pool is already at capacity, rather than spawning a thread per job
/// without limit.
struct CleanupPool {
    max: usize,
    handles: Mutex<Vec<std::thread::JoinHandle<()>>>,
}

impl CleanupPool {
    fn new(max: usize) -> Self {
        Self {
            max: max.max(1),
            handles: Mutex::new(Vec::new()),
        }
    }

    fn spawn(&self, task: impl FnOnce() + Send + 'static) {
        self.reap();
        loop {
            let mut handles = self.handles.lock();
            if handles.len() < self.max {
                handles.push(std::thread::spawn(task));
                return;
            }
            drop(handles);
            std::thread::sleep(Duration::from_millis(10));
            self.reap();
        }
    }

    /// Remove finished handles, returning how many were reaped.
    fn reap(&self) -> usize {
        let mut handles = self.handles.lock();
        let before = handles.len();
        handles.retain(|h| !h.is_finished());
        before - handles.len()
    }

    fn join_all(&self) {
        let handles = std::mem::take(&mut *self.handles.lock());
        for handle in handles {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
