use std::collections::BTreeMap;
use std::time::Duration;

use jg_adapters::fake::FakeSchedulerAdapter;
use jg_adapters::JobOutcome;
use jg_core::{ExitCode, ExitState, FakeClock, JobId, JobState};
use jg_gatefs::GateConfig;
use jg_validator::schema::Schema;
use jg_validator::ServiceSchema;
use serde_json::json;
use tempfile::TempDir;

use super::*;
use crate::service::{Service, ServiceConfig};

fn gate() -> (TempDir, GateFs) {
    let dir = TempDir::new().unwrap();
    let config = GateConfig::under(dir.path());
    config.ensure_dirs().unwrap();
    (dir, GateFs::new(config))
}

fn schema_for(scheduler: &str) -> ServiceSchema {
    let mut fields = BTreeMap::new();
    fields.insert(
        "CIS_SCHEDULER".to_string(),
        Schema::String {
            default: scheduler.to_string(),
            values: vec![scheduler.to_string()],
        },
    );
    fields
}

fn service_config() -> ServiceConfig {
    ServiceConfig {
        quota_mb: 100,
        job_size_mb: 1,
        min_lifetime: Duration::from_secs(0),
        max_lifetime: Duration::from_secs(0),
        max_runtime: Duration::from_secs(0),
    }
}

fn write_request(gate: &GateFs, id: &str, body: serde_json::Value) {
    let path = gate.config().jobs.join(id);
    std::fs::write(path, body.to_string()).unwrap();
    gate.set_state(id, None, JobState::Waiting).unwrap();
}

fn build_manager(gate: &GateFs, scheduler: Arc<FakeSchedulerAdapter>) -> JobManager {
    build_manager_with_clock(gate, scheduler, Arc::new(FakeClock::new(0)))
}

fn build_manager_with_clock(
    gate: &GateFs,
    scheduler: Arc<FakeSchedulerAdapter>,
    clock: Arc<dyn Clock>,
) -> JobManager {
    let mut registry = ServiceRegistry::new();
    registry.insert("demo", Service::new(service_config(), schema_for("fake")));

    let mut schedulers: HashMap<SchedulerName, Arc<dyn SchedulerAdapter>> = HashMap::new();
    schedulers.insert("fake".to_string(), scheduler);

    JobManager::new(
        gate.clone(),
        schedulers,
        registry,
        clock,
        ManagerConfig {
            sleep_time: Duration::from_secs(1),
            shutdown_time: Duration::from_millis(0),
            cleanup_workers: 2,
        },
    )
}

fn job_state(mgr: &JobManager, id: &str) -> Option<JobState> {
    mgr.jobs.lock().get(id).map(|j| j.state())
}

fn wait_until(mut pred: impl FnMut() -> bool) {
    for _ in 0..400 {
        if pred() {
            return;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    panic!("condition did not become true in time");
}

#[test]
fn check_new_jobs_admits_and_queues_a_validated_request() {
    let (_dir, gate) = gate();
    let fake = Arc::new(FakeSchedulerAdapter::new("fake", gate.config().jobs.join("queue")));
    let mgr = build_manager(&gate, fake.clone());

    write_request(&gate, "demo_job1", json!({"CIS_SCHEDULER": "fake"}));
    mgr.check_new_jobs();

    assert_eq!(job_state(&mgr, "demo_job1"), Some(JobState::Queued));
    assert_eq!(gate.check_state("demo_job1"), Some(JobState::Queued));
    assert_eq!(fake.submitted_ids(), vec![JobId::new("demo_job1")]);
}

#[test]
fn check_new_jobs_kills_a_request_with_unknown_service() {
    let (_dir, gate) = gate();
    let fake = Arc::new(FakeSchedulerAdapter::new("fake", gate.config().jobs.join("queue")));
    let mgr = build_manager(&gate, fake);

    write_request(&gate, "ghost_job1", json!({"CIS_SCHEDULER": "fake"}));
    mgr.check_new_jobs();

    assert_eq!(job_state(&mgr, "ghost_job1"), Some(JobState::Closing));
}

#[test]
fn full_lifecycle_from_submission_through_scheduler_finish_to_done() {
    let (_dir, gate) = gate();
    let queue_path = gate.config().jobs.join("queue");
    std::fs::create_dir_all(&queue_path).unwrap();
    let fake = Arc::new(FakeSchedulerAdapter::new("fake", queue_path.clone()));
    let mgr = build_manager(&gate, fake.clone());

    write_request(&gate, "demo_job1", json!({"CIS_SCHEDULER": "fake"}));
    mgr.check_new_jobs();
    assert_eq!(job_state(&mgr, "demo_job1"), Some(JobState::Queued));

    // Simulate the backend picking the job up: a marker appears in its
    // queue directory, and the next poll reports it running then finished.
    std::fs::write(queue_path.join("demo_job1"), "").unwrap();
    fake.will_update_to(&JobId::new("demo_job1"), JobOutcome::Running);
    mgr.check_running_jobs();
    assert_eq!(job_state(&mgr, "demo_job1"), Some(JobState::Running));

    fake.will_update_to(
        &JobId::new("demo_job1"),
        JobOutcome::Finish {
            message: "exit 0".to_string(),
            exit_state: ExitState::Done,
            exit_code: ExitCode::Success,
        },
    );
    mgr.check_running_jobs();
    assert_eq!(job_state(&mgr, "demo_job1"), Some(JobState::Closing));

    mgr.check_cleanup();
    wait_until(|| job_state(&mgr, "demo_job1") == Some(JobState::Done));
    assert_eq!(gate.check_state("demo_job1"), Some(JobState::Done));
    assert_eq!(fake.finalised_ids(), vec![JobId::new("demo_job1")]);
}

#[test]
fn kill_request_stops_a_queued_job_via_the_scheduler() {
    let (_dir, gate) = gate();
    let fake = Arc::new(FakeSchedulerAdapter::new("fake", gate.config().jobs.join("queue")));
    let mgr = build_manager(&gate, fake.clone());

    write_request(&gate, "demo_job1", json!({"CIS_SCHEDULER": "fake"}));
    mgr.check_new_jobs();
    assert_eq!(job_state(&mgr, "demo_job1"), Some(JobState::Queued));

    std::fs::File::create(gate.config().stop.join("demo_job1")).unwrap();
    mgr.check_job_kill_requests();

    assert_eq!(job_state(&mgr, "demo_job1"), Some(JobState::Closing));
    assert!(!gate.config().stop.join("demo_job1").exists());
}

#[test]
fn kill_request_finishes_a_still_waiting_job_directly() {
    let (_dir, gate) = gate();
    let fake = Arc::new(FakeSchedulerAdapter::new("fake", gate.config().jobs.join("queue")));
    let mgr = build_manager(&gate, fake);

    write_request(&gate, "demo_job1", json!({"CIS_SCHEDULER": "fake"}));
    // Not yet picked up by check_new_jobs: still waiting.
    std::fs::File::create(gate.config().stop.join("demo_job1")).unwrap();
    mgr.check_job_kill_requests();

    assert_eq!(job_state(&mgr, "demo_job1"), Some(JobState::Closing));
}

#[test]
fn check_old_jobs_schedules_removal_once_max_lifetime_elapses() {
    let (_dir, gate) = gate();
    let fake = Arc::new(FakeSchedulerAdapter::new("fake", gate.config().jobs.join("queue")));
    let clock = FakeClock::new(0);
    let mgr = build_manager_with_clock(&gate, fake, Arc::new(clock.clone()));

    {
        let mut registry = mgr.registry.lock();
        let mut cfg = service_config();
        cfg.max_lifetime = Duration::from_secs(60);
        registry.insert("demo", Service::new(cfg, schema_for("fake")));
    }

    std::fs::write(gate.config().jobs.join("demo_job1"), "{}").unwrap();
    std::fs::create_dir_all(gate.output_dir("demo_job1")).unwrap();
    {
        let mut jobs = mgr.jobs.lock();
        let mut job = Job::new(JobId::new("demo_job1"), serde_json::Map::new(), Some(JobState::Waiting));
        job.set_validated("demo".to_string(), BTreeMap::new(), Vec::new());
        job.finish(&gate, "done", ExitState::Done, ExitCode::Success).unwrap();
        job.cleanup(&gate).unwrap();
        job.exit(&gate);
        jobs.insert(job.id().clone(), job);
    }

    clock.advance(Duration::from_secs(120));

    mgr.check_old_jobs();
    assert!(gate.list_delete().unwrap().contains(&"demo_job1".to_string()));
}

#[test]
fn startup_reconciles_service_accounting_for_surviving_output() {
    let (_dir, gate) = gate();
    let fake = Arc::new(FakeSchedulerAdapter::new("fake", gate.config().jobs.join("queue")));
    let mgr = build_manager(&gate, fake);

    write_request(&gate, "demo_job1", json!({"CIS_SCHEDULER": "fake"}));
    std::fs::create_dir_all(gate.output_dir("demo_job1")).unwrap();
    std::fs::write(gate.output_dir("demo_job1").join("result.txt"), "0123456789").unwrap();

    mgr.startup();

    let registry = mgr.registry.lock();
    let service = registry.get("demo").unwrap();
    assert_eq!(service.real_size(), 10);
}

#[test]
fn shutdown_force_finishes_jobs_still_in_flight() {
    let (_dir, gate) = gate();
    let fake = Arc::new(FakeSchedulerAdapter::new("fake", gate.config().jobs.join("queue")));
    let mgr = build_manager(&gate, fake);

    write_request(&gate, "demo_job1", json!({"CIS_SCHEDULER": "fake"}));
    mgr.check_new_jobs();
    assert_eq!(job_state(&mgr, "demo_job1"), Some(JobState::Queued));

    mgr.shutdown();

    assert_eq!(job_state(&mgr, "demo_job1"), Some(JobState::Killed));
}
