use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jg_core::{ExitCode, ExitState, FakeClock, JobId, JobState};
use jg_gatefs::GateConfig;
use jg_validator::ServiceSchema;
use serde_json::Map;
use tempfile::TempDir;

use super::*;
use crate::service::ServiceConfig;

fn real_now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}

fn gate() -> (TempDir, GateFs) {
    let dir = TempDir::new().unwrap();
    let config = GateConfig::under(dir.path());
    config.ensure_dirs().unwrap();
    (dir, GateFs::new(config))
}

fn config(quota_mb: u64, job_size_mb: u64, min_lifetime: Duration) -> ServiceConfig {
    ServiceConfig {
        quota_mb,
        job_size_mb,
        min_lifetime,
        max_lifetime: Duration::from_secs(0),
        max_runtime: Duration::from_secs(0),
    }
}

/// Build a terminal job with an `output/<id>` dir on disk, proxied for quota.
fn terminal_job(gate: &GateFs, service: &mut Service, id: &str) -> Job {
    std::fs::create_dir_all(gate.output_dir(id)).unwrap();
    let mut job = Job::new(JobId::new(id), Map::new(), Some(JobState::Waiting));
    job.finish(gate, "done", ExitState::Done, ExitCode::Success)
        .unwrap();
    job.cleanup(gate).unwrap();
    job.exit(gate);
    assert_eq!(job.state(), JobState::Done);
    service.add_job_proxy(job.id().clone());
    job
}

#[test]
fn fast_path_returns_true_under_quota() {
    let (_dir, gate) = gate();
    let mut svc = Service::new(config(100, 20, Duration::from_secs(3600)), ServiceSchema::new());
    let clock = FakeClock::new(real_now_ms());
    assert!(collect_garbage(&gate, &mut svc, std::iter::empty(), &clock, false));
}

#[test]
fn full_sweep_deletes_every_eligible_job_until_watermark() {
    let (_dir, gate) = gate();
    let mut svc = Service::new(config(100, 20, Duration::from_secs(1)), ServiceSchema::new());
    let j1 = terminal_job(&gate, &mut svc, "j1");
    let j2 = terminal_job(&gate, &mut svc, "j2");
    let j3 = terminal_job(&gate, &mut svc, "j3");
    assert_eq!(svc.current_size(), 60 * 1_048_576);

    let clock = FakeClock::new(real_now_ms());
    clock.advance(Duration::from_secs(10));

    let jobs = [&j1, &j2, &j3];
    let ok = collect_garbage(&gate, &mut svc, jobs, &clock, true);
    assert!(ok);
    assert_eq!(svc.current_size(), 0);
    for id in ["j1", "j2", "j3"] {
        assert!(gate.list_delete().unwrap().contains(&id.to_string()));
    }
}

#[test]
fn jobs_younger_than_min_lifetime_are_protected() {
    let (_dir, gate) = gate();
    let mut svc = Service::new(
        config(10, 20, Duration::from_secs(3600)),
        ServiceSchema::new(),
    );
    let j1 = terminal_job(&gate, &mut svc, "j1");

    let clock = FakeClock::new(real_now_ms());
    // Only 1 second old; min_lifetime is an hour, so it must survive.
    clock.advance(Duration::from_secs(1));

    let jobs = [&j1];
    collect_garbage(&gate, &mut svc, jobs, &clock, true);
    assert_eq!(svc.current_size(), 20 * 1_048_576);
    assert!(gate.list_delete().unwrap().is_empty());
}

#[test]
fn hard_quota_breach_blocks_admission_even_after_scheduling_deletes() {
    let (_dir, gate) = gate();
    let mut svc = Service::new(config(10, 5, Duration::from_secs(1)), ServiceSchema::new());
    let j1 = terminal_job(&gate, &mut svc, "j1");
    // real_size only drops once check_deleted_jobs physically removes output;
    // simulate a service that is already over the 130% hard quota.
    svc.update_job(20 * 1_048_576);

    let clock = FakeClock::new(real_now_ms());
    clock.advance(Duration::from_secs(10));

    let jobs = [&j1];
    let ok = collect_garbage(&gate, &mut svc, jobs, &clock, false);
    assert!(!ok);
    assert_eq!(svc.current_size(), 0);
}

#[test]
fn non_terminal_jobs_are_never_candidates() {
    let (_dir, gate) = gate();
    let mut svc = Service::new(config(1, 20, Duration::from_secs(0)), ServiceSchema::new());
    std::fs::create_dir_all(gate.output_dir("j1")).unwrap();
    let mut job = Job::new(JobId::new("j1"), Map::new(), Some(JobState::Waiting));
    job.queue(&gate).unwrap();
    svc.add_job_proxy(job.id().clone());

    let clock = FakeClock::new(real_now_ms());
    clock.advance(Duration::from_secs(10));

    let jobs = [&job];
    collect_garbage(&gate, &mut svc, jobs, &clock, true);
    assert_eq!(svc.current_size(), 20 * 1_048_576);
    assert!(gate.list_delete().unwrap().is_empty());
}
