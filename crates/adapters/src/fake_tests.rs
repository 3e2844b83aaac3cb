use std::collections::BTreeMap;

use jg_core::{ExitCode, ExitState, JobId};

use super::*;

fn view(id: &str) -> JobView {
    JobView {
        id: JobId::new(id),
        service: "demo".to_string(),
        valid_data: BTreeMap::new(),
        chain: Vec::new(),
    }
}

#[test]
fn submit_defaults_to_accept_when_unscripted() {
    let fake = FakeSchedulerAdapter::new("CIS_SCHEDULER", "/tmp/queue");
    assert!(fake.submit(&view("j1")).unwrap());
    assert_eq!(fake.submitted_ids(), vec![JobId::new("j1")]);
}

#[test]
fn submit_honours_scripted_rejection() {
    let fake = FakeSchedulerAdapter::new("CIS_SCHEDULER", "/tmp/queue");
    let id = JobId::new("j1");
    fake.will_reject_submit_transiently(&id);
    assert!(!fake.submit(&view("j1")).unwrap());
}

#[test]
fn submit_honours_scripted_failure() {
    let fake = FakeSchedulerAdapter::new("CIS_SCHEDULER", "/tmp/queue");
    let id = JobId::new("j1");
    fake.will_fail_submit(&id, "no nodes free");
    let err = fake.submit(&view("j1")).unwrap_err();
    assert!(matches!(err, SchedulerError::Rejected { .. }));
}

#[test]
fn update_only_reports_scripted_jobs() {
    let fake = FakeSchedulerAdapter::new("CIS_SCHEDULER", "/tmp/queue");
    let id = JobId::new("j1");
    fake.will_update_to(
        &id,
        JobOutcome::Finish {
            message: "done".to_string(),
            exit_state: ExitState::Done,
            exit_code: ExitCode::Success,
        },
    );

    let result = fake.update(&[view("j1"), view("j2")]).unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].0, id);
}

#[test]
fn finalise_succeeds_by_default_and_is_recorded() {
    let fake = FakeSchedulerAdapter::new("CIS_SCHEDULER", "/tmp/queue");
    fake.finalise(&view("j1")).unwrap();
    assert_eq!(fake.finalised_ids(), vec![JobId::new("j1")]);
}

#[test]
fn abort_succeeds_by_default_and_is_recorded() {
    let fake = FakeSchedulerAdapter::new("CIS_SCHEDULER", "/tmp/queue");
    fake.abort(&view("j1")).unwrap();
    assert_eq!(fake.aborted_ids(), vec![JobId::new("j1")]);
}

#[test]
fn finalise_honours_scripted_failure() {
    let fake = FakeSchedulerAdapter::new("CIS_SCHEDULER", "/tmp/queue");
    let id = JobId::new("j1");
    fake.will_fail_finalise(&id, "disk full");
    let err = fake.finalise(&view("j1")).unwrap_err();
    assert!(matches!(err, SchedulerError::Rejected { .. }));
}
