use std::collections::HashMap;

use tempfile::tempdir;

use super::*;
use crate::config::DaemonConfig;

fn config_for(root: &std::path::Path) -> DaemonConfig {
    let toml = format!(
        r#"
[daemon]
sleep_time_secs = 5
shutdown_time_secs = 30

[gate]
root = "{}"
"#,
        root.display()
    );
    DaemonConfig::parse(&toml, std::path::Path::new("test.toml")).unwrap()
}

#[test]
fn acquire_lock_creates_the_gate_root_and_writes_a_pid() {
    let root = tempdir().unwrap();
    let gate_root = root.path().join("gate");
    let guard = acquire_lock(&gate_root).unwrap();
    assert!(gate_root.is_dir());
    let contents = std::fs::read_to_string(&guard.path).unwrap();
    assert_eq!(contents.trim(), std::process::id().to_string());
}

#[test]
fn a_second_lock_attempt_fails_while_the_first_is_held() {
    let root = tempdir().unwrap();
    let gate_root = root.path().join("gate");
    let _first = acquire_lock(&gate_root).unwrap();
    let second = acquire_lock(&gate_root);
    assert!(matches!(second, Err(LifecycleError::AlreadyRunning(_))));
}

#[test]
fn dropping_the_guard_releases_the_lock_file() {
    let root = tempdir().unwrap();
    let gate_root = root.path().join("gate");
    let guard = acquire_lock(&gate_root).unwrap();
    let path = guard.path.clone();
    drop(guard);
    assert!(!path.exists());
    // A fresh acquire now succeeds.
    let _reacquired = acquire_lock(&gate_root).unwrap();
}

#[test]
fn startup_creates_every_gate_directory() {
    let root = tempdir().unwrap();
    let config = config_for(root.path());
    let manager = startup(&config, HashMap::new()).unwrap();
    assert_eq!(manager.job_count(), 0);
    for dir in [
        &config.gate.jobs,
        &config.gate.waiting,
        &config.gate.output,
        &config.gate.dump,
    ] {
        assert!(dir.is_dir());
    }
}
