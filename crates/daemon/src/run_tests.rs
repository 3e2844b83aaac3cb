use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use jg_core::SystemClock;
use jg_engine::{JobManager, ManagerConfig, ServiceRegistry};
use jg_gatefs::{GateConfig, GateFs};
use tempfile::tempdir;

use super::*;

fn manager(root: &std::path::Path) -> JobManager {
    let config = GateConfig::under(root);
    config.ensure_dirs().unwrap();
    JobManager::new(
        GateFs::new(config),
        HashMap::new(),
        ServiceRegistry::new(),
        Arc::new(SystemClock),
        ManagerConfig {
            sleep_time: Duration::from_millis(1),
            shutdown_time: Duration::from_millis(1),
            cleanup_workers: 1,
        },
    )
}

#[test]
fn returns_immediately_when_shutdown_is_already_set() {
    let root = tempdir().unwrap();
    let manager = manager(root.path());
    let shutdown = AtomicBool::new(true);
    tick_loop(&manager, Duration::from_secs(60), &shutdown);
    // If this test completes at all, the loop did not sleep a full minute.
}

#[test]
fn ticks_at_least_once_before_observing_shutdown() {
    let root = tempdir().unwrap();
    let manager = manager(root.path());
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(20));
        flag.store(true, Ordering::SeqCst);
    });
    tick_loop(&manager, Duration::from_millis(1), &shutdown);
    assert_eq!(manager.job_count(), 0);
}
