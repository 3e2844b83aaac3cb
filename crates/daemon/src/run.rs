// SPDX-License-Identifier: MIT

//! The blocking tick-loop driver: a single main thread runs the control loop
//! sequentially, with no async scheduling. `main.rs` runs this on its own OS
//! thread while the async runtime waits on signals, keeping the synchronous
//! tick loop separate from the daemon's signal handling.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use jg_engine::JobManager;

/// Run `manager.tick()` every `sleep_time`, until `shutdown` is set.
/// Checked both before and after the sleep so a shutdown requested mid-sleep
/// doesn't wait for a full extra tick before returning.
pub fn tick_loop(manager: &JobManager, sleep_time: Duration, shutdown: &AtomicBool) {
    while !shutdown.load(Ordering::SeqCst) {
        manager.tick();
        if shutdown.load(Ordering::SeqCst) {
            break;
        }
        std::thread::sleep(sleep_time);
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
