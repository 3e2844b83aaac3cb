// SPDX-License-Identifier: MIT

//! Per-service quota enforcement and garbage collection.

use std::time::{Duration, UNIX_EPOCH};

use jg_core::Clock;
use jg_gatefs::GateFs;

use crate::job::Job;
use crate::service::Service;

/// Check `service`'s quota. If the fast path doesn't clear it, schedule
/// (`job.delete()`) the oldest eligible terminal jobs — belonging to
/// `service`, with an `output/<id>` directory older than `min_lifetime` —
/// until the 80%-of-quota watermark is reached (0% when `full`).
///
/// Returns `true` if the service may accept another job-sized submission
/// after this call, `false` if the 130% hard quota remains breached.
///
/// Physical bytes are not reclaimed here: this only writes `delete/<id>`
/// marks. Reclamation happens in the next `check_deleted_jobs` tick — callers
/// must tolerate that lag.
pub fn collect_garbage<'a>(
    gate: &GateFs,
    service: &mut Service,
    jobs: impl IntoIterator<Item = &'a Job>,
    clock: &dyn Clock,
    full: bool,
) -> bool {
    let job_size = service.config.job_size_bytes();
    let quota = service.config.quota_bytes();

    if !full
        && service.current_size() + job_size < quota
        && service.real_size() < service.config.hard_quota_bytes()
    {
        return true;
    }

    let now_ms = clock.epoch_ms();
    let min_lifetime = service.config.min_lifetime;

    let mut candidates: Vec<(&Job, u64)> = jobs
        .into_iter()
        .filter(|job| job.state().is_terminal())
        .filter_map(|job| {
            let output = gate.output_dir(job.id().as_str());
            let ctime = gate.created_at(&output).ok()?;
            let ctime_ms = epoch_ms(ctime);
            let lifetime_ms = now_ms.saturating_sub(ctime_ms);
            if lifetime_ms < min_lifetime.as_millis() as u64 {
                return None;
            }
            Some((job, lifetime_ms))
        })
        .collect();

    // Oldest (largest lifetime) first.
    candidates.sort_by(|a, b| b.1.cmp(&a.1));

    let watermark = service.config.watermark_bytes(full);
    for (job, _lifetime_ms) in candidates {
        match job.delete(gate) {
            Ok(()) => {
                service.remove_job_proxy(job.id());
                tracing::debug!(job = %job.id(), "garbage collected");
            }
            Err(e) => {
                tracing::warn!(job = %job.id(), error = %e, "unable to schedule job for removal");
            }
        }
        if service.current_size() < watermark {
            break;
        }
    }

    if service.real_size() > service.config.hard_quota_bytes() {
        tracing::error!("hard quota reached for service");
        return false;
    }

    service.current_size() + job_size < quota
}

pub(crate) fn epoch_ms(t: std::time::SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

#[cfg(test)]
#[path = "gc_tests.rs"]
mod tests;
