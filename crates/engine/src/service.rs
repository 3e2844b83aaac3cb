// SPDX-License-Identifier: MIT

//! Per-service configuration and quota accounting.

use std::collections::BTreeMap;
use std::time::Duration;

use jg_core::JobId;
use jg_validator::ServiceSchema;

const BYTES_PER_MB: u64 = 1_048_576;

/// Quota and lifetime policy for one service, read from the daemon config
/// file: `quota`, `job_size`, `min_lifetime`, `max_lifetime`, `max_runtime`.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub quota_mb: u64,
    pub job_size_mb: u64,
    pub min_lifetime: Duration,
    pub max_lifetime: Duration,
    pub max_runtime: Duration,
}

impl ServiceConfig {
    pub fn quota_bytes(&self) -> u64 {
        self.quota_mb * BYTES_PER_MB
    }

    pub fn job_size_bytes(&self) -> u64 {
        self.job_size_mb * BYTES_PER_MB
    }

    /// 1.3x quota: the hard ceiling above which no new job is admitted.
    pub fn hard_quota_bytes(&self) -> u64 {
        self.quota_bytes() * 13 / 10
    }

    /// 0.8x quota: the garbage-collection watermark, unless a full sweep is
    /// requested, in which case the target is 0.
    pub fn watermark_bytes(&self, full: bool) -> u64 {
        if full {
            0
        } else {
            self.quota_bytes() * 8 / 10
        }
    }
}

/// A named service: its schema plus running quota accounting.
#[derive(Debug, Clone)]
pub struct Service {
    pub config: ServiceConfig,
    pub schema: ServiceSchema,
    /// Sum of `job_size` estimates for every job currently proxied, keyed by
    /// job id so a proxy can be removed exactly once.
    proxied: BTreeMap<JobId, u64>,
    real_size: u64,
}

impl Service {
    pub fn new(config: ServiceConfig, schema: ServiceSchema) -> Self {
        Self {
            config,
            schema,
            proxied: BTreeMap::new(),
            real_size: 0,
        }
    }

    /// Sum of `job_size` estimates over every proxied job.
    pub fn current_size(&self) -> u64 {
        self.proxied.values().sum()
    }

    /// Actual measured bytes on disk, maintained by `update_job`/`remove_job`.
    pub fn real_size(&self) -> u64 {
        self.real_size
    }

    /// Start counting `job` against the quota, called when a job moves into
    /// queued. Idempotent: a job already proxied is left untouched.
    pub fn add_job_proxy(&mut self, id: JobId) {
        self.proxied
            .entry(id)
            .or_insert_with(|| self.config.job_size_bytes());
    }

    /// Stop counting `job` against the quota, called before removing it from
    /// the in-memory index.
    pub fn remove_job_proxy(&mut self, id: &JobId) {
        self.proxied.remove(id);
    }

    /// Called after a job's output has been physically deleted; reduces
    /// `real_size` by the job's last measured size.
    pub fn remove_job(&mut self, measured_size: u64) {
        self.real_size = self.real_size.saturating_sub(measured_size);
    }

    /// Reconcile `real_size` upward with a freshly measured job, used on
    /// startup when a job's output directory already exists.
    pub fn update_job(&mut self, measured_size: u64) {
        self.real_size += measured_size;
    }

    pub fn is_proxied(&self, id: &JobId) -> bool {
        self.proxied.contains_key(id)
    }
}

/// All configured services, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct ServiceRegistry {
    services: BTreeMap<String, Service>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, service: Service) {
        self.services.insert(name.into(), service);
    }

    pub fn get(&self, name: &str) -> Option<&Service> {
        self.services.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Service> {
        self.services.get_mut(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
