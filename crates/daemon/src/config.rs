// SPDX-License-Identifier: MIT

//! TOML configuration loading: gate paths, the control loop's tunables, the
//! registered scheduler names, and every service's quota policy plus
//! variable schema.
//!
//! The schema model itself lives in `jg_validator`; this module only
//! translates the config file's `toml::Value` representation of each
//! declared variable into that model, once, at startup.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use jg_engine::{ManagerConfig, Service, ServiceConfig, ServiceRegistry};
use jg_gatefs::GateConfig;
use jg_validator::{parse_datetime, ArraySchema, ObjectSchema, Schema, ServiceSchema, ValuesBound};
use serde::Deserialize;
use toml::Value;

use crate::env;
use crate::error::ConfigError;

const SECS_PER_HOUR: u64 = 3600;
const DEFAULT_CLEANUP_WORKERS: usize = 4;

/// Everything read from the config file plus the resolved gate root,
/// assembled into the types the rest of the workspace consumes directly.
#[derive(Debug)]
pub struct DaemonConfig {
    pub gate_root: PathBuf,
    pub gate: GateConfig,
    pub manager: ManagerConfig,
    pub scheduler_names: Vec<String>,
    pub registry: ServiceRegistry,
}

impl DaemonConfig {
    /// Read and parse `path`, falling back to the environment's default
    /// gate root when the file omits `[gate] root`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        Self::parse(&raw, path)
    }

    fn parse(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        let parsed: RawConfig =
            toml::from_str(raw).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;

        let gate_root = match &parsed.gate.root {
            Some(root) => root.clone(),
            None => env::default_gate_root()?,
        };
        let gate = parsed.gate.build(&gate_root);

        let mut registry = ServiceRegistry::new();
        for (name, raw_service) in &parsed.services {
            registry.insert(name.clone(), raw_service.build(name)?);
        }

        Ok(Self {
            gate_root,
            gate,
            manager: ManagerConfig {
                sleep_time: Duration::from_secs(parsed.daemon.sleep_time_secs),
                shutdown_time: Duration::from_secs(parsed.daemon.shutdown_time_secs),
                cleanup_workers: parsed.daemon.cleanup_workers,
            },
            scheduler_names: parsed.daemon.schedulers,
            registry,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    daemon: RawDaemon,
    #[serde(default)]
    gate: RawGate,
    #[serde(default)]
    services: BTreeMap<String, RawService>,
}

#[derive(Debug, Deserialize)]
struct RawDaemon {
    sleep_time_secs: u64,
    shutdown_time_secs: u64,
    #[serde(default = "default_cleanup_workers")]
    cleanup_workers: usize,
    #[serde(default)]
    schedulers: Vec<String>,
}

fn default_cleanup_workers() -> usize {
    DEFAULT_CLEANUP_WORKERS
}

/// Per-directory overrides for `GateConfig`, one `gate_path_*` key per
/// directory. Every field defaults to `<root>/<name>`.
#[derive(Debug, Deserialize, Default)]
struct RawGate {
    root: Option<PathBuf>,
    jobs: Option<PathBuf>,
    opts: Option<PathBuf>,
    waiting: Option<PathBuf>,
    queued: Option<PathBuf>,
    running: Option<PathBuf>,
    closing: Option<PathBuf>,
    cleanup: Option<PathBuf>,
    done: Option<PathBuf>,
    failed: Option<PathBuf>,
    aborted: Option<PathBuf>,
    killed: Option<PathBuf>,
    exit: Option<PathBuf>,
    stop: Option<PathBuf>,
    delete: Option<PathBuf>,
    output: Option<PathBuf>,
    dump: Option<PathBuf>,
}

impl RawGate {
    fn build(&self, root: &Path) -> GateConfig {
        let mut gate = GateConfig::under(root);
        macro_rules! apply {
            ($field:ident) => {
                if let Some(path) = &self.$field {
                    gate.$field = path.clone();
                }
            };
        }
        apply!(jobs);
        apply!(opts);
        apply!(waiting);
        apply!(queued);
        apply!(running);
        apply!(closing);
        apply!(cleanup);
        apply!(done);
        apply!(failed);
        apply!(aborted);
        apply!(killed);
        apply!(exit);
        apply!(stop);
        apply!(delete);
        apply!(output);
        apply!(dump);
        gate
    }
}

#[derive(Debug, Deserialize)]
struct RawService {
    quota_mb: u64,
    job_size_mb: u64,
    #[serde(default)]
    min_lifetime_hours: u64,
    #[serde(default)]
    max_lifetime_hours: u64,
    #[serde(default)]
    max_runtime_hours: u64,
    #[serde(default)]
    variables: BTreeMap<String, Value>,
}

impl RawService {
    fn build(&self, service_name: &str) -> Result<Service, ConfigError> {
        let config = ServiceConfig {
            quota_mb: self.quota_mb,
            job_size_mb: self.job_size_mb,
            min_lifetime: Duration::from_secs(self.min_lifetime_hours * SECS_PER_HOUR),
            max_lifetime: Duration::from_secs(self.max_lifetime_hours * SECS_PER_HOUR),
            max_runtime: Duration::from_secs(self.max_runtime_hours * SECS_PER_HOUR),
        };

        let mut schema: ServiceSchema = BTreeMap::new();
        for (var_name, value) in &self.variables {
            schema.insert(var_name.clone(), schema_from_toml(service_name, var_name, value)?);
        }

        Ok(Service::new(config, schema))
    }
}

fn invalid(service: &str, variable: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidVariable {
        service: service.to_string(),
        variable: variable.to_string(),
        reason: reason.into(),
    }
}

/// Translate one `[services.<name>.variables.<var>]` table into a
/// `jg_validator::Schema`, dispatching on its `type` key. Nesting depth is
/// *not* enforced here — it is rejected at validation time, against each
/// request, not at load time (see DESIGN.md for the reasoning).
fn schema_from_toml(service: &str, name: &str, value: &Value) -> Result<Schema, ConfigError> {
    let table = value
        .as_table()
        .ok_or_else(|| invalid(service, name, "expected a table"))?;
    let ty = table
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid(service, name, "missing \"type\""))?;

    match ty {
        "int" => {
            let default = table.get("default").and_then(Value::as_integer).unwrap_or(0);
            let bound = int_bound(service, name, table)?;
            Ok(Schema::Int { default, bound })
        }
        "float" => {
            let default = table.get("default").and_then(as_f64).unwrap_or(0.0);
            let bound = float_bound(service, name, table)?;
            Ok(Schema::Float { default, bound })
        }
        "string" => {
            let default = table
                .get("default")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string();
            let values = table
                .get("values")
                .and_then(Value::as_array)
                .map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
                .unwrap_or_default();
            Ok(Schema::String { default, values })
        }
        "datetime" => {
            let format = table
                .get("format")
                .and_then(Value::as_str)
                .ok_or_else(|| invalid(service, name, "missing \"format\""))?
                .to_string();
            let default_str = table.get("default").and_then(Value::as_str).unwrap_or("");
            let default = parse_datetime(&format, default_str)
                .ok_or_else(|| invalid(service, name, "default does not match format"))?;
            Ok(Schema::DateTime { default, format })
        }
        "int_array" => {
            let (max_len, bound) = int_array_bound(service, name, table)?;
            let default = table
                .get("default")
                .and_then(Value::as_array)
                .map(|items| items.iter().filter_map(Value::as_integer).collect())
                .unwrap_or_default();
            Ok(Schema::IntArray(ArraySchema { default, max_len, bound }))
        }
        "float_array" => {
            let (max_len, bound) = float_array_bound(service, name, table)?;
            let default = table
                .get("default")
                .and_then(Value::as_array)
                .map(|items| items.iter().filter_map(as_f64).collect())
                .unwrap_or_default();
            Ok(Schema::FloatArray(ArraySchema { default, max_len, bound }))
        }
        "object" => {
            let fields = object_fields(service, name, table)?;
            Ok(Schema::Object(ObjectSchema { fields }))
        }
        "object_array" => {
            let max_len = table
                .get("max_len")
                .and_then(Value::as_integer)
                .ok_or_else(|| invalid(service, name, "missing \"max_len\""))? as usize;
            let fields = object_fields(service, name, table)?;
            Ok(Schema::ObjectArray {
                max_len,
                fields: ObjectSchema { fields },
            })
        }
        other => Err(ConfigError::UnknownVariableType {
            service: service.to_string(),
            variable: name.to_string(),
            ty: other.to_string(),
        }),
    }
}

fn object_fields(
    service: &str,
    name: &str,
    table: &toml::map::Map<String, Value>,
) -> Result<BTreeMap<String, Schema>, ConfigError> {
    let fields_table = table
        .get("fields")
        .and_then(Value::as_table)
        .ok_or_else(|| invalid(service, name, "missing \"fields\""))?;
    fields_table
        .iter()
        .map(|(field_name, field_value)| {
            let qualified = format!("{name}.{field_name}");
            Ok((field_name.clone(), schema_from_toml(service, &qualified, field_value)?))
        })
        .collect()
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Float(f) => Some(*f),
        Value::Integer(i) => Some(*i as f64),
        _ => None,
    }
}

fn int_bound(service: &str, name: &str, table: &toml::map::Map<String, Value>) -> Result<ValuesBound<i64>, ConfigError> {
    let items = table
        .get("values")
        .and_then(Value::as_array)
        .ok_or_else(|| invalid(service, name, "missing \"values\" [min, max]"))?;
    if items.len() != 2 {
        return Err(invalid(service, name, "\"values\" must be [min, max]"));
    }
    let min = items[0]
        .as_integer()
        .ok_or_else(|| invalid(service, name, "min must be an integer"))?;
    let max = items[1]
        .as_integer()
        .ok_or_else(|| invalid(service, name, "max must be an integer"))?;
    Ok(ValuesBound { min, max })
}

fn float_bound(service: &str, name: &str, table: &toml::map::Map<String, Value>) -> Result<ValuesBound<f64>, ConfigError> {
    let items = table
        .get("values")
        .and_then(Value::as_array)
        .ok_or_else(|| invalid(service, name, "missing \"values\" [min, max]"))?;
    if items.len() != 2 {
        return Err(invalid(service, name, "\"values\" must be [min, max]"));
    }
    let min = as_f64(&items[0]).ok_or_else(|| invalid(service, name, "min must be numeric"))?;
    let max = as_f64(&items[1]).ok_or_else(|| invalid(service, name, "max must be numeric"))?;
    Ok(ValuesBound { min, max })
}

fn int_array_bound(
    service: &str,
    name: &str,
    table: &toml::map::Map<String, Value>,
) -> Result<(usize, ValuesBound<i64>), ConfigError> {
    let items = table
        .get("values")
        .and_then(Value::as_array)
        .ok_or_else(|| invalid(service, name, "missing \"values\" [max_len, min, max]"))?;
    if items.len() != 3 {
        return Err(invalid(service, name, "\"values\" must be [max_len, min, max]"));
    }
    let max_len = items[0]
        .as_integer()
        .ok_or_else(|| invalid(service, name, "max_len must be an integer"))? as usize;
    let min = items[1]
        .as_integer()
        .ok_or_else(|| invalid(service, name, "min must be an integer"))?;
    let max = items[2]
        .as_integer()
        .ok_or_else(|| invalid(service, name, "max must be an integer"))?;
    Ok((max_len, ValuesBound { min, max }))
}

fn float_array_bound(
    service: &str,
    name: &str,
    table: &toml::map::Map<String, Value>,
) -> Result<(usize, ValuesBound<f64>), ConfigError> {
    let items = table
        .get("values")
        .and_then(Value::as_array)
        .ok_or_else(|| invalid(service, name, "missing \"values\" [max_len, min, max]"))?;
    if items.len() != 3 {
        return Err(invalid(service, name, "\"values\" must be [max_len, min, max]"));
    }
    let max_len = items[0]
        .as_integer()
        .ok_or_else(|| invalid(service, name, "max_len must be an integer"))? as usize;
    let min = as_f64(&items[1]).ok_or_else(|| invalid(service, name, "min must be numeric"))?;
    let max = as_f64(&items[2]).ok_or_else(|| invalid(service, name, "max must be numeric"))?;
    Ok((max_len, ValuesBound { min, max }))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
