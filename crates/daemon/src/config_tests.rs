use super::*;

const MINIMAL: &str = r#"
[daemon]
sleep_time_secs = 5
shutdown_time_secs = 30
schedulers = ["pbs"]

[gate]
root = "/tmp/jobgate-test-fixture"

[services.flexpart]
quota_mb = 1024
job_size_mb = 64
min_lifetime_hours = 1
max_lifetime_hours = 168
max_runtime_hours = 24

[services.flexpart.variables.CIS_SCHEDULER]
type = "string"
default = "pbs"
values = ["pbs"]

[services.flexpart.variables.particles]
type = "int"
default = 1000
values = [1, 1000000]

[services.flexpart.variables.release_date]
type = "datetime"
format = "%Y%m%d %H%M%S"
default = "20200101 000000"

[services.flexpart.variables.coords]
type = "float_array"
default = []
values = [10, -90.0, 90.0]

[services.flexpart.variables.release]
type = "object"

[services.flexpart.variables.release.fields.lat]
type = "float"
default = 0.0
values = [-90.0, 90.0]

[services.flexpart.variables.release.fields.lon]
type = "float"
default = 0.0
values = [-180.0, 180.0]
"#;

#[test]
fn parses_gate_root_sleep_time_and_schedulers() {
    let config = DaemonConfig::parse(MINIMAL, Path::new("test.toml")).unwrap();
    assert_eq!(config.gate_root, Path::new("/tmp/jobgate-test-fixture"));
    assert_eq!(config.gate.jobs, Path::new("/tmp/jobgate-test-fixture/jobs"));
    assert_eq!(config.manager.sleep_time, Duration::from_secs(5));
    assert_eq!(config.manager.shutdown_time, Duration::from_secs(30));
    assert_eq!(config.manager.cleanup_workers, DEFAULT_CLEANUP_WORKERS);
    assert_eq!(config.scheduler_names, vec!["pbs".to_string()]);
}

#[test]
fn builds_service_quota_and_lifetime_in_seconds() {
    let config = DaemonConfig::parse(MINIMAL, Path::new("test.toml")).unwrap();
    let service = config.registry.get("flexpart").unwrap();
    assert_eq!(service.config.quota_mb, 1024);
    assert_eq!(service.config.job_size_mb, 64);
    assert_eq!(service.config.min_lifetime, Duration::from_secs(3600));
    assert_eq!(service.config.max_lifetime, Duration::from_secs(168 * 3600));
    assert_eq!(service.config.max_runtime, Duration::from_secs(24 * 3600));
}

#[test]
fn builds_scalar_array_and_nested_object_variables() {
    let config = DaemonConfig::parse(MINIMAL, Path::new("test.toml")).unwrap();
    let service = config.registry.get("flexpart").unwrap();

    match service.schema.get("particles").unwrap() {
        Schema::Int { default, bound } => {
            assert_eq!(*default, 1000);
            assert_eq!(bound.min, 1);
            assert_eq!(bound.max, 1_000_000);
        }
        other => panic!("expected Int, got {other:?}"),
    }

    match service.schema.get("coords").unwrap() {
        Schema::FloatArray(array) => {
            assert_eq!(array.max_len, 10);
            assert_eq!(array.bound.min, -90.0);
            assert_eq!(array.bound.max, 90.0);
        }
        other => panic!("expected FloatArray, got {other:?}"),
    }

    match service.schema.get("release").unwrap() {
        Schema::Object(object) => {
            assert!(object.fields.contains_key("lat"));
            assert!(object.fields.contains_key("lon"));
        }
        other => panic!("expected Object, got {other:?}"),
    }
}

#[test]
fn datetime_default_is_parsed_to_epoch_millis_at_load_time() {
    let config = DaemonConfig::parse(MINIMAL, Path::new("test.toml")).unwrap();
    let service = config.registry.get("flexpart").unwrap();
    match service.schema.get("release_date").unwrap() {
        Schema::DateTime { default, format } => {
            assert_eq!(format, "%Y%m%d %H%M%S");
            assert!(*default > 0);
        }
        other => panic!("expected DateTime, got {other:?}"),
    }
}

#[test]
fn rejects_a_variable_with_no_type() {
    let toml = r#"
[daemon]
sleep_time_secs = 5
shutdown_time_secs = 30

[services.svc]
quota_mb = 1
job_size_mb = 1

[services.svc.variables.bad]
default = 1
"#;
    let err = DaemonConfig::parse(toml, Path::new("test.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidVariable { .. }));
}

#[test]
fn rejects_an_unknown_variable_type() {
    let toml = r#"
[daemon]
sleep_time_secs = 5
shutdown_time_secs = 30

[services.svc]
quota_mb = 1
job_size_mb = 1

[services.svc.variables.bad]
type = "complex"
"#;
    let err = DaemonConfig::parse(toml, Path::new("test.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::UnknownVariableType { .. }));
}

#[test]
fn gate_overrides_replace_only_the_named_directory() {
    let toml = r#"
[daemon]
sleep_time_secs = 5
shutdown_time_secs = 30

[gate]
root = "/tmp/jobgate-test-fixture"
output = "/var/jobgate-output"
"#;
    let config = DaemonConfig::parse(toml, Path::new("test.toml")).unwrap();
    assert_eq!(config.gate.output, Path::new("/var/jobgate-output"));
    assert_eq!(config.gate.jobs, Path::new("/tmp/jobgate-test-fixture/jobs"));
}
