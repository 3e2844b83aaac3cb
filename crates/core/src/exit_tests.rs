use super::*;

#[test]
fn success_is_zero() {
    assert_eq!(ExitCode::Success.value(), 0);
    assert_eq!(ExitCode::Success.to_string(), "0");
}

#[test]
fn default_is_undefined() {
    assert_eq!(ExitCode::default(), ExitCode::Undefined);
}
