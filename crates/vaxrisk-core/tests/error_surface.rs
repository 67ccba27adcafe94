use vaxrisk_core::errors::{require_positive, require_unit_interval, ErrorInfo, VaxError};

fn sample_info(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
        .with_context("parameter", "k")
        .with_context("value", -1.0)
}

#[test]
fn config_error_surface() {
    let err = VaxError::Config(sample_info("C001", "dispersion must be positive"));
    assert_eq!(err.info().code, "C001");
    assert!(err.info().context.contains_key("parameter"));
    assert!(err.is_config());
}

#[test]
fn convergence_error_surface() {
    let err = VaxError::Convergence(sample_info("N001", "fixed point did not converge"));
    assert_eq!(err.info().code, "N001");
    assert!(!err.is_config());
}

#[test]
fn display_includes_context_and_hint() {
    let err = VaxError::Optimization(
        ErrorInfo::new("O001", "empty axis")
            .with_context("axis", "vaccination_start")
            .with_hint("use a positive step"),
    );
    let rendered = err.to_string();
    assert!(rendered.starts_with("optimization error: empty axis (code: O001)"));
    assert!(rendered.contains("axis=vaccination_start"));
    assert!(rendered.contains("hint: use a positive step"));
}

#[test]
fn validators_reject_invalid_values() {
    assert!(require_positive("k", 0.41).is_ok());
    assert!(require_positive("k", 0.0).is_err());
    assert!(require_positive("k", f64::NAN).is_err());
    assert!(require_unit_interval("coverage", 1.0).is_ok());
    let err = require_unit_interval("coverage", 1.5).unwrap_err();
    assert_eq!(err.info().context["parameter"], "coverage");
}

#[test]
fn errors_roundtrip_through_json() {
    let err = VaxError::Simulation(sample_info("S001", "gamma shape"));
    let json = serde_json::to_string(&err).unwrap();
    assert!(json.contains("\"family\":\"Simulation\""));
    let back: VaxError = serde_json::from_str(&json).unwrap();
    assert_eq!(back, err);
}
