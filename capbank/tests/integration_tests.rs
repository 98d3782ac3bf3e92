//! Integration tests for the CapBank library

use capbank::catalog::load_catalog;
use capbank::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn fixture_service(options: ServiceOptions) -> OptimizationService {
    let parts = load_catalog(Some(&fixture_path("small_catalog.json"))).unwrap();
    let catalog = Arc::new(CatalogStore::new(parts).unwrap());
    OptimizationService::new(catalog, options).unwrap()
}

fn fixture_request(name: &str) -> OptimizeRequest {
    let text = std::fs::read_to_string(fixture_path(name)).unwrap();
    serde_json::from_str(&text).unwrap()
}

#[test]
fn test_scenario_single_part_wins() {
    let service = fixture_service(ServiceOptions::default());
    let result = service.optimize(&fixture_request("scenario_request.json")).unwrap();

    let best = result.best().expect("scenario should have a solution");
    assert_eq!(best.shape_tag, "1p");
    assert_eq!(best.part_count, 1);
    assert!(best.capacitance >= 0.9e-6 && best.capacitance <= 1.1e-6);
    assert!(
        best.label.contains("SCN-1U-0805-50V"),
        "unexpected top configuration: {}",
        best.label
    );
    assert!(!result.stats.timed_out);
}

#[test]
fn test_invalid_request_fixture() {
    let service = fixture_service(ServiceOptions::default());
    let err = service.optimize(&fixture_request("invalid_request.json")).unwrap_err();
    assert!(matches!(err, CapBankError::InvalidConstraint(_)), "{:?}", err);
}

#[test]
fn test_fixture_catalog_packages() {
    let service = fixture_service(ServiceOptions::default());
    assert_eq!(service.packages(), &["0603", "0805", "1206"]);
    assert_eq!(service.catalog().len(), 6);
}

#[test]
fn test_unknown_packages_rejected() {
    let service = fixture_service(ServiceOptions::default());
    let mut request = fixture_request("scenario_request.json");
    request.packages = vec!["2220".to_string()];
    let err = service.optimize(&request).unwrap_err();
    assert!(err.to_string().contains("packages"));
}

#[test]
fn test_voltage_requirement_forces_series() {
    let service = fixture_service(ServiceOptions::default());
    let mut request = fixture_request("scenario_request.json");
    request.min_rated_volt = 60.0;
    request.max_count = 4;
    let result = service.optimize(&request).unwrap();
    assert!(!result.is_empty());
    for candidate in &result.candidates {
        assert!(candidate.voltage_rating >= 60.0);
        assert!(candidate.shape.series >= 2, "{}", candidate.label);
    }
}

#[test]
fn test_expired_deadline_best_effort() {
    let options = ServiceOptions {
        deadline: Some(Duration::ZERO),
        ..ServiceOptions::default()
    };
    let service = fixture_service(options);
    let result = service.optimize(&fixture_request("scenario_request.json")).unwrap();
    assert!(result.stats.timed_out);
    assert!(result.is_empty());
}

#[test]
fn test_expired_deadline_fails_when_configured() {
    let options = ServiceOptions {
        deadline: Some(Duration::ZERO),
        on_timeout: TimeoutPolicy::Fail,
        ..ServiceOptions::default()
    };
    let service = fixture_service(options);
    let err = service.optimize(&fixture_request("scenario_request.json")).unwrap_err();
    assert!(matches!(err, CapBankError::Timeout { .. }));
}

#[test]
fn test_top_k_limits_results() {
    let options = ServiceOptions {
        top_k: 2,
        ..ServiceOptions::default()
    };
    let service = fixture_service(options);
    let mut request = fixture_request("scenario_request.json");
    request.packages = vec!["0603".to_string(), "0805".to_string()];
    request.min_rated_volt = 0.0;
    let result = service.optimize(&request).unwrap();
    assert_eq!(result.len(), 2);
}

#[test]
fn test_response_json_shape() {
    let service = fixture_service(ServiceOptions::default());
    let result = service.optimize(&fixture_request("scenario_request.json")).unwrap();
    let json = serde_json::to_value(&result.candidates).unwrap();
    let first = &json[0];
    for field in ["Type", "Vol", "Cap", "Cfg", "BOM", "Count", "Volt", "Temp", "Area", "Height", "Parts"] {
        assert!(first.get(field).is_some(), "missing field {}", field);
    }
    assert_eq!(first["Type"], "1p");
    assert_eq!(first["BOM"], "1x 0805");
}
