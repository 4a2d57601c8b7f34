use audience_forecast::config::{HorizonBounds, DEFAULT_HORIZON};
use audience_forecast::{DashboardConfig, ForecastError};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_defaults() {
    let config = DashboardConfig::default();
    assert_eq!(config.knn_neighbors, 5);
    assert_eq!(config.rolling_window, 7);
    assert_eq!((config.prime_time_start, config.prime_time_end), (19, 22));
    assert_eq!(
        config.horizon,
        HorizonBounds {
            min: 7,
            max: 90,
            default: DEFAULT_HORIZON
        }
    );
}

#[test]
fn test_partial_json_keeps_defaults() {
    let config = DashboardConfig::from_json_str(r#"{"rolling_window": 14}"#).unwrap();
    assert_eq!(config.rolling_window, 14);
    assert_eq!(config.knn_neighbors, 5);
    assert_eq!(config.horizon.default, 30);
}

#[test]
fn test_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"{{"knn_neighbors": 3, "horizon": {{"max": 60}}}}"#).unwrap();

    let config = DashboardConfig::from_json_file(file.path()).unwrap();
    assert_eq!(config.knn_neighbors, 3);
    assert_eq!(config.horizon.max, 60);
    assert_eq!(config.horizon.min, 7);
}

#[rstest]
#[case(r#"{"knn_neighbors": 0}"#)]
#[case(r#"{"rolling_window": 0}"#)]
#[case(r#"{"prime_time_start": 23, "prime_time_end": 20}"#)]
#[case(r#"{"horizon": {"min": 10, "max": 5}}"#)]
fn test_invalid_config(#[case] json: &str) {
    assert!(matches!(
        DashboardConfig::from_json_str(json),
        Err(ForecastError::InvalidParameter(_))
    ));
}

#[test]
fn test_malformed_json() {
    let err = DashboardConfig::from_json_str("{not json").unwrap_err();
    assert_eq!(err.kind(), "JsonError");
}

#[rstest]
#[case(6, false)]
#[case(7, true)]
#[case(30, true)]
#[case(90, true)]
#[case(91, false)]
fn test_horizon_bounds(#[case] horizon: usize, #[case] ok: bool) {
    assert_eq!(HorizonBounds::default().check(horizon).is_ok(), ok);
}
