use audience_forecast::cache::{content_hash, dataset_key, forecast_key};
use audience_forecast::output::{format_timestamps, future_daily_timestamps, write_forecast};
use audience_forecast::{
    DashboardConfig, DashboardSession, ForecastError, ForecastRequest, ModelType,
};
use chrono::{NaiveDate, NaiveDateTime};
use pretty_assertions::assert_eq;

fn sample_csv(days: u32) -> String {
    let mut csv =
        String::from("Date,AudienceCount,Platform,EngagementRate,ConversionRate,ForecastError\n");
    let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
    for day in 0..days {
        let date = start + chrono::Duration::days(day as i64);
        let web = 1000.0 + 4.0 * day as f64 + (day % 7) as f64 * 15.0;
        let mobile = 600.0 + 2.0 * day as f64;
        csv.push_str(&format!("{},{},Web,4.5,2.0,5.0\n", date, web));
        csv.push_str(&format!("{},{},Mobile,3.5,1.5,7.0\n", date, mobile));
    }
    csv
}

fn ts(text: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").unwrap()
}

#[test]
fn test_content_hash_is_stable() {
    let a = content_hash(b"Date,AudienceCount\n");
    assert_eq!(a, content_hash(b"Date,AudienceCount\n"));
    assert_ne!(a, content_hash(b"Date,AudienceCount\n\n"));
    assert_eq!(a.len(), 64);

    let config = DashboardConfig::default();
    let mut other = config.clone();
    other.rolling_window = 14;
    assert_ne!(dataset_key(&a, &config), dataset_key(&a, &other));
}

#[test]
fn test_forecast_key_depends_on_request() {
    let arima = ForecastRequest::new(ModelType::Arima, 30).with_platform("Web");
    let prophet = ForecastRequest::new(ModelType::Prophet, 30).with_platform("Web");
    let longer = ForecastRequest::new(ModelType::Arima, 60).with_platform("Web");

    let key = forecast_key("dataset", &arima);
    assert_eq!(key, forecast_key("dataset", &arima.clone()));
    assert_ne!(key, forecast_key("dataset", &prophet));
    assert_ne!(key, forecast_key("dataset", &longer));
    assert_ne!(key, forecast_key("other", &arima));
}

#[test]
fn test_reload_hits_cache() {
    let csv = sample_csv(30);
    let mut session = DashboardSession::new(DashboardConfig::default());

    assert_eq!(session.load_bytes(csv.as_bytes()).unwrap().len(), 60);
    assert_eq!(session.cache().stats().misses, 1);

    session.load_bytes(csv.as_bytes()).unwrap();
    assert_eq!(session.cache().stats().hits, 1);
}

#[test]
fn test_repeated_request_served_from_cache() {
    let mut session = DashboardSession::new(DashboardConfig::default());
    session.load_bytes(sample_csv(60).as_bytes()).unwrap();

    let request = ForecastRequest::new(ModelType::Arima, 14).with_platform("Web");
    let first = session.run_forecast(&request).unwrap();
    let hits = session.cache().stats().hits;
    let second = session.run_forecast(&request).unwrap();

    assert_eq!(first, second);
    assert_eq!(session.cache().stats().hits, hits + 1);
}

#[test]
fn test_horizon_outside_bounds() {
    let mut session = DashboardSession::new(DashboardConfig::default());
    session.load_bytes(sample_csv(30).as_bytes()).unwrap();

    for horizon in [0, 6, 91] {
        let request = ForecastRequest::new(ModelType::Arima, horizon);
        assert!(matches!(
            session.run_forecast(&request),
            Err(ForecastError::InvalidParameter(_))
        ));
    }
}

#[test]
fn test_reversed_dates_rejected() {
    let request = ForecastRequest::new(ModelType::Arima, 30)
        .with_dates(NaiveDate::from_ymd_opt(2024, 3, 1), NaiveDate::from_ymd_opt(2024, 2, 1));
    assert!(request
        .validate(&DashboardConfig::default().horizon)
        .is_err());
}

#[test]
fn test_single_day_range_is_valid() {
    let day = NaiveDate::from_ymd_opt(2024, 2, 1);
    let request = ForecastRequest::new(ModelType::Arima, 30).with_dates(day, day);
    assert!(request
        .validate(&DashboardConfig::default().horizon)
        .is_ok());
}

#[test]
fn test_zero_audience_keeps_forecast() {
    let mut csv =
        String::from("Date,AudienceCount,Platform,EngagementRate,ConversionRate,ForecastError\n");
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    for day in 0..100 {
        let date = start + chrono::Duration::days(day);
        let audience = if day == 40 { 0.0 } else { 2000.0 + 5.0 * day as f64 + (day % 5) as f64 * 20.0 };
        csv.push_str(&format!("{},{},Web,4.0,2.0,5.0\n", date, audience));
    }

    let mut session = DashboardSession::new(DashboardConfig::default());
    session.load_bytes(csv.as_bytes()).unwrap();

    let request = ForecastRequest::new(ModelType::Arima, 30).with_platform("Web");
    let outcome = session.run_forecast(&request).unwrap();
    assert_eq!(outcome.values().len(), 30);
    assert_eq!(outcome.timestamps.len(), 30);
    assert!(outcome.metrics.is_none());
    assert!(outcome
        .metrics_error
        .as_deref()
        .unwrap()
        .starts_with("NumericError"));

    let report = session.report(&request, Ok(&outcome)).unwrap();
    assert_eq!(report.forecast.unwrap().forecast.len(), 30);
    assert!(report.metrics.is_none());
    assert!(report.metrics_error.is_some());
}

#[test]
fn test_unfiltered_request_models_all_platforms() {
    let mut session = DashboardSession::new(DashboardConfig::default());
    session.load_bytes(sample_csv(30).as_bytes()).unwrap();

    let request = ForecastRequest::new(ModelType::Arima, 7);
    assert_eq!(session.modeling_frame(&request).unwrap().len(), 60);
    assert_eq!(session.run_forecast(&request).unwrap().values().len(), 7);
}

#[test]
fn test_failed_forecast_keeps_loaded_data() {
    let mut session = DashboardSession::new(DashboardConfig::default());
    session.load_bytes(sample_csv(30).as_bytes()).unwrap();

    // 30 daily rows are too few for the seasonal model
    let request = ForecastRequest::new(ModelType::Sarima, 30).with_platform("Web");
    let outcome = session.run_forecast(&request);
    assert!(matches!(outcome, Err(ForecastError::InsufficientData { .. })));

    assert_eq!(session.featured().unwrap().len(), 60);
    let report = session.report(&request, outcome.as_ref()).unwrap();
    assert_eq!(report.overview.rows, 60);
    assert!(report.forecast.is_none());
    assert!(report
        .forecast_error
        .unwrap()
        .starts_with("InsufficientDataError"));
}

#[test]
fn test_unknown_platform_is_empty_data() {
    let mut session = DashboardSession::new(DashboardConfig::default());
    session.load_bytes(sample_csv(30).as_bytes()).unwrap();

    let request = ForecastRequest::new(ModelType::Arima, 30).with_platform("Radio");
    assert!(matches!(
        session.run_forecast(&request),
        Err(ForecastError::EmptyData(_))
    ));
}

#[test]
fn test_report_with_forecast() {
    let mut session = DashboardSession::new(DashboardConfig::default());
    session.load_bytes(sample_csv(60).as_bytes()).unwrap();

    let request = ForecastRequest::new(ModelType::Prophet, 7).with_platform("Mobile");
    let outcome = session.run_forecast(&request).unwrap();
    let report = session.report(&request, Ok(&outcome)).unwrap();

    assert_eq!(report.platform_comparison.len(), 2);
    assert_eq!(report.engagement_trend.len(), 60);
    assert_eq!(report.audience_trend.len(), 60);
    let overlay = report.forecast.as_ref().unwrap();
    assert_eq!(overlay.forecast.len(), 7);
    assert_eq!(overlay.intervals.as_ref().unwrap().len(), 7);

    let json = serde_json::to_value(&report).unwrap();
    assert!(json["metrics"]["scope"].is_string());
}

#[test]
fn test_timestamp_formatting() {
    let midnight = future_daily_timestamps(ts("2024-01-31 00:00:00"), 2);
    assert_eq!(format_timestamps(&midnight), vec!["2024-02-01", "2024-02-02"]);

    let evening = future_daily_timestamps(ts("2024-01-31 20:00:00"), 1);
    assert_eq!(format_timestamps(&evening), vec!["2024-02-01 20:00:00"]);
}

#[test]
fn test_write_forecast_rows() {
    let timestamps = future_daily_timestamps(ts("2024-01-31 00:00:00"), 2);
    let mut buffer = Vec::new();
    write_forecast(&mut buffer, &timestamps, &[10.5, 11.0]).unwrap();

    let text = String::from_utf8(buffer).unwrap();
    assert_eq!(text, "timestamp,forecast\n2024-02-01,10.5\n2024-02-02,11.0\n");

    let mut buffer = Vec::new();
    assert!(write_forecast(&mut buffer, &timestamps, &[1.0]).is_err());
}
