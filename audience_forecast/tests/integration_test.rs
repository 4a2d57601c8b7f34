use audience_forecast::output::write_forecast_csv;
use audience_forecast::{DashboardConfig, DashboardSession, ForecastRequest, ModelType};
use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::Write;
use tempfile::NamedTempFile;

// 100 daily "Web" rows plus a second platform that must be filtered out
fn create_sample_data() -> NamedTempFile {
    let mut rng = StdRng::seed_from_u64(7);
    let mut file = NamedTempFile::new().unwrap();
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

    writeln!(
        file,
        "Date,AudienceCount,Platform,EngagementRate,ConversionRate,ForecastError"
    )
    .unwrap();
    for day in 0..100 {
        let date = start + Duration::days(day);
        let audience = 5000.0 + 12.0 * day as f64 + rng.gen_range(-150.0..150.0);
        let engagement = 4.0 + rng.gen_range(-0.5..0.5);
        writeln!(file, "{},{:.0},Web,{:.2},2.1,4.5", date, audience, engagement).unwrap();
        if day % 2 == 0 {
            writeln!(file, "{},{:.0},Mobile,3.2,1.4,6.0", date, audience / 2.0).unwrap();
        }
    }

    file
}

#[test]
fn test_full_forecast_workflow() {
    // 1. Load and featurize
    let data_file = create_sample_data();
    let mut session = DashboardSession::new(DashboardConfig::default());
    let featured = session.load_csv(data_file.path()).unwrap();
    assert_eq!(featured.len(), 150);
    assert_eq!(featured.platforms(), vec!["Mobile", "Web"]);

    // 2. Forecast the Web audience with ARIMA
    let request = ForecastRequest::new(ModelType::Arima, 30).with_platform("Web");
    let outcome = session.run_forecast(&request).unwrap();
    assert_eq!(outcome.values().len(), 30);
    assert!(outcome.metrics.unwrap().rmse.is_finite());

    // 3. Export and read back
    let output = NamedTempFile::new().unwrap();
    write_forecast_csv(output.path(), &outcome.timestamps, outcome.values()).unwrap();

    let mut reader = csv::Reader::from_path(output.path()).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.iter().collect::<Vec<_>>(), vec!["timestamp", "forecast"]);

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 30);

    // Consecutive days starting the day after the last input date (2024-04-09)
    let mut expected = NaiveDate::from_ymd_opt(2024, 4, 10).unwrap();
    for row in &rows {
        assert_eq!(row[0].parse::<NaiveDate>().unwrap(), expected);
        assert!(row[1].parse::<f64>().unwrap().is_finite());
        expected = expected.succ_opt().unwrap();
    }
}
