use assert_approx_eq::assert_approx_eq;
use audience_forecast::data::{parse_timestamp, DataLoader, Preprocessor};
use audience_forecast::{DashboardConfig, ForecastError};
use chrono::{Datelike, NaiveDate, Timelike};
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::NamedTempFile;

const HEADER: &str = "Date,AudienceCount,Platform,EngagementRate,ConversionRate,ForecastError";

fn preprocess(csv: &str) -> audience_forecast::Result<audience_forecast::CleanTable> {
    let raw = DataLoader::from_bytes(csv.as_bytes())?;
    Preprocessor::new(&DashboardConfig::default())?.preprocess(&raw)
}

#[test]
fn test_load_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", HEADER).unwrap();
    writeln!(file, "2024-01-01,1000,Web,4.5,2.1,5.0").unwrap();
    writeln!(file, "2024-01-02,1100,Web,4.7,2.3,4.0").unwrap();

    let raw = DataLoader::from_csv(file.path()).unwrap();
    assert_eq!(raw.len(), 2);

    let names: Vec<String> = raw
        .dataframe()
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();
    assert!(names.contains(&"timestamp".to_string()));
    assert!(names.contains(&"audience_count".to_string()));
    assert!(names.contains(&"platform".to_string()));
}

#[test]
fn test_missing_columns_are_all_reported() {
    let csv = "Date,Platform,EngagementRate\n2024-01-01,Web,4.5\n";
    match DataLoader::from_bytes(csv.as_bytes()) {
        Err(ForecastError::Schema { missing }) => {
            assert_eq!(
                missing,
                vec!["AudienceCount", "ConversionRate", "ForecastError"]
            );
        }
        other => panic!("expected schema error, got {:?}", other),
    }
}

#[test]
fn test_schema_error_kind() {
    let err = DataLoader::from_bytes(b"a,b\n1,2\n").unwrap_err();
    assert_eq!(err.kind(), "SchemaError");

    let err = ForecastError::PolarsError("bad frame".to_string());
    assert_eq!(err.kind(), "PolarsError");
}

#[test]
fn test_rows_sorted_by_timestamp() {
    let csv = format!(
        "{}\n2024-01-03,300,Web,1,1,1\n2024-01-01,100,Web,1,1,1\n2024-01-02,200,Mobile,1,1,1\n",
        HEADER
    );
    let clean = preprocess(&csv).unwrap();

    let counts: Vec<f64> = clean.rows.iter().map(|r| r.audience_count).collect();
    assert_eq!(counts, vec![100.0, 200.0, 300.0]);
    assert!(clean
        .rows
        .windows(2)
        .all(|w| w[0].timestamp <= w[1].timestamp));
}

#[test]
fn test_calendar_features() {
    // 2024-01-06 is a Saturday
    let csv = format!("{}\n2024-01-06 20:15:00,500,Web,3,2,1\n", HEADER);
    let clean = preprocess(&csv).unwrap();
    let row = &clean.rows[0];

    assert_eq!(row.hour, 20);
    assert_eq!(row.day_of_week, 5);
    assert_eq!(row.month, 1);
    assert_eq!(row.is_weekend, 1);
    assert_eq!(row.is_prime_time, 1);
}

#[test]
fn test_unparsable_timestamp_names_row() {
    let csv = format!("{}\n2024-01-01,1,Web,1,1,1\nyesterday,2,Web,1,1,1\n", HEADER);
    match preprocess(&csv) {
        Err(ForecastError::InvalidValue { column, row, value }) => {
            assert_eq!(column, "Date");
            assert_eq!(row, 1);
            assert_eq!(value, "yesterday");
        }
        other => panic!("expected invalid value, got {:?}", other),
    }
}

#[test]
fn test_knn_imputes_missing_metric() {
    let csv = format!(
        "{}\n\
         2024-01-01,100,Web,2.0,1.0,5\n\
         2024-01-02,102,Web,4.0,1.0,5\n\
         2024-01-03,101,Web,,1.0,5\n",
        HEADER
    );
    let clean = preprocess(&csv).unwrap();

    // Both other rows are donors (k = 5 > 2), so the gap is their mean
    assert_approx_eq!(clean.rows[2].engagement_rate, 3.0, 1e-9);
    assert!(clean
        .rows
        .iter()
        .all(|r| r.audience_count.is_finite() && r.engagement_rate.is_finite()));
}

#[test]
fn test_all_missing_column_is_numeric_error() {
    let csv = format!("{}\n2024-01-01,100,Web,,1,1\n2024-01-02,110,Web,,1,1\n", HEADER);
    let err = preprocess(&csv).unwrap_err();
    assert_eq!(err.kind(), "NumericError");
}

#[test]
fn test_parse_timestamp_formats() {
    let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
    for text in ["2024-03-05", "03/05/2024", "2024/03/05"] {
        let ts = parse_timestamp(text).unwrap();
        assert_eq!(ts.date(), date);
        assert_eq!(ts.hour(), 0);
    }

    let ts = parse_timestamp("2024-03-05T21:30:00").unwrap();
    assert_eq!((ts.day(), ts.hour(), ts.minute()), (5, 21, 30));
    let ts = parse_timestamp("2024-03-05T21:30:00+00:00").unwrap();
    assert_eq!(ts.hour(), 21);

    assert!(parse_timestamp("").is_none());
    assert!(parse_timestamp("not a date").is_none());
}
