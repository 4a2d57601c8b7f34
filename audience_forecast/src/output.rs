//! Forecast export: dated CSV rows and JSON reports

use crate::error::{ForecastError, Result};
use crate::models::ModelType;
use chrono::{Duration, NaiveDateTime, Timelike};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// `periods` consecutive days starting the day after `last`
pub fn future_daily_timestamps(last: NaiveDateTime, periods: usize) -> Vec<NaiveDateTime> {
    (1..=periods as i64)
        .map(|day| last + Duration::days(day))
        .collect()
}

/// Render timestamps as dates when every one is at midnight, else as date-times
pub fn format_timestamps(timestamps: &[NaiveDateTime]) -> Vec<String> {
    let midnight = timestamps
        .iter()
        .all(|ts| ts.num_seconds_from_midnight() == 0 && ts.nanosecond() == 0);
    let fmt = if midnight { DATE_FORMAT } else { DATETIME_FORMAT };
    timestamps.iter().map(|ts| ts.format(fmt).to_string()).collect()
}

/// Default file name for a platform's forecast download
pub fn default_output_name(platform: &str, model_type: ModelType) -> String {
    format!("{}_forecast_{}.csv", platform, model_type)
}

#[derive(Debug, Serialize)]
struct ForecastRecord<'a> {
    timestamp: &'a str,
    forecast: f64,
}

/// Write `timestamp,forecast` rows to any writer
pub fn write_forecast<W: Write>(writer: W, timestamps: &[NaiveDateTime], values: &[f64]) -> Result<()> {
    if timestamps.len() != values.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: timestamps.len(),
            got: values.len(),
        });
    }

    let mut csv_writer = csv::Writer::from_writer(writer);
    if timestamps.is_empty() {
        csv_writer.write_record(["timestamp", "forecast"])?;
    }
    for (timestamp, forecast) in format_timestamps(timestamps).iter().zip(values) {
        csv_writer.serialize(ForecastRecord {
            timestamp,
            forecast: *forecast,
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write the forecast CSV to `path`
pub fn write_forecast_csv<P: AsRef<Path>>(
    path: P,
    timestamps: &[NaiveDateTime],
    values: &[f64],
) -> Result<()> {
    let file = File::create(path.as_ref())?;
    write_forecast(BufWriter::new(file), timestamps, values)?;
    log::info!(
        "Wrote {} forecast row(s) to {}",
        values.len(),
        path.as_ref().display()
    );
    Ok(())
}

/// Pretty-printed JSON of any serializable report
pub fn write_json_report<P: AsRef<Path>, T: Serialize>(path: P, report: &T) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.flush()?;
    Ok(())
}
