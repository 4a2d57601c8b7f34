//! Loading and preprocessing of raw audience data
//!
//! The loader parses CSV with polars and validates the schema; the
//! preprocessor turns the validated frame into typed, time-sorted rows with
//! imputed metrics and calendar features.

use crate::config::DashboardConfig;
use crate::error::{ForecastError, Result};
use crate::impute::KnnImputer;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};
use polars::prelude::*;
use serde::Serialize;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

/// Input column holding the observation time
pub const DATE_COLUMN: &str = "Date";
/// Input column holding the audience count
pub const AUDIENCE_COLUMN: &str = "AudienceCount";
/// Input column holding the platform label
pub const PLATFORM_COLUMN: &str = "Platform";
pub const ENGAGEMENT_COLUMN: &str = "EngagementRate";
pub const CONVERSION_COLUMN: &str = "ConversionRate";
pub const FORECAST_ERROR_COLUMN: &str = "ForecastError";

/// Columns identifying an observation
pub const REQUIRED_COLUMNS: [&str; 3] = [DATE_COLUMN, AUDIENCE_COLUMN, PLATFORM_COLUMN];
/// Metric columns the imputer needs alongside the audience count
pub const METRIC_COLUMNS: [&str; 3] = [ENGAGEMENT_COLUMN, CONVERSION_COLUMN, FORECAST_ERROR_COLUMN];

/// Canonical internal names after loading
pub const TIMESTAMP: &str = "timestamp";
pub const AUDIENCE_COUNT: &str = "audience_count";
pub const PLATFORM: &str = "platform";

/// Numeric block imputed together, in internal names
pub const NUMERIC_COLUMNS: [&str; 4] = [
    AUDIENCE_COUNT,
    ENGAGEMENT_COLUMN,
    CONVERSION_COLUMN,
    FORECAST_ERROR_COLUMN,
];

const DATETIME_FORMATS: [&str; 8] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y%m%d %H:%M:%S",
];
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%Y%m%d"];

/// A schema-validated input table with canonical column names
#[derive(Debug, Clone)]
pub struct RawAudienceTable {
    df: DataFrame,
}

impl RawAudienceTable {
    /// Get the DataFrame
    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.df.height()
    }

    /// Check if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }
}

/// Data loader for audience CSV exports
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load and validate audience data from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<RawAudienceTable> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        Self::load(df)
    }

    /// Load and validate audience data from any reader
    pub fn from_reader<R: Read>(mut reader: R) -> Result<RawAudienceTable> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes)
    }

    /// Load and validate audience data from in-memory CSV bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<RawAudienceTable> {
        let df = CsvReader::new(Cursor::new(bytes.to_vec()))
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        Self::load(df)
    }

    /// Validate the schema of an existing DataFrame and rename to internal names.
    ///
    /// All six input columns must be present; every absent one is listed in
    /// the returned [`ForecastError::Schema`].
    pub fn load(mut df: DataFrame) -> Result<RawAudienceTable> {
        let present: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .chain(METRIC_COLUMNS.iter())
            .filter(|required| !present.iter().any(|name| name == *required))
            .map(|required| required.to_string())
            .collect();

        if !missing.is_empty() {
            return Err(ForecastError::Schema { missing });
        }

        df.rename(DATE_COLUMN, TIMESTAMP)?;
        df.rename(AUDIENCE_COLUMN, AUDIENCE_COUNT)?;
        df.rename(PLATFORM_COLUMN, PLATFORM)?;

        log::debug!("Loaded {} rows with columns {:?}", df.height(), present);
        Ok(RawAudienceTable { df })
    }
}

/// One cleaned observation with calendar features
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanRow {
    pub timestamp: NaiveDateTime,
    pub platform: String,
    pub audience_count: f64,
    #[serde(rename = "EngagementRate")]
    pub engagement_rate: f64,
    #[serde(rename = "ConversionRate")]
    pub conversion_rate: f64,
    #[serde(rename = "ForecastError")]
    pub forecast_error: f64,
    pub hour: u32,
    /// Monday = 0 .. Sunday = 6
    pub day_of_week: u32,
    pub month: u32,
    pub is_weekend: u8,
    pub is_prime_time: u8,
}

/// Time-sorted, fully imputed observations
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanTable {
    pub rows: Vec<CleanRow>,
}

impl CleanTable {
    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Cleans a validated table: timestamps, ordering, imputation, calendar
#[derive(Debug, Clone)]
pub struct Preprocessor {
    imputer: KnnImputer,
    config: DashboardConfig,
}

impl Preprocessor {
    /// Build a preprocessor from the pipeline configuration
    pub fn new(config: &DashboardConfig) -> Result<Self> {
        Ok(Self {
            imputer: KnnImputer::new(config.knn_neighbors)?,
            config: config.clone(),
        })
    }

    /// Parse, sort, impute and derive calendar features
    pub fn preprocess(&self, table: &RawAudienceTable) -> Result<CleanTable> {
        let df = table.dataframe();

        let timestamps = string_column(df, TIMESTAMP)?
            .into_iter()
            .enumerate()
            .map(|(row, cell)| {
                let text = cell.unwrap_or_default();
                parse_timestamp(&text).ok_or_else(|| ForecastError::InvalidValue {
                    column: DATE_COLUMN.to_string(),
                    row,
                    value: text,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let platforms = string_column(df, PLATFORM)?
            .into_iter()
            .enumerate()
            .map(|(row, cell)| match cell {
                Some(label) if !label.trim().is_empty() => Ok(label.trim().to_string()),
                other => Err(ForecastError::InvalidValue {
                    column: PLATFORM_COLUMN.to_string(),
                    row,
                    value: other.unwrap_or_default(),
                }),
            })
            .collect::<Result<Vec<_>>>()?;

        let numeric = NUMERIC_COLUMNS
            .iter()
            .map(|name| numeric_column(df, name))
            .collect::<Result<Vec<_>>>()?;

        // Stable sort keeps input order among equal timestamps
        let mut order: Vec<usize> = (0..timestamps.len()).collect();
        order.sort_by_key(|&i| timestamps[i]);

        let block: Vec<Vec<Option<f64>>> = order
            .iter()
            .map(|&i| numeric.iter().map(|col| col[i]).collect())
            .collect();
        let missing = block.iter().flatten().filter(|v| v.is_none()).count();
        let imputed = if missing > 0 {
            log::debug!("Imputing {} missing numeric cell(s)", missing);
            self.imputer.fit_transform(&NUMERIC_COLUMNS, &block)?
        } else {
            block
                .into_iter()
                .map(|row| row.into_iter().map(|v| v.unwrap_or_default()).collect())
                .collect()
        };

        let rows = order
            .iter()
            .zip(imputed)
            .map(|(&i, values)| self.clean_row(timestamps[i], platforms[i].clone(), &values))
            .collect();

        Ok(CleanTable { rows })
    }

    fn clean_row(&self, timestamp: NaiveDateTime, platform: String, values: &[f64]) -> CleanRow {
        let hour = timestamp.hour();
        let day_of_week = timestamp.weekday().num_days_from_monday();

        CleanRow {
            timestamp,
            platform,
            audience_count: values[0],
            engagement_rate: values[1],
            conversion_rate: values[2],
            forecast_error: values[3],
            hour,
            day_of_week,
            month: timestamp.month(),
            is_weekend: u8::from(day_of_week >= 5),
            is_prime_time: u8::from(self.config.is_prime_time(hour)),
        }
    }
}

/// Parse a timestamp in any of the accepted date or date-time layouts
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

fn string_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = df.column(name)?.cast(&DataType::Utf8)?;
    let values = series.utf8()?;
    Ok(values.into_iter().map(|v| v.map(str::to_string)).collect())
}

/// Numeric cells as options; nulls and NaN both count as missing
fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df.column(name)?;

    if matches!(column.dtype(), DataType::Utf8) {
        return column
            .utf8()?
            .into_iter()
            .enumerate()
            .map(|(row, cell)| match cell.map(str::trim) {
                None | Some("") => Ok(None),
                Some(text) => text
                    .parse::<f64>()
                    .map(|v| if v.is_nan() { None } else { Some(v) })
                    .map_err(|_| ForecastError::InvalidValue {
                        column: name.to_string(),
                        row,
                        value: text.to_string(),
                    }),
            })
            .collect();
    }

    let series = column.cast(&DataType::Float64)?;
    let values = series.f64()?;
    Ok(values
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect())
}
