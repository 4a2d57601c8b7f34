//! Chart-ready aggregates of the featured data
//!
//! Every type here serializes to JSON for the report file; nothing in this
//! module renders charts.

use crate::error::{ForecastError, Result};
use crate::features::{FeaturedTable, ModelingFrame};
use crate::metrics::MetricsBundle;
use crate::models::ForecastResult;
use crate::output::future_daily_timestamps;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

#[derive(Debug, Clone, Copy, Default)]
struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn value(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Headline figures over the whole featured table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub rows: usize,
    pub platforms: Vec<String>,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub total_audience: f64,
    pub avg_engagement_rate: f64,
    pub avg_conversion_rate: f64,
    /// 100 minus the mean reported ForecastError
    pub forecast_accuracy: f64,
}

/// Headline figures; an empty table is an error
pub fn overview(table: &FeaturedTable) -> Result<Overview> {
    let (first_date, last_date) = table
        .date_range()
        .ok_or_else(|| ForecastError::EmptyData("No rows to summarise".to_string()))?;

    let n = table.len() as f64;
    let mut total = 0.0;
    let mut engagement = 0.0;
    let mut conversion = 0.0;
    let mut error = 0.0;
    for row in &table.rows {
        total += row.base.audience_count;
        engagement += row.base.engagement_rate;
        conversion += row.base.conversion_rate;
        error += row.base.forecast_error;
    }

    Ok(Overview {
        rows: table.len(),
        platforms: table.platforms(),
        first_date,
        last_date,
        total_audience: total,
        avg_engagement_rate: engagement / n,
        avg_conversion_rate: conversion / n,
        forecast_accuracy: 100.0 - error / n,
    })
}

/// One point of the audience trend chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub timestamp: NaiveDateTime,
    pub audience_count: f64,
    pub audience_7day_mean: f64,
    pub engagement_score: f64,
}

/// Audience, its rolling mean and the engagement score along the frame index
pub fn audience_trend(frame: &ModelingFrame) -> Vec<TrendPoint> {
    (0..frame.len())
        .map(|i| TrendPoint {
            timestamp: frame.index[i],
            audience_count: frame.audience_count[i],
            audience_7day_mean: frame.audience_7day_mean[i],
            engagement_score: frame.engagement_score[i],
        })
        .collect()
}

/// Daily mean engagement and conversion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyEngagement {
    pub date: NaiveDate,
    pub engagement_rate: f64,
    pub conversion_rate: f64,
}

/// Engagement and conversion averaged per calendar day, in date order
pub fn engagement_trend(table: &FeaturedTable) -> Vec<DailyEngagement> {
    let mut days: BTreeMap<NaiveDate, (Mean, Mean)> = BTreeMap::new();
    for row in &table.rows {
        let entry = days.entry(row.base.timestamp.date()).or_default();
        entry.0.add(row.base.engagement_rate);
        entry.1.add(row.base.conversion_rate);
    }

    days.into_iter()
        .filter_map(|(date, (engagement, conversion))| {
            Some(DailyEngagement {
                date,
                engagement_rate: engagement.value()?,
                conversion_rate: conversion.value()?,
            })
        })
        .collect()
}

/// Per-platform means
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformSummary {
    pub platform: String,
    pub rows: usize,
    pub audience_count: f64,
    pub engagement_rate: f64,
    pub conversion_rate: f64,
}

/// Mean audience, engagement and conversion for each platform, sorted by label
pub fn platform_comparison(table: &FeaturedTable) -> Vec<PlatformSummary> {
    let mut groups: BTreeMap<&str, [Mean; 3]> = BTreeMap::new();
    for row in &table.rows {
        let means = groups.entry(row.base.platform.as_str()).or_default();
        means[0].add(row.base.audience_count);
        means[1].add(row.base.engagement_rate);
        means[2].add(row.base.conversion_rate);
    }

    groups
        .into_iter()
        .filter_map(|(platform, [audience, engagement, conversion])| {
            Some(PlatformSummary {
                platform: platform.to_string(),
                rows: audience.count,
                audience_count: audience.value()?,
                engagement_rate: engagement.value()?,
                conversion_rate: conversion.value()?,
            })
        })
        .collect()
}

/// Mean audience by hour (rows) and weekday (columns)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudienceHeatmap {
    /// Hours that occur in the data, ascending
    pub hours: Vec<u32>,
    /// Weekdays that occur in the data, Monday first
    pub days: Vec<String>,
    /// `values[h][d]`; `None` where no observation falls in the cell
    pub values: Vec<Vec<Option<f64>>>,
}

/// Pivot of mean audience over hour of day and day of week
pub fn audience_heatmap(table: &FeaturedTable) -> AudienceHeatmap {
    let mut cells: BTreeMap<(u32, u32), Mean> = BTreeMap::new();
    for row in &table.rows {
        cells
            .entry((row.base.hour, row.base.day_of_week))
            .or_default()
            .add(row.base.audience_count);
    }

    let hours: Vec<u32> = cells.keys().map(|(h, _)| *h).collect::<BTreeSet<_>>().into_iter().collect();
    let weekdays: Vec<u32> = cells.keys().map(|(_, d)| *d).collect::<BTreeSet<_>>().into_iter().collect();

    let values = hours
        .iter()
        .map(|h| {
            weekdays
                .iter()
                .map(|d| cells.get(&(*h, *d)).and_then(Mean::value))
                .collect()
        })
        .collect();

    AudienceHeatmap {
        hours,
        days: weekdays
            .iter()
            .map(|d| WEEKDAY_NAMES[*d as usize % 7].to_string())
            .collect(),
        values,
    }
}

/// A dated value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

/// History and forecast on one time axis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastOverlay {
    pub model: String,
    pub history: Vec<SeriesPoint>,
    pub forecast: Vec<SeriesPoint>,
    /// Prediction interval bounds, aligned with `forecast`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intervals: Option<Vec<(f64, f64)>>,
}

/// Attach daily dates to a forecast continuing the frame's history
pub fn forecast_overlay(frame: &ModelingFrame, model: &str, result: &ForecastResult) -> Result<ForecastOverlay> {
    let last = frame
        .last_timestamp()
        .ok_or_else(|| ForecastError::EmptyData("No history to extend".to_string()))?;

    let history = frame
        .index
        .iter()
        .zip(&frame.audience_count)
        .map(|(timestamp, value)| SeriesPoint {
            timestamp: *timestamp,
            value: *value,
        })
        .collect();
    let forecast = future_daily_timestamps(last, result.horizon())
        .into_iter()
        .zip(result.values())
        .map(|(timestamp, value)| SeriesPoint {
            timestamp,
            value: *value,
        })
        .collect();

    Ok(ForecastOverlay {
        model: model.to_string(),
        history,
        forecast,
        intervals: result.intervals().map(<[_]>::to_vec),
    })
}

/// Everything the report file contains
#[derive(Debug, Clone, Serialize)]
pub struct InsightReport {
    pub overview: Overview,
    pub engagement_trend: Vec<DailyEngagement>,
    pub platform_comparison: Vec<PlatformSummary>,
    pub heatmap: AudienceHeatmap,
    pub audience_trend: Vec<TrendPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast: Option<ForecastOverlay>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricsBundle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics_error: Option<String>,
    /// Set when the forecast step failed after the data loaded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast_error: Option<String>,
}
