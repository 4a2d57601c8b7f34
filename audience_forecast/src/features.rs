//! Feature engineering and modeling-frame preparation

use crate::config::DashboardConfig;
use crate::data::{CleanRow, CleanTable};
use crate::error::{ForecastError, Result};
use audience_math::rolling::RollingWindow;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// A cleaned row plus rolling and composite features
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeaturedRow {
    #[serde(flatten)]
    pub base: CleanRow,
    pub audience_7day_mean: f64,
    pub audience_7day_std: f64,
    pub engagement_score: f64,
    pub platform_encoded: usize,
}

/// Featured observations in timestamp order
#[derive(Debug, Clone, Default, Serialize)]
pub struct FeaturedTable {
    pub rows: Vec<FeaturedRow>,
}

impl FeaturedTable {
    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct platform labels, sorted
    pub fn platforms(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|r| r.base.platform.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// First and last calendar date covered
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.rows.iter().map(|r| r.base.timestamp).min()?;
        let last = self.rows.iter().map(|r| r.base.timestamp).max()?;
        Some((first.date(), last.date()))
    }

    /// Rows matching `filter`, order preserved
    pub fn filter(&self, filter: &FilterSpec) -> FeaturedTable {
        FeaturedTable {
            rows: self
                .rows
                .iter()
                .filter(|row| filter.matches(&row.base))
                .cloned()
                .collect(),
        }
    }
}

/// Selection of one platform and an inclusive calendar-date range
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct FilterSpec {
    pub platform: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl FilterSpec {
    /// Whether `row` passes every bound that is set
    pub fn matches(&self, row: &CleanRow) -> bool {
        let date = row.timestamp.date();
        self.platform.as_deref().map_or(true, |p| row.platform == p)
            && self.start_date.map_or(true, |start| date >= start)
            && self.end_date.map_or(true, |end| date <= end)
    }
}

/// Derives per-platform rolling statistics and composite scores
#[derive(Debug, Clone)]
pub struct FeatureEngineer {
    window: usize,
}

impl FeatureEngineer {
    /// Build a feature engineer from the pipeline configuration
    pub fn new(config: &DashboardConfig) -> Self {
        Self {
            window: config.rolling_window,
        }
    }

    /// Rolling window length in rows
    pub fn window(&self) -> usize {
        self.window
    }

    /// Recompute every derived column from scratch.
    ///
    /// Rolling statistics use up to `window` trailing rows of the same
    /// platform and need only one sample, so no row is left without a value.
    pub fn engineer_features(&self, table: &CleanTable) -> Result<FeaturedTable> {
        let codes: HashMap<&str, usize> = table
            .rows
            .iter()
            .map(|r| r.platform.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .enumerate()
            .map(|(code, label)| (label, code))
            .collect();

        let empty = RollingWindow::new(self.window)?;
        let mut windows: HashMap<&str, RollingWindow> = HashMap::new();
        let mut rows = Vec::with_capacity(table.len());

        for row in &table.rows {
            let window = windows
                .entry(row.platform.as_str())
                .or_insert_with(|| empty.clone());
            window.update(row.audience_count);
            let stats = window.stats()?;

            rows.push(FeaturedRow {
                audience_7day_mean: stats.mean,
                audience_7day_std: stats.std_dev,
                engagement_score: row.engagement_rate * row.conversion_rate,
                platform_encoded: codes[row.platform.as_str()],
                base: row.clone(),
            });
        }

        log::debug!(
            "Engineered features for {} rows across {} platform(s)",
            rows.len(),
            codes.len()
        );
        Ok(FeaturedTable { rows })
    }
}

/// Time-indexed columns handed to the forecasting backends
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModelingFrame {
    pub index: Vec<NaiveDateTime>,
    pub audience_count: Vec<f64>,
    pub is_weekend: Vec<u8>,
    pub is_prime_time: Vec<u8>,
    pub audience_7day_mean: Vec<f64>,
    pub audience_7day_std: Vec<f64>,
    pub engagement_score: Vec<f64>,
}

impl ModelingFrame {
    /// Build a frame from a bare audience series.
    ///
    /// The engineered columns are zero-filled; the forecasting backends only
    /// read `index` and `audience_count`.
    pub fn from_audience(index: Vec<NaiveDateTime>, audience_count: Vec<f64>) -> Result<Self> {
        if index.len() != audience_count.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: index.len(),
                got: audience_count.len(),
            });
        }

        let n = index.len();
        Ok(Self {
            index,
            audience_count,
            is_weekend: vec![0; n],
            is_prime_time: vec![0; n],
            audience_7day_mean: vec![0.0; n],
            audience_7day_std: vec![0.0; n],
            engagement_score: vec![0.0; n],
        })
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Check if the frame has no rows
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Last index timestamp
    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.index.last().copied()
    }

    /// Whether the index strictly increases
    pub fn is_strictly_increasing(&self) -> bool {
        self.index.windows(2).all(|w| w[0] < w[1])
    }

    fn push(&mut self, row: &FeaturedRow) {
        self.index.push(row.base.timestamp);
        self.audience_count.push(row.base.audience_count);
        self.is_weekend.push(row.base.is_weekend);
        self.is_prime_time.push(row.base.is_prime_time);
        self.audience_7day_mean.push(row.audience_7day_mean);
        self.audience_7day_std.push(row.audience_7day_std);
        self.engagement_score.push(row.engagement_score);
    }
}

/// Select the modeling columns, optionally for a single platform.
///
/// A platform that matches nothing yields an empty frame, not an error;
/// callers check [`ModelingFrame::is_empty`].
pub fn prepare_for_modeling(table: &FeaturedTable, platform: Option<&str>) -> ModelingFrame {
    let mut frame = ModelingFrame::default();
    for row in &table.rows {
        if platform.map_or(true, |p| row.base.platform == p) {
            frame.push(row);
        }
    }
    frame
}
