//! Caller-owned memoization of pipeline stages
//!
//! Entries are keyed by a SHA-256 fingerprint of the uploaded bytes, the
//! pipeline configuration and (for forecasts) the request parameters, so a
//! re-upload of identical content skips preprocessing and a repeated request
//! skips refitting.

use crate::config::DashboardConfig;
use crate::error::Result;
use crate::features::FeaturedTable;
use crate::session::{ForecastOutcome, ForecastRequest};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Hex SHA-256 of raw input bytes
pub fn content_hash(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Key for the featured table derived from `content` under `config`
pub fn dataset_key(content: &str, config: &DashboardConfig) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("content:{};", content));
    hasher.update(format!("knn_neighbors:{};", config.knn_neighbors));
    hasher.update(format!("rolling_window:{};", config.rolling_window));
    hasher.update(format!(
        "prime_time:{}-{};",
        config.prime_time_start, config.prime_time_end
    ));
    hex::encode(hasher.finalize())
}

/// Key for a forecast of `request` over the dataset behind `dataset`
pub fn forecast_key(dataset: &str, request: &ForecastRequest) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("dataset:{};", dataset));
    hasher.update(format!("platform:{};", request.platform.as_deref().unwrap_or("*")));
    hasher.update("start:");
    if let Some(start) = request.start_date {
        hasher.update(start.to_string());
    }
    hasher.update(";end:");
    if let Some(end) = request.end_date {
        hasher.update(end.to_string());
    }
    hasher.update(format!(";model:{};horizon:{};", request.model_type, request.horizon));
    hex::encode(hasher.finalize())
}

/// Hit and miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
}

/// Memoized featured tables and forecasts
#[derive(Debug, Default)]
pub struct PipelineCache {
    datasets: HashMap<String, FeaturedTable>,
    forecasts: HashMap<String, ForecastOutcome>,
    stats: CacheStats,
}

impl PipelineCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached featured table for `key`, computing and storing it on a miss.
    ///
    /// A failing `compute` stores nothing.
    pub fn dataset_or_try_insert<F>(&mut self, key: &str, compute: F) -> Result<&FeaturedTable>
    where
        F: FnOnce() -> Result<FeaturedTable>,
    {
        if self.datasets.contains_key(key) {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
            let table = compute()?;
            self.datasets.insert(key.to_string(), table);
        }
        Ok(&self.datasets[key])
    }

    /// Cached forecast for `key`, if any
    pub fn forecast(&mut self, key: &str) -> Option<&ForecastOutcome> {
        match self.forecasts.get(key) {
            Some(outcome) => {
                self.stats.hits += 1;
                Some(outcome)
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Store a forecast under `key`
    pub fn insert_forecast(&mut self, key: String, outcome: ForecastOutcome) {
        self.forecasts.insert(key, outcome);
    }

    /// Number of cached entries of either kind
    pub fn len(&self) -> usize {
        self.datasets.len() + self.forecasts.len()
    }

    /// Check if nothing is cached
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hit and miss counts so far
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Drop every entry; counters are kept
    pub fn clear(&mut self) {
        self.datasets.clear();
        self.forecasts.clear();
    }
}
