use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::source::DEFAULT_BASE_URL;
use crate::standings::{AggregateOptions, PointsSource};

/// Application configuration.
///
/// Every field is optional in the file; missing fields take their defaults.
///
/// Example YAML:
/// ```yaml
/// default_year: 2024
/// cache_ttl: 6h
/// concurrency: 8
/// points_source: reported
/// include_sprint_wins_podiums: true
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Season used when the year prompt gets a non-numeric answer
    pub default_year: i32,

    /// Base URL of the Ergast-compatible results API
    pub api_base_url: String,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// How long cached responses for the current season stay valid
    /// (humantime format, e.g. "12h", "30m")
    pub cache_ttl: String,

    /// Rounds fetched concurrently (1 = sequential)
    pub concurrency: usize,

    /// Recompute points from positions, or trust the source's points
    pub points_source: PointsSource,

    /// Count sprint wins and podiums in the trophy tallies
    pub include_sprint_wins_podiums: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_year: 2023,
            api_base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 30,
            cache_ttl: "12h".to_string(),
            concurrency: 4,
            points_source: PointsSource::Recompute,
            include_sprint_wins_podiums: false,
        }
    }
}

impl Config {
    pub fn cache_ttl(&self) -> Result<Duration> {
        humantime::parse_duration(self.cache_ttl.trim())
            .with_context(|| format!("Invalid cache_ttl '{}'", self.cache_ttl))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Aggregation options as configured; CLI flags are layered on top
    pub fn aggregate_options(&self) -> AggregateOptions {
        AggregateOptions {
            include_sprint_wins_podiums: self.include_sprint_wins_podiums,
            debug: false,
            points_source: self.points_source,
            concurrency: self.concurrency,
        }
    }
}
