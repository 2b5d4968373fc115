//! Projection configuration.
//!
//! All knobs the engine recognizes live in one construction-time struct with
//! defaults matching the standard scoring setup: a 2019 base year, a 2050
//! horizon, 10/90 winsorization bounds and a [-15%, +3%] clamp on the
//! extracted trend.

use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, EngineResult};
use crate::timeseries::{FloatValue, Year};

/// Central tendency used when collapsing year-over-year ratios to a trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendMetric {
    Median,
    Mean,
}

/// Configuration for both projectors and the benchmark providers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// First year of the projection horizon.
    pub base_year: Year,
    /// Last year of the projection horizon.
    pub target_year: Year,
    /// Lower winsorization bound, in [0, 1].
    pub lower_percentile: FloatValue,
    /// Upper winsorization bound, in [0, 1].
    pub upper_percentile: FloatValue,
    /// Lower clamp on the extracted trend (annual rate).
    pub lower_delta: FloatValue,
    /// Upper clamp on the extracted trend (annual rate).
    pub upper_delta: FloatValue,
    /// Central tendency applied to year-over-year ratios.
    pub trend_metric: TrendMetric,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            base_year: 2019,
            target_year: 2050,
            lower_percentile: 0.1,
            upper_percentile: 0.9,
            lower_delta: -0.15,
            upper_delta: 0.03,
            trend_metric: TrendMetric::Median,
        }
    }
}

impl ProjectionConfig {
    /// Parse a configuration document, validating the result.
    pub fn from_toml(document: &str) -> EngineResult<Self> {
        let config: Self = toml::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.target_year <= self.base_year {
            return Err(EngineError::InvalidConfig(format!(
                "target_year {} must lie after base_year {}",
                self.target_year, self.base_year
            )));
        }
        if !(0.0..=1.0).contains(&self.lower_percentile)
            || !(0.0..=1.0).contains(&self.upper_percentile)
            || self.lower_percentile >= self.upper_percentile
        {
            return Err(EngineError::InvalidConfig(format!(
                "percentile bounds [{}, {}] must be ordered and lie in [0, 1]",
                self.lower_percentile, self.upper_percentile
            )));
        }
        if self.lower_delta >= self.upper_delta {
            return Err(EngineError::InvalidConfig(format!(
                "delta bounds [{}, {}] must be ordered",
                self.lower_delta, self.upper_delta
            )));
        }
        Ok(())
    }

    /// Years of the projection horizon, base through target inclusive.
    pub fn horizon(&self) -> std::ops::RangeInclusive<Year> {
        self.base_year..=self.target_year
    }

    pub fn horizon_len(&self) -> usize {
        (self.target_year - self.base_year + 1) as usize
    }
}
