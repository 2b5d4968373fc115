//! Trend-based emission-intensity projection.
//!
//! Turns noisy historic intensity series into smoothed curves extrapolated
//! through the target horizon:
//!
//! 1. Assemble the historic panel and derive missing intensities
//!    ([`crate::historic`]).
//! 2. Winsorize each reporting year at the configured percentiles across the
//!    cross-sectional distribution, within groups of rows sharing a unit.
//! 3. Collapse 2-year rolling year-over-year ratios to a single trend per
//!    series (median by default), clamped to the configured delta bounds.
//! 4. Fill internal gaps and extend past the last disclosure by compounding
//!    the trend.
//!
//! Companies whose trajectory set is already populated are skipped entirely,
//! so re-running the projector is a no-op. A company with no usable historic
//! data across all scopes fails the batch with an aggregated completeness
//! error; one with at least one resolvable scope proceeds and leaves the
//! other scopes empty.

use std::collections::BTreeMap;

use tempscore_core::company::CompanyRecord;
use tempscore_core::config::{ProjectionConfig, TrendMetric};
use tempscore_core::errors::EngineResult;
use tempscore_core::panel::{self, HistoricPanel, PanelKey, PanelVariable};
use tempscore_core::scope::{Scope, ScopeMap};
use tempscore_core::timeseries::{FloatValue, ProjectionSeries};

use crate::historic;

/// Batch projector of trajectory curves.
#[derive(Debug, Clone)]
pub struct TrajectoryProjector {
    config: ProjectionConfig,
}

impl TrajectoryProjector {
    pub fn new(config: ProjectionConfig) -> Self {
        Self { config }
    }

    /// Project trajectories for every company lacking them.
    pub fn project(&self, companies: &mut [CompanyRecord]) -> EngineResult<()> {
        let pending: Vec<usize> = companies
            .iter()
            .enumerate()
            .filter(|(_, company)| company.projected_trajectories.is_none())
            .map(|(index, _)| index)
            .collect();
        if pending.is_empty() {
            return Ok(());
        }

        let resolved = {
            let refs: Vec<&CompanyRecord> = pending.iter().map(|&i| &companies[i]).collect();
            historic::assemble(&refs, &self.config)?
        };
        let mut history = resolved.panel;
        let summed = resolved.summed_intensities;
        self.winsorize(&mut history);

        for &index in &pending {
            let id = companies[index].company_id.clone();
            let mut curves: ScopeMap<ProjectionSeries> = ScopeMap::new();

            for scope in Scope::ALL {
                let key = PanelKey::intensity(&id, scope);
                if summed.contains(&key) {
                    continue;
                }
                let Some(row) = history.row_index(&key) else {
                    continue;
                };
                let trend = self.trend(&history, row);
                if let Some(series) = self.extrapolate(&history, row, trend) {
                    curves.insert(scope, series);
                }
            }

            // Sum-derived compound scopes follow their constituents pointwise
            // instead of being extrapolated from the summed history.
            for scope in Scope::ALL {
                let key = PanelKey::intensity(&id, scope);
                if !summed.contains(&key) {
                    continue;
                }
                let (a, b) = scope
                    .constituents()
                    .expect("only compound scopes are sum-derived");
                let composed = match (curves.get(a), curves.get(b)) {
                    (Some(first), Some(second)) => Some(first.checked_add(second)?),
                    _ => None,
                };
                match composed {
                    Some(series) => {
                        curves.insert(scope, series);
                    }
                    None => {
                        // A constituent dropped out; the summed history row is
                        // still the best available signal.
                        if let Some(row) = history.row_index(&key) {
                            let trend = self.trend(&history, row);
                            if let Some(series) = self.extrapolate(&history, row, trend) {
                                curves.insert(scope, series);
                            }
                        }
                    }
                }
            }

            companies[index].projected_trajectories = Some(curves);
        }
        Ok(())
    }

    /// Clip each year column at the configured percentiles, within groups of
    /// intensity rows sharing a unit.
    fn winsorize(&self, history: &mut HistoricPanel) {
        let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for row in 0..history.n_rows() {
            if history.key(row).variable == PanelVariable::EmissionIntensities {
                groups
                    .entry(history.unit(row).to_string())
                    .or_default()
                    .push(row);
            }
        }
        for rows in groups.values() {
            history.winsorize_rows(rows, self.config.lower_percentile, self.config.upper_percentile);
        }
    }

    /// The single forward growth rate of a series: central tendency of its
    /// year-over-year ratios, clamped to the configured bounds.
    fn trend(&self, history: &HistoricPanel, row: usize) -> FloatValue {
        let values = history.row(row);
        let mut ratios = Vec::new();
        for col in 1..values.len() {
            let ratio = year_on_year_ratio(values[col - 1], values[col]);
            if !ratio.is_nan() {
                ratios.push(ratio);
            }
        }
        let central = match self.config.trend_metric {
            TrendMetric::Median => panel::median(&ratios),
            TrendMetric::Mean => panel::mean(&ratios),
        };
        central
            .unwrap_or(0.0)
            .clamp(self.config.lower_delta, self.config.upper_delta)
    }

    /// Compound the trend through internal gaps and beyond the last
    /// disclosure, restricted to the projection horizon.
    ///
    /// Returns `None` when the row contributes no usable value to the
    /// horizon, leaving the scope empty rather than fabricated.
    fn extrapolate(
        &self,
        history: &HistoricPanel,
        row: usize,
        trend: FloatValue,
    ) -> Option<ProjectionSeries> {
        let growth = 1.0 + trend;
        let mut series = ProjectionSeries::new(history.unit(row).clone(), self.config.base_year);
        let mut last: Option<(FloatValue, FloatValue)> = None;
        let mut usable = false;

        for year in history.first_year()..=self.config.target_year {
            let observed = history.get(row, year).unwrap_or(FloatValue::NAN);
            let (value, dispersion) = if !observed.is_nan() {
                let dispersion = history
                    .dispersion_row(row)
                    .zip(history.year_index(year))
                    .map(|(track, col)| track[col])
                    .filter(|d| !d.is_nan())
                    .unwrap_or(0.0);
                last = Some((observed, dispersion));
                (observed, dispersion)
            } else if let Some((value, dispersion)) = last {
                // Compounding keeps gap filling consistent with the forward
                // extension; dispersion scales with the value.
                let grown = (value * growth, dispersion * growth.abs());
                last = Some(grown);
                grown
            } else {
                (FloatValue::NAN, 0.0)
            };

            if year >= self.config.base_year {
                series.push(
                    year,
                    value,
                    history.has_uncertainty().then_some(dispersion),
                );
                usable |= !value.is_nan();
            }
        }
        usable.then_some(series)
    }
}

/// Year-over-year change ratio with explicit degenerate cases.
///
/// - either endpoint missing: undefined (NaN)
/// - both endpoints exactly zero: no change (0)
/// - non-negative to non-positive crossing: full decline (-1), avoiding a
///   sign-ambiguous division
/// - zero to positive: undefined (NaN)
fn year_on_year_ratio(previous: FloatValue, current: FloatValue) -> FloatValue {
    if previous.is_nan() || current.is_nan() {
        return FloatValue::NAN;
    }
    if previous == 0.0 && current == 0.0 {
        return 0.0;
    }
    if previous >= 0.0 && current <= 0.0 {
        return -1.0;
    }
    if previous == 0.0 {
        return FloatValue::NAN;
    }
    current / previous - 1.0
}
