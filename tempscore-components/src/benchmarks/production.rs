//! Production benchmark provider.
//!
//! Benchmark tables hold year-over-year production growth deltas per
//! (sector, region). Compounding them gives a cumulative growth index that
//! starts at 1.0 in the base year; multiplying by a company's base-year
//! production yields its projected production through the target horizon.
//!
//! Production benchmarks are labelled S1S2 in the input tables; the label
//! has nothing to do with a company's emission scopes and is currently the
//! only one populated.

use std::collections::BTreeMap;

use tempscore_core::company::CompanyBaseInfo;
use tempscore_core::config::ProjectionConfig;
use tempscore_core::scope::Scope;
use tempscore_core::timeseries::{FloatValue, ProjectionSeries};
use tempscore_core::units::Unit;

use super::{index_curves, resolve, BenchmarkCurve, CurveKey};

/// Read-only provider of sector production growth curves.
#[derive(Debug, Clone)]
pub struct ProductionBenchmarkProvider {
    curves: BTreeMap<CurveKey, BenchmarkCurve>,
    config: ProjectionConfig,
}

impl ProductionBenchmarkProvider {
    pub fn new(curves: Vec<BenchmarkCurve>, config: ProjectionConfig) -> Self {
        Self {
            curves: index_curves(curves),
            config,
        }
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    /// Cumulative growth index for a sector/region, 1.0 at the base year.
    ///
    /// `index[y+1] = index[y] * (1 + delta[y+1])`; the result covers exactly
    /// the configured horizon. Years the benchmark table does not cover
    /// compound as NaN.
    pub fn projected_production(
        &self,
        sector: &str,
        region: &str,
        scope: Scope,
    ) -> Option<ProjectionSeries> {
        let curve = resolve(&self.curves, sector, region, scope)?;
        let mut series = ProjectionSeries::new(Unit::dimensionless(), self.config.base_year);
        let mut index = 1.0;
        series.push(self.config.base_year, index, None);
        for year in (self.config.base_year + 1)..=self.config.target_year {
            let delta = curve.value_at(year).unwrap_or(FloatValue::NAN);
            index *= 1.0 + delta;
            series.push(year, index, None);
        }
        Some(series)
    }

    /// Projected production per company: base-year production scaled by the
    /// sector/region growth index.
    ///
    /// A company with no resolvable benchmark or no base-year production
    /// yields a NaN series and a warning, never a failure.
    pub fn company_projected_production(
        &self,
        company_info: &[CompanyBaseInfo],
    ) -> Vec<ProjectionSeries> {
        company_info
            .iter()
            .map(|info| self.single_company(info))
            .collect()
    }

    fn single_company(&self, info: &CompanyBaseInfo) -> ProjectionSeries {
        let index = self.projected_production(&info.sector, &info.region, Scope::S1S2);
        match (&info.base_year_production, index) {
            (Some(base), Some(index)) => {
                let mut series =
                    ProjectionSeries::new(base.unit().clone(), self.config.base_year);
                for (year, factor) in index.iter() {
                    let scaled = base.scale(factor);
                    series.push(year, scaled.magnitude(), scaled.uncertainty());
                }
                series
            }
            (None, _) => {
                log::warn!(
                    "missing base year production for company {}; projected production is NaN",
                    info.company_id
                );
                self.nan_series(Unit::dimensionless())
            }
            (Some(base), None) => {
                log::warn!(
                    "no production benchmark for sector {:?} (company {}); projected production is NaN",
                    info.sector,
                    info.company_id
                );
                self.nan_series(base.unit().clone())
            }
        }
    }

    fn nan_series(&self, unit: Unit) -> ProjectionSeries {
        ProjectionSeries::from_values(
            unit,
            self.config.base_year,
            vec![FloatValue::NAN; self.config.horizon_len()],
        )
    }
}
