//! SDA intensity benchmark provider.
//!
//! The Sectoral Decarbonization Approach prescribes, per sector and region,
//! how emission intensity should fall between the base year and the target
//! year. The provider reshapes each benchmark curve into a normalized
//! decarbonization path
//!
//! `d(y) = (ei(y) - ei(T)) / (ei(B) - ei(T))`
//!
//! and rescales it to a company's own base-year intensity:
//!
//! `path(y) = d(y) * (company_base_ei - ei(T)) + ei(T)`
//!
//! so the company follows the benchmark's shape while converging to the
//! benchmark's target-year intensity. A benchmark whose base and target
//! intensities coincide has no defined path; the result is NaN and
//! propagates.

use std::collections::BTreeMap;

use tempscore_core::company::CompanyBaseInfo;
use tempscore_core::config::ProjectionConfig;
use tempscore_core::errors::{EngineError, EngineResult};
use tempscore_core::quantity::Quantity;
use tempscore_core::scope::Scope;
use tempscore_core::timeseries::{FloatValue, ProjectionSeries};
use tempscore_core::units::Unit;

use super::{index_curves, resolve, BenchmarkCurve, CurveKey};

/// Read-only provider of SDA decarbonization benchmarks.
///
/// Alongside its curves the provider carries the scenario metadata of the
/// benchmark publication: the temperature the benchmark is aligned with, the
/// global emissions budget it assumes, and whether AFOLU emissions are
/// included.
#[derive(Debug, Clone)]
pub struct IntensityBenchmarkProvider {
    curves: BTreeMap<CurveKey, BenchmarkCurve>,
    config: ProjectionConfig,
    benchmark_temperature: FloatValue,
    benchmark_global_budget: Quantity,
    is_afolu_included: bool,
}

impl IntensityBenchmarkProvider {
    pub fn new(
        curves: Vec<BenchmarkCurve>,
        benchmark_temperature: FloatValue,
        benchmark_global_budget: Quantity,
        is_afolu_included: bool,
        config: ProjectionConfig,
    ) -> Self {
        Self {
            curves: index_curves(curves),
            config,
            benchmark_temperature,
            benchmark_global_budget,
            is_afolu_included,
        }
    }

    /// Temperature (degC) the benchmark scenario is aligned with.
    pub fn benchmark_temperature(&self) -> FloatValue {
        self.benchmark_temperature
    }

    /// Global emissions budget assumed by the benchmark scenario.
    pub fn benchmark_global_budget(&self) -> &Quantity {
        &self.benchmark_global_budget
    }

    pub fn is_afolu_included(&self) -> bool {
        self.is_afolu_included
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    /// Company-anchored SDA benchmark paths, one per input row.
    ///
    /// Fails only on a unit mismatch between a company's base intensity and
    /// its benchmark curve; an unresolvable sector or a degenerate benchmark
    /// yields a NaN path instead.
    pub fn sda_intensity_benchmarks(
        &self,
        company_info: &[CompanyBaseInfo],
        scope: Scope,
    ) -> EngineResult<Vec<ProjectionSeries>> {
        company_info
            .iter()
            .map(|info| self.single_company(info, scope))
            .collect()
    }

    fn single_company(
        &self,
        info: &CompanyBaseInfo,
        scope: Scope,
    ) -> EngineResult<ProjectionSeries> {
        let Some(curve) = resolve(&self.curves, &info.sector, &info.region, scope) else {
            log::warn!(
                "no intensity benchmark for sector {:?} (company {}); benchmark path is NaN",
                info.sector,
                info.company_id
            );
            let unit = info
                .base_ei
                .as_ref()
                .map(|ei| ei.unit().clone())
                .unwrap_or_else(Unit::dimensionless);
            return Ok(self.nan_series(unit));
        };

        if let Some(base_ei) = &info.base_ei {
            if base_ei.unit() != &curve.unit {
                return Err(EngineError::UnitMismatch {
                    expected: curve.unit.to_string(),
                    actual: base_ei.unit().to_string(),
                });
            }
        }
        let company_base = info
            .base_ei
            .as_ref()
            .map(|ei| ei.magnitude())
            .unwrap_or(FloatValue::NAN);

        let first = curve
            .value_at(self.config.base_year)
            .unwrap_or(FloatValue::NAN);
        let last = curve
            .value_at(self.config.target_year)
            .unwrap_or(FloatValue::NAN);
        let span = first - last;

        let mut series = ProjectionSeries::new(curve.unit.clone(), self.config.base_year);
        for year in self.config.horizon() {
            let benchmark = curve.value_at(year).unwrap_or(FloatValue::NAN);
            // Degenerate benchmark (base == target): the path is undefined
            let path = if span == 0.0 {
                FloatValue::NAN
            } else {
                (benchmark - last) / span
            };
            series.push(year, path * (company_base - last) + last, None);
        }
        Ok(series)
    }

    fn nan_series(&self, unit: Unit) -> ProjectionSeries {
        ProjectionSeries::from_values(
            unit,
            self.config.base_year,
            vec![FloatValue::NAN; self.config.horizon_len()],
        )
    }
}
