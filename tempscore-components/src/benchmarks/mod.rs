//! Sector benchmark providers.
//!
//! Benchmark curves are keyed by (sector, region, scope). Providers own
//! their curves, are read-only after construction, and resolve a company's
//! region to `"Global"` when no curve exists for it.
//!
//! - [`production::ProductionBenchmarkProvider`]: cumulative production
//!   growth per sector, scaled to each company's base-year production.
//! - [`intensity::IntensityBenchmarkProvider`]: SDA decarbonization paths
//!   anchored to each company's base-year intensity.

pub mod intensity;
pub mod production;

pub use intensity::IntensityBenchmarkProvider;
pub use production::ProductionBenchmarkProvider;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use tempscore_core::scope::Scope;
use tempscore_core::timeseries::{FloatValue, Year};
use tempscore_core::units::Unit;

/// Fallback region when a company's region has no benchmark curve.
pub const GLOBAL_REGION: &str = "Global";

/// A single `(year, value)` point of a benchmark curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkProjection {
    pub year: Year,
    pub value: FloatValue,
}

/// One sector/region/scope benchmark curve.
///
/// Production curves hold dimensionless year-over-year growth deltas;
/// intensity curves hold absolute intensity values in `unit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkCurve {
    pub sector: String,
    pub region: String,
    pub scope: Scope,
    pub unit: Unit,
    pub projections: Vec<BenchmarkProjection>,
}

impl BenchmarkCurve {
    pub fn value_at(&self, year: Year) -> Option<FloatValue> {
        self.projections
            .iter()
            .find(|p| p.year == year)
            .map(|p| p.value)
    }
}

pub(crate) type CurveKey = (String, String, Scope);

pub(crate) fn index_curves(curves: Vec<BenchmarkCurve>) -> BTreeMap<CurveKey, BenchmarkCurve> {
    let mut indexed = BTreeMap::new();
    for curve in curves {
        let key = (curve.sector.clone(), curve.region.clone(), curve.scope);
        if indexed.insert(key, curve).is_some() {
            log::warn!("duplicate benchmark curve replaced an earlier one");
        }
    }
    indexed
}

/// Look up a curve, falling back to the `"Global"` region for the sector.
pub(crate) fn resolve<'a>(
    curves: &'a BTreeMap<CurveKey, BenchmarkCurve>,
    sector: &str,
    region: &str,
    scope: Scope,
) -> Option<&'a BenchmarkCurve> {
    if let Some(curve) = curves.get(&(sector.to_string(), region.to_string(), scope)) {
        return Some(curve);
    }
    let fallback = curves.get(&(sector.to_string(), GLOBAL_REGION.to_string(), scope));
    if fallback.is_some() {
        log::debug!(
            "no {} benchmark for region {:?}, falling back to {:?} for sector {:?}",
            scope,
            region,
            GLOBAL_REGION,
            sector
        );
    }
    fallback
}
