//! Company records and target declarations.
//!
//! These are the input and output value types of the engine: immutable
//! identity and fundamentals, optional historic disclosures, zero or more
//! target declarations, and the two projection sets the projectors attach.
//!
//! A record owns its historic data and its projections; nothing here is
//! shared between companies.

use serde::{Deserialize, Serialize};

use crate::quantity::Quantity;
use crate::scope::{Scope, ScopeMap};
use crate::timeseries::{FloatValue, ProjectionSeries, Year};

/// A single disclosed `(year, value)` observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Realization {
    pub year: Year,
    pub value: Quantity,
}

impl Realization {
    pub fn new(year: Year, value: Quantity) -> Self {
        Self { year, value }
    }
}

/// Historic disclosures for one company.
///
/// Production is a single unscoped series; emissions and emission
/// intensities are disclosed per scope. Any subset may be present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoricData {
    pub productions: Vec<Realization>,
    pub emissions: ScopeMap<Vec<Realization>>,
    pub emission_intensities: ScopeMap<Vec<Realization>>,
}

impl HistoricData {
    pub fn is_empty(&self) -> bool {
        self.productions.is_empty()
            && self.emissions.is_empty()
            && self.emission_intensities.is_empty()
    }
}

/// Whether a target constrains emission intensity or absolute emissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetKind {
    Intensity,
    Absolute,
}

/// A stated reduction or net-zero commitment for one scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub scope: Scope,
    pub kind: TargetKind,
    /// Year the reduction is measured against.
    pub base_year: Year,
    /// Value in the base year the reduction applies to.
    pub base_year_value: Quantity,
    pub start_year: Year,
    pub end_year: Year,
    /// Committed reduction relative to the base-year value, in [0, 1].
    pub reduction_fraction: FloatValue,
    pub netzero_year: Option<Year>,
}

impl Target {
    /// The committed value at the end year.
    pub fn end_value(&self) -> Quantity {
        self.base_year_value.scale(1.0 - self.reduction_fraction)
    }

    /// A 100% reduction commits the scope to net zero at the end year.
    pub fn is_netzero(&self) -> bool {
        self.reduction_fraction >= 1.0
    }
}

/// One company's full record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub company_id: String,
    pub company_name: String,
    pub sector: String,
    pub region: String,
    /// Production in the base year, in the company's production unit.
    pub base_year_production: Option<Quantity>,
    /// Base-year S1+S2 emissions.
    pub ghg_s1s2: Option<Quantity>,
    /// Base-year S3 emissions.
    pub ghg_s3: Option<Quantity>,
    pub historic_data: HistoricData,
    pub targets: Vec<Target>,
    /// Trend-based emission-intensity projections, per scope.
    pub projected_trajectories: Option<ScopeMap<ProjectionSeries>>,
    /// Target-based emission-intensity projections, per scope.
    pub projected_targets: Option<ScopeMap<ProjectionSeries>>,
}

impl CompanyRecord {
    pub fn new(
        company_id: impl Into<String>,
        company_name: impl Into<String>,
        sector: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            company_id: company_id.into(),
            company_name: company_name.into(),
            sector: sector.into(),
            region: region.into(),
            base_year_production: None,
            ghg_s1s2: None,
            ghg_s3: None,
            historic_data: HistoricData::default(),
            targets: Vec::new(),
            projected_trajectories: None,
            projected_targets: None,
        }
    }

    /// Most recent disclosed emission-intensity realization for a scope.
    pub fn last_intensity(&self, scope: Scope) -> Option<&Realization> {
        last_realization(self.historic_data.emission_intensities.get(scope)?)
    }

    /// Most recent disclosed emissions realization for a scope.
    pub fn last_emissions(&self, scope: Scope) -> Option<&Realization> {
        last_realization(self.historic_data.emissions.get(scope)?)
    }
}

fn last_realization(realizations: &[Realization]) -> Option<&Realization> {
    realizations
        .iter()
        .filter(|r| !r.value.is_nan())
        .max_by_key(|r| r.year)
}

/// Per-company base-year row consumed by the benchmark providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyBaseInfo {
    pub company_id: String,
    pub sector: String,
    pub region: String,
    pub base_year_production: Option<Quantity>,
    pub ghg_s1s2: Option<Quantity>,
    /// Base-year emission intensity, taken from the trajectory projection.
    pub base_ei: Option<Quantity>,
}

/// Fundamental company data exposed by the facade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyFundamentals {
    pub company_id: String,
    pub company_name: String,
    pub sector: String,
    pub region: String,
    pub base_year_production: Option<Quantity>,
    pub ghg_s1s2: Option<Quantity>,
    pub ghg_s3: Option<Quantity>,
    /// Base-year emission intensity per scope.
    pub base_ei: ScopeMap<Quantity>,
}
