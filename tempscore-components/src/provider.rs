//! Company data facade.
//!
//! Assembles the projectors and benchmark inputs into per-company query
//! surfaces. Construction validates that every company brings either
//! historic data or disclosed trajectory projections, then runs the
//! trajectory projector over the companies still lacking projections, so
//! every record a consumer sees carries a trajectory set.

use tempscore_core::company::{
    CompanyBaseInfo, CompanyFundamentals, CompanyRecord,
};
use tempscore_core::config::ProjectionConfig;
use tempscore_core::errors::{EngineError, EngineResult};
use tempscore_core::quantity::Quantity;
use tempscore_core::scope::{Scope, ScopeMap};
use tempscore_core::timeseries::ProjectionSeries;

use crate::benchmarks::ProductionBenchmarkProvider;
use crate::targets::TargetProjector;
use crate::trajectory::TrajectoryProjector;

/// Read surface over a validated batch of company records.
#[derive(Debug, Clone)]
pub struct CompanyDataProvider {
    companies: Vec<CompanyRecord>,
    config: ProjectionConfig,
}

impl CompanyDataProvider {
    /// Validate the batch and project trajectories where they are missing.
    ///
    /// Companies with neither historic data nor disclosed projections are
    /// reported together in one [`EngineError::DataCompleteness`] error.
    pub fn new(companies: Vec<CompanyRecord>, config: ProjectionConfig) -> EngineResult<Self> {
        config.validate()?;
        let without_data: Vec<String> = companies
            .iter()
            .filter(|company| {
                company.historic_data.is_empty() && company.projected_trajectories.is_none()
            })
            .map(|company| company.company_id.clone())
            .collect();
        if !without_data.is_empty() {
            return Err(EngineError::DataCompleteness(without_data));
        }

        let mut provider = Self { companies, config };
        TrajectoryProjector::new(config).project(&mut provider.companies)?;
        Ok(provider)
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    pub fn companies(&self) -> &[CompanyRecord] {
        &self.companies
    }

    fn lookup(&self, company_ids: &[&str]) -> EngineResult<Vec<&CompanyRecord>> {
        let mut found = Vec::with_capacity(company_ids.len());
        let mut missing = Vec::new();
        for &id in company_ids {
            match self.companies.iter().find(|c| c.company_id == id) {
                Some(company) => found.push(company),
                None => missing.push(id.to_string()),
            }
        }
        if !missing.is_empty() {
            return Err(EngineError::UnknownCompanies(missing));
        }
        Ok(found)
    }

    /// Full records for a list of company ids.
    pub fn company_data(&self, company_ids: &[&str]) -> EngineResult<Vec<&CompanyRecord>> {
        self.lookup(company_ids)
    }

    /// Identity, base-year production and emissions, and base-year intensity
    /// per scope.
    pub fn company_fundamentals(
        &self,
        company_ids: &[&str],
    ) -> EngineResult<Vec<CompanyFundamentals>> {
        Ok(self
            .lookup(company_ids)?
            .into_iter()
            .map(|company| {
                let mut base_ei = ScopeMap::new();
                for scope in Scope::ALL {
                    if let Some(ei) = self.base_ei(company, scope) {
                        base_ei.insert(scope, ei);
                    }
                }
                CompanyFundamentals {
                    company_id: company.company_id.clone(),
                    company_name: company.company_name.clone(),
                    sector: company.sector.clone(),
                    region: company.region.clone(),
                    base_year_production: company.base_year_production.clone(),
                    ghg_s1s2: company.ghg_s1s2.clone(),
                    ghg_s3: company.ghg_s3.clone(),
                    base_ei,
                }
            })
            .collect())
    }

    /// The per-company base-year rows both benchmark providers consume.
    ///
    /// The base-year intensity is read off the trajectory projection for the
    /// requested scope.
    pub fn intensity_and_production_at_base_year(
        &self,
        company_ids: &[&str],
        scope: Scope,
    ) -> EngineResult<Vec<CompanyBaseInfo>> {
        Ok(self
            .lookup(company_ids)?
            .into_iter()
            .map(|company| CompanyBaseInfo {
                company_id: company.company_id.clone(),
                sector: company.sector.clone(),
                region: company.region.clone(),
                base_year_production: company.base_year_production.clone(),
                ghg_s1s2: company.ghg_s1s2.clone(),
                base_ei: self.base_ei(company, scope),
            })
            .collect())
    }

    /// Trajectory projection sets, one per requested company.
    pub fn projected_trajectories(
        &self,
        company_ids: &[&str],
    ) -> EngineResult<Vec<&ScopeMap<ProjectionSeries>>> {
        Ok(self
            .lookup(company_ids)?
            .into_iter()
            .map(|company| {
                company
                    .projected_trajectories
                    .as_ref()
                    .expect("trajectories are populated at construction")
            })
            .collect())
    }

    /// Target projection sets; `None` for companies that have not been
    /// target-projected yet.
    pub fn projected_targets(
        &self,
        company_ids: &[&str],
    ) -> EngineResult<Vec<Option<&ScopeMap<ProjectionSeries>>>> {
        Ok(self
            .lookup(company_ids)?
            .into_iter()
            .map(|company| company.projected_targets.as_ref())
            .collect())
    }

    /// Run the target projector over companies lacking target projections.
    pub fn project_targets(
        &mut self,
        production: &ProductionBenchmarkProvider,
    ) -> EngineResult<()> {
        TargetProjector::new(self.config).project(&mut self.companies, production)
    }

    fn base_ei(&self, company: &CompanyRecord, scope: Scope) -> Option<Quantity> {
        company
            .projected_trajectories
            .as_ref()?
            .get(scope)?
            .quantity(self.config.base_year)
    }
}
