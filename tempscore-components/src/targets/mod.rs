//! Target-based emission-intensity projection.
//!
//! Converts a company's heterogeneous, possibly overlapping, possibly
//! absolute-valued targets into one continuous intensity curve per scope,
//! anchored at the base year and held flat after the last commitment
//! through the target horizon.
//!
//! Per scope the projector:
//! 1. merge-orders the intensity and absolute targets by end year, with the
//!    documented tie-breaks (an identical start/end pair is won by the
//!    intensity target, with a warning; an unorderable pair is rejected),
//! 2. anchors each target at the tail of the previous segment, the most
//!    recent historic realization, or the target's own declared base value,
//! 3. converts absolute anchors and goals to intensities through the
//!    benchmark production projection,
//! 4. interpolates with [`compute_cagr`],
//! 5. appends a final segment to zero when an inferred net-zero year lies
//!    beyond the last target, summing constituent paths instead for a
//!    compound scope whose constituents already reach zero in time.
//!
//! Missing production for an absolute target is a hard error naming the
//! company; any other failure degrades that company to an empty target set
//! so one bad record cannot abort the batch.

mod cagr;
mod netzero;

pub use cagr::compute_cagr;
pub use netzero::calculate_net_zero_years;

use tempscore_core::company::{CompanyBaseInfo, CompanyRecord, Target, TargetKind};
use tempscore_core::config::ProjectionConfig;
use tempscore_core::errors::{EngineError, EngineResult};
use tempscore_core::quantity::Quantity;
use tempscore_core::scope::{Scope, ScopeMap};
use tempscore_core::timeseries::{FloatValue, ProjectionSeries, Year};

use crate::benchmarks::ProductionBenchmarkProvider;

/// Batch projector of target curves.
#[derive(Debug, Clone)]
pub struct TargetProjector {
    config: ProjectionConfig,
}

impl TargetProjector {
    pub fn new(config: ProjectionConfig) -> Self {
        Self { config }
    }

    /// Project target curves for every company.
    ///
    /// Recomputes deterministically from the records; unexpected per-company
    /// failures are logged and degrade that company to an empty set.
    pub fn project(
        &self,
        companies: &mut [CompanyRecord],
        production: &ProductionBenchmarkProvider,
    ) -> EngineResult<()> {
        for company in companies.iter_mut() {
            match self.project_company(company, production) {
                Ok(curves) => company.projected_targets = Some(curves),
                Err(
                    error @ (EngineError::MissingBaseData { .. }
                    | EngineError::UnsupportedTargetCombination { .. }),
                ) => return Err(error),
                Err(error) => {
                    log::error!(
                        "target projection failed for company {}: {}",
                        company.company_id,
                        error
                    );
                    company.projected_targets = Some(ScopeMap::new());
                }
            }
        }
        Ok(())
    }

    fn project_company(
        &self,
        company: &CompanyRecord,
        production_provider: &ProductionBenchmarkProvider,
    ) -> EngineResult<ScopeMap<ProjectionSeries>> {
        let netzero_years = calculate_net_zero_years(&company.targets);
        let production = self.company_production(company, production_provider);
        let mut curves: ScopeMap<ProjectionSeries> = ScopeMap::new();

        for scope in Scope::ALL {
            let ordered = merge_order_targets(company, scope)?;
            let netzero_year = netzero_years.get(scope).copied();
            let series = if ordered.is_empty() {
                None
            } else {
                self.chain_targets(
                    company,
                    scope,
                    &ordered,
                    netzero_year,
                    production.as_ref(),
                    &curves,
                )?
            };
            let series = match series {
                Some(series) => Some(series),
                None => self.synthesize_netzero_only(company, scope, netzero_year)?,
            };
            if let Some(mut series) = series {
                series.truncate_before(self.config.base_year);
                series.pad_flat_start(self.config.base_year);
                series.extend_flat_to(self.config.target_year);
                if !series.is_empty() {
                    curves.insert(scope, series);
                }
            }
        }

        self.backfill_compound(&mut curves, Scope::S1S2)?;
        self.backfill_compound(&mut curves, Scope::S1S2S3)?;
        Ok(curves)
    }

    /// Walk the ordered targets, chaining CAGR segments.
    ///
    /// Returns `None` when every target ends at or before its anchor (all
    /// stale), letting the caller fall back to net-zero synthesis.
    fn chain_targets(
        &self,
        company: &CompanyRecord,
        scope: Scope,
        targets: &[Target],
        netzero_year: Option<Year>,
        production: Option<&ProjectionSeries>,
        curves: &ScopeMap<ProjectionSeries>,
    ) -> EngineResult<Option<ProjectionSeries>> {
        let mut series: Option<ProjectionSeries> = None;
        for target in targets {
            let (anchor_year, anchor) = match series.as_ref().and_then(tail) {
                Some(tail) => tail,
                None => self.initial_anchor(company, scope, target, production)?,
            };
            if target.end_year <= anchor_year {
                continue;
            }
            let goal = match target.kind {
                TargetKind::Intensity => target.end_value(),
                TargetKind::Absolute => {
                    let production = self.require_production(company, scope, production)?;
                    absolute_to_intensity(&target.end_value(), target.end_year, production)
                }
            };
            let segment = compute_cagr(anchor_year, &anchor, target.end_year, &goal)?;
            series = Some(match series {
                None => segment,
                Some(mut existing) => {
                    append_segment(&mut existing, &segment);
                    existing
                }
            });
        }

        let Some(mut series) = series else {
            return Ok(None);
        };
        self.append_netzero_tail(scope, &mut series, netzero_year, curves)?;
        Ok(Some(series))
    }

    /// Anchor for the first segment of a scope: the most recent historic
    /// realization, or the target's own declared base value.
    fn initial_anchor(
        &self,
        company: &CompanyRecord,
        scope: Scope,
        target: &Target,
        production: Option<&ProjectionSeries>,
    ) -> EngineResult<(Year, Quantity)> {
        match target.kind {
            TargetKind::Intensity => match company.last_intensity(scope) {
                Some(realization) => Ok((realization.year, realization.value.clone())),
                None => Ok((target.base_year, target.base_year_value.clone())),
            },
            TargetKind::Absolute => {
                let production = self.require_production(company, scope, production)?;
                let (year, absolute) = match company.last_emissions(scope) {
                    Some(realization) => (realization.year, realization.value.clone()),
                    None => (target.base_year, target.base_year_value.clone()),
                };
                Ok((year, absolute_to_intensity(&absolute, year, production)))
            }
        }
    }

    fn require_production<'a>(
        &self,
        company: &CompanyRecord,
        scope: Scope,
        production: Option<&'a ProjectionSeries>,
    ) -> EngineResult<&'a ProjectionSeries> {
        production.ok_or_else(|| EngineError::MissingBaseData {
            company_id: company.company_id.clone(),
            detail: format!(
                "base year production is required to convert the absolute {} target",
                scope
            ),
        })
    }

    /// Append the final descent to zero when a net-zero commitment extends
    /// beyond the last explicit target.
    ///
    /// For a compound scope whose constituent paths both reach zero no later
    /// than the commitment, the tail is the pointwise sum of the constituent
    /// paths instead of an independently derived descent.
    fn append_netzero_tail(
        &self,
        scope: Scope,
        series: &mut ProjectionSeries,
        netzero_year: Option<Year>,
        curves: &ScopeMap<ProjectionSeries>,
    ) -> EngineResult<()> {
        let Some(netzero_year) = netzero_year else {
            return Ok(());
        };
        let last_year = match series.last_year() {
            Some(year) if year < netzero_year => year,
            _ => return Ok(()),
        };

        let constituents = scope.constituents().and_then(|(a, b)| {
            let first = curves.get(a)?;
            let second = curves.get(b)?;
            let first_zero = year_reaching_zero(first)?;
            let second_zero = year_reaching_zero(second)?;
            (first_zero <= netzero_year && second_zero <= netzero_year).then_some((first, second))
        });

        match constituents {
            Some((first, second)) => {
                if first.unit() != series.unit() || second.unit() != series.unit() {
                    return Err(EngineError::UnitMismatch {
                        expected: series.unit().to_string(),
                        actual: first.unit().to_string(),
                    });
                }
                for year in (last_year + 1)..=self.config.target_year {
                    let a = first.value(year).unwrap_or(FloatValue::NAN);
                    let b = second.value(year).unwrap_or(FloatValue::NAN);
                    let dispersion = match (first.dispersion(year), second.dispersion(year)) {
                        (None, None) => None,
                        (a, b) => {
                            let a = a.unwrap_or(0.0);
                            let b = b.unwrap_or(0.0);
                            Some((a * a + b * b).sqrt())
                        }
                    };
                    series.push(year, a + b, dispersion);
                }
            }
            None => {
                let anchor = series.last_quantity().expect("series is non-empty");
                let zero = Quantity::new(0.0, series.unit().clone());
                let segment = compute_cagr(last_year, &anchor, netzero_year, &zero)?;
                append_segment(series, &segment);
            }
        }
        Ok(())
    }

    /// Path for a scope with no explicit targets but an inferred net-zero
    /// year: straight descent from the last historic realization.
    fn synthesize_netzero_only(
        &self,
        company: &CompanyRecord,
        scope: Scope,
        netzero_year: Option<Year>,
    ) -> EngineResult<Option<ProjectionSeries>> {
        let Some(netzero_year) = netzero_year else {
            return Ok(None);
        };
        let Some(realization) = company.last_intensity(scope) else {
            return Ok(None);
        };
        let zero = Quantity::new(0.0, realization.value.unit().clone());
        let series = compute_cagr(realization.year, &realization.value, netzero_year, &zero)?;
        Ok(Some(series))
    }

    /// S1 + S2 -> S1S2 and S1S2 + S3 -> S1S2S3 when the compound itself did
    /// not resolve.
    fn backfill_compound(
        &self,
        curves: &mut ScopeMap<ProjectionSeries>,
        scope: Scope,
    ) -> EngineResult<()> {
        if curves.contains(scope) {
            return Ok(());
        }
        let (a, b) = scope
            .constituents()
            .expect("backfill only applies to compound scopes");
        let composed = match (curves.get(a), curves.get(b)) {
            (Some(first), Some(second)) => Some(first.checked_add(second)?),
            _ => None,
        };
        if let Some(series) = composed {
            curves.insert(scope, series);
        }
        Ok(())
    }

    /// The company's benchmark-projected production, used to convert
    /// absolute targets to intensities. `None` without a base-year
    /// production.
    fn company_production(
        &self,
        company: &CompanyRecord,
        provider: &ProductionBenchmarkProvider,
    ) -> Option<ProjectionSeries> {
        let base = company.base_year_production.clone()?;
        let info = CompanyBaseInfo {
            company_id: company.company_id.clone(),
            sector: company.sector.clone(),
            region: company.region.clone(),
            base_year_production: Some(base),
            ghg_s1s2: company.ghg_s1s2.clone(),
            base_ei: None,
        };
        provider
            .company_projected_production(&[info])
            .into_iter()
            .next()
    }
}

fn tail(series: &ProjectionSeries) -> Option<(Year, Quantity)> {
    let year = series.last_year()?;
    Some((year, series.quantity(year)?))
}

fn append_segment(series: &mut ProjectionSeries, segment: &ProjectionSeries) {
    for (year, value) in segment.iter() {
        if year >= series.next_year() {
            series.push(year, value, segment.dispersion(year));
        }
    }
}

fn year_reaching_zero(series: &ProjectionSeries) -> Option<Year> {
    series
        .iter()
        .find(|(_, value)| value.abs() <= 1e-12)
        .map(|(year, _)| year)
}

/// Convert an absolute emissions quantity to an intensity using the
/// projected production of the matching year (clamped to the projection
/// span for pre-base-year anchors).
fn absolute_to_intensity(
    value: &Quantity,
    year: Year,
    production: &ProjectionSeries,
) -> Quantity {
    let last = production.last_year().unwrap_or(production.first_year());
    let clamped = year.clamp(production.first_year(), last);
    match production.quantity(clamped) {
        Some(units) => value.divide(&units),
        None => Quantity::nan(value.unit().clone()),
    }
}

/// Deduplicate and order a scope's targets for sequential chaining.
///
/// Within a kind, the most recently declared target wins an identical
/// (start, end) pair. Across kinds an identical pair is won by the intensity
/// target with a warning. The remainder merges by increasing end year; an
/// end-year tie between kinds prefers the target beginning at or after the
/// pending anchor year and is rejected as unsupported when that tie-break
/// cannot decide.
fn merge_order_targets(company: &CompanyRecord, scope: Scope) -> EngineResult<Vec<Target>> {
    let mut intensity: Vec<Target> = Vec::new();
    let mut absolute: Vec<Target> = Vec::new();
    for target in company.targets.iter().filter(|t| t.scope == scope) {
        let bucket = match target.kind {
            TargetKind::Intensity => &mut intensity,
            TargetKind::Absolute => &mut absolute,
        };
        match bucket
            .iter_mut()
            .find(|t| t.start_year == target.start_year && t.end_year == target.end_year)
        {
            Some(existing) => *existing = target.clone(),
            None => bucket.push(target.clone()),
        }
    }

    absolute.retain(|a| {
        let shadowed = intensity
            .iter()
            .any(|i| i.start_year == a.start_year && i.end_year == a.end_year);
        if shadowed {
            log::warn!(
                "company {} declares both an intensity and an absolute {} target over {}-{}; keeping the intensity target",
                company.company_id,
                scope,
                a.start_year,
                a.end_year
            );
        }
        !shadowed
    });

    // Within a kind an end-year tie is won by the later start year: it sorts
    // first, and the earlier-start twin is dropped by the stale-anchor guard
    intensity.sort_by_key(|t| (t.end_year, std::cmp::Reverse(t.start_year)));
    absolute.sort_by_key(|t| (t.end_year, std::cmp::Reverse(t.start_year)));

    let mut merged = Vec::with_capacity(intensity.len() + absolute.len());
    let mut pending_year = Year::MIN;
    let mut intensity = intensity.into_iter().peekable();
    let mut absolute = absolute.into_iter().peekable();
    loop {
        let next = match (intensity.peek(), absolute.peek()) {
            (None, None) => break,
            (Some(_), None) => intensity.next().expect("peeked"),
            (None, Some(_)) => absolute.next().expect("peeked"),
            (Some(i), Some(a)) => {
                if i.end_year < a.end_year {
                    intensity.next().expect("peeked")
                } else if a.end_year < i.end_year {
                    absolute.next().expect("peeked")
                } else {
                    let intensity_fits = i.start_year >= pending_year;
                    let absolute_fits = a.start_year >= pending_year;
                    match (intensity_fits, absolute_fits) {
                        (true, false) => intensity.next().expect("peeked"),
                        (false, true) => absolute.next().expect("peeked"),
                        _ => {
                            return Err(EngineError::UnsupportedTargetCombination {
                                company_id: company.company_id.clone(),
                                scope,
                                year: i.end_year,
                            })
                        }
                    }
                }
            }
        };
        pending_year = next.end_year;
        merged.push(next);
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmarks::{BenchmarkCurve, BenchmarkProjection, GLOBAL_REGION};
    use is_close::is_close;
    use tempscore_core::company::Realization;

    fn config() -> ProjectionConfig {
        ProjectionConfig {
            base_year: 2020,
            target_year: 2050,
            ..Default::default()
        }
    }

    fn flat_production_provider() -> ProductionBenchmarkProvider {
        let curve = BenchmarkCurve {
            sector: "Electricity Utilities".to_string(),
            region: GLOBAL_REGION.to_string(),
            scope: Scope::S1S2,
            unit: tempscore_core::units::Unit::dimensionless(),
            projections: (2021..=2050)
                .map(|year| BenchmarkProjection { year, value: 0.0 })
                .collect(),
        };
        ProductionBenchmarkProvider::new(vec![curve], config())
    }

    fn company() -> CompanyRecord {
        let mut company = CompanyRecord::new("C1", "One", "Electricity Utilities", "Europe");
        company.base_year_production = Some(Quantity::parse(200.0, "TWh").unwrap());
        company
    }

    fn intensity_target(
        scope: Scope,
        start: Year,
        end: Year,
        base_value: FloatValue,
        reduction: FloatValue,
    ) -> Target {
        Target {
            scope,
            kind: TargetKind::Intensity,
            base_year: 2020,
            base_year_value: Quantity::parse(base_value, "t CO2 / TWh").unwrap(),
            start_year: start,
            end_year: end,
            reduction_fraction: reduction,
            netzero_year: None,
        }
    }

    fn absolute_target(
        scope: Scope,
        start: Year,
        end: Year,
        base_value: FloatValue,
        reduction: FloatValue,
    ) -> Target {
        Target {
            scope,
            kind: TargetKind::Absolute,
            base_year: 2020,
            base_year_value: Quantity::parse(base_value, "t CO2").unwrap(),
            start_year: start,
            end_year: end,
            reduction_fraction: reduction,
            netzero_year: None,
        }
    }

    fn project(mut record: CompanyRecord) -> EngineResult<CompanyRecord> {
        let provider = flat_production_provider();
        let mut companies = vec![record.clone()];
        TargetProjector::new(config()).project(&mut companies, &provider)?;
        record = companies.pop().expect("one company in, one out");
        Ok(record)
    }

    #[test]
    fn test_intensity_target_from_declared_base() {
        let mut record = company();
        record
            .targets
            .push(intensity_target(Scope::S1S2, 2020, 2030, 0.5, 0.5));
        let record = project(record).unwrap();

        let curves = record.projected_targets.as_ref().unwrap();
        let series = curves.get(Scope::S1S2).unwrap();
        assert_eq!(series.first_year(), 2020);
        assert_eq!(series.last_year(), Some(2050));
        assert_eq!(series.value(2020), Some(0.5));
        assert!(is_close!(series.value(2030).unwrap(), 0.25));
        // Held flat after the last commitment
        assert!(is_close!(series.value(2050).unwrap(), 0.25));
    }

    #[test]
    fn test_chained_targets_anchor_on_previous_segment() {
        let mut record = company();
        record
            .targets
            .push(intensity_target(Scope::S1S2, 2020, 2030, 0.5, 0.5));
        record
            .targets
            .push(intensity_target(Scope::S1S2, 2030, 2040, 0.5, 0.8));
        let record = project(record).unwrap();

        let series = record
            .projected_targets
            .as_ref()
            .unwrap()
            .get(Scope::S1S2)
            .unwrap()
            .clone();
        assert!(is_close!(series.value(2030).unwrap(), 0.25));
        // Second target: 80% off the 0.5 base, i.e. down to 0.1 by 2040
        assert!(is_close!(series.value(2040).unwrap(), 0.1));
        assert!(series.value(2035).unwrap() < 0.25);
        assert!(series.value(2035).unwrap() > 0.1);
    }

    #[test]
    fn test_anchor_prefers_recent_history_over_declared_base() {
        let mut record = company();
        record.historic_data.emission_intensities.insert(
            Scope::S1S2,
            vec![Realization::new(
                2022,
                Quantity::parse(0.4, "t CO2 / TWh").unwrap(),
            )],
        );
        record
            .targets
            .push(intensity_target(Scope::S1S2, 2020, 2030, 0.5, 0.5));
        let record = project(record).unwrap();

        let series = record
            .projected_targets
            .as_ref()
            .unwrap()
            .get(Scope::S1S2)
            .unwrap()
            .clone();
        // Anchored at the 2022 disclosure, padded flat back to the base year
        assert_eq!(series.value(2020), Some(0.4));
        assert_eq!(series.value(2022), Some(0.4));
        assert!(is_close!(series.value(2030).unwrap(), 0.25));
    }

    #[test]
    fn test_absolute_target_converts_through_production() {
        let mut record = company();
        record.historic_data.emissions.insert(
            Scope::S1,
            vec![Realization::new(
                2020,
                Quantity::parse(1000.0, "t CO2").unwrap(),
            )],
        );
        record
            .targets
            .push(absolute_target(Scope::S1, 2020, 2040, 1000.0, 1.0));
        let record = project(record).unwrap();

        let series = record
            .projected_targets
            .as_ref()
            .unwrap()
            .get(Scope::S1)
            .unwrap()
            .clone();
        // 1000 t CO2 / 200 TWh = 5 t CO2/TWh at the anchor
        assert!(is_close!(series.value(2020).unwrap(), 5.0));
        assert!(is_close!(series.value(2040).unwrap(), 0.0, abs_tol = 1e-12));
        // Zero through the rest of the horizon
        for year in 2041..=2050 {
            assert!(is_close!(series.value(year).unwrap(), 0.0, abs_tol = 1e-12));
        }
    }

    #[test]
    fn test_absolute_target_without_production_is_hard_error() {
        let mut record = company();
        record.base_year_production = None;
        record
            .targets
            .push(absolute_target(Scope::S1, 2020, 2040, 1000.0, 1.0));

        let provider = flat_production_provider();
        let mut companies = vec![record];
        let err = TargetProjector::new(config())
            .project(&mut companies, &provider)
            .unwrap_err();
        assert!(matches!(err, EngineError::MissingBaseData { .. }));
    }

    #[test]
    fn test_duplicate_pair_latest_declaration_wins() {
        let mut record = company();
        record
            .targets
            .push(intensity_target(Scope::S1S2, 2020, 2030, 0.5, 0.3));
        record
            .targets
            .push(intensity_target(Scope::S1S2, 2020, 2030, 0.5, 0.5));
        let record = project(record).unwrap();

        let series = record
            .projected_targets
            .as_ref()
            .unwrap()
            .get(Scope::S1S2)
            .unwrap()
            .clone();
        assert!(is_close!(series.value(2030).unwrap(), 0.25));
    }

    #[test]
    fn test_end_year_tie_won_by_later_start() {
        let mut record = company();
        record
            .targets
            .push(intensity_target(Scope::S1S2, 2020, 2030, 0.5, 0.6));
        record
            .targets
            .push(intensity_target(Scope::S1S2, 2025, 2030, 0.5, 0.5));
        let record = project(record).unwrap();

        let series = record
            .projected_targets
            .as_ref()
            .unwrap()
            .get(Scope::S1S2)
            .unwrap()
            .clone();
        // The later-start target's 50% reduction applies, not the 60%
        assert!(is_close!(series.value(2030).unwrap(), 0.25));
    }

    #[test]
    fn test_intensity_wins_identical_pair_across_kinds() {
        let mut record = company();
        record.historic_data.emissions.insert(
            Scope::S1S2,
            vec![Realization::new(
                2020,
                Quantity::parse(100.0, "t CO2").unwrap(),
            )],
        );
        record
            .targets
            .push(absolute_target(Scope::S1S2, 2020, 2030, 100.0, 0.9));
        record
            .targets
            .push(intensity_target(Scope::S1S2, 2020, 2030, 0.5, 0.5));
        let record = project(record).unwrap();

        let series = record
            .projected_targets
            .as_ref()
            .unwrap()
            .get(Scope::S1S2)
            .unwrap()
            .clone();
        // The intensity target's 50% applies, not the absolute 90%
        assert!(is_close!(series.value(2030).unwrap(), 0.25));
    }

    #[test]
    fn test_unorderable_mixed_targets_rejected() {
        let mut record = company();
        record.historic_data.emissions.insert(
            Scope::S1S2,
            vec![Realization::new(
                2020,
                Quantity::parse(100.0, "t CO2").unwrap(),
            )],
        );
        // Same end year, different start years, both starting after the
        // (initial) pending year: no documented order exists
        record
            .targets
            .push(absolute_target(Scope::S1S2, 2021, 2030, 100.0, 0.9));
        record
            .targets
            .push(intensity_target(Scope::S1S2, 2020, 2030, 0.5, 0.5));

        let provider = flat_production_provider();
        let mut companies = vec![record];
        let err = TargetProjector::new(config())
            .project(&mut companies, &provider)
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::UnsupportedTargetCombination { year: 2030, .. }
        ));
    }

    #[test]
    fn test_netzero_only_scope_synthesized_from_history() {
        let mut record = company();
        record.historic_data.emission_intensities.insert(
            Scope::S3,
            vec![Realization::new(
                2020,
                Quantity::parse(2.0, "t CO2 / TWh").unwrap(),
            )],
        );
        // A bare net-zero declaration: no reduction committed, stale range
        let mut declaration = intensity_target(Scope::S3, 2020, 2020, 2.0, 0.0);
        declaration.netzero_year = Some(2045);
        record.targets.push(declaration);
        let record = project(record).unwrap();

        let series = record
            .projected_targets
            .as_ref()
            .unwrap()
            .get(Scope::S3)
            .unwrap()
            .clone();
        assert_eq!(series.value(2020), Some(2.0));
        assert!(is_close!(series.value(2045).unwrap(), 0.0, abs_tol = 1e-12));
        assert!(is_close!(series.value(2050).unwrap(), 0.0, abs_tol = 1e-12));
    }

    #[test]
    fn test_netzero_tail_after_last_target() {
        let mut record = company();
        let mut target = intensity_target(Scope::S1S2, 2020, 2030, 0.5, 0.5);
        target.netzero_year = Some(2040);
        record.targets.push(target);
        let record = project(record).unwrap();

        let series = record
            .projected_targets
            .as_ref()
            .unwrap()
            .get(Scope::S1S2)
            .unwrap()
            .clone();
        assert!(is_close!(series.value(2030).unwrap(), 0.25));
        assert!(is_close!(series.value(2040).unwrap(), 0.0, abs_tol = 1e-12));
        assert!(is_close!(series.value(2050).unwrap(), 0.0, abs_tol = 1e-12));
    }

    #[test]
    fn test_compound_backfilled_from_constituents() {
        let mut record = company();
        record
            .targets
            .push(intensity_target(Scope::S1, 2020, 2030, 0.3, 0.5));
        record
            .targets
            .push(intensity_target(Scope::S2, 2020, 2030, 0.2, 0.5));
        let record = project(record).unwrap();

        let curves = record.projected_targets.as_ref().unwrap();
        let s1 = curves.get(Scope::S1).unwrap();
        let s2 = curves.get(Scope::S2).unwrap();
        let s1s2 = curves.get(Scope::S1S2).unwrap();
        for year in 2020..=2050 {
            assert!(is_close!(
                s1s2.value(year).unwrap(),
                s1.value(year).unwrap() + s2.value(year).unwrap()
            ));
        }
    }

    #[test]
    fn test_compound_netzero_tail_sums_constituents() {
        let mut record = company();
        for (scope, base) in [(Scope::S1, 1.0), (Scope::S2, 0.5)] {
            record.historic_data.emission_intensities.insert(
                scope,
                vec![Realization::new(
                    2020,
                    Quantity::parse(base, "t CO2 / TWh").unwrap(),
                )],
            );
            record.targets.push(intensity_target(scope, 2020, 2040, base, 1.0));
        }
        record.historic_data.emission_intensities.insert(
            Scope::S1S2,
            vec![Realization::new(
                2020,
                Quantity::parse(1.5, "t CO2 / TWh").unwrap(),
            )],
        );
        let mut compound = intensity_target(Scope::S1S2, 2020, 2030, 1.5, 0.5);
        compound.netzero_year = Some(2040);
        record.targets.push(compound);
        let record = project(record).unwrap();

        let curves = record.projected_targets.as_ref().unwrap();
        let s1 = curves.get(Scope::S1).unwrap();
        let s2 = curves.get(Scope::S2).unwrap();
        let s1s2 = curves.get(Scope::S1S2).unwrap();
        // Up to the explicit target the compound follows its own commitment
        assert!(is_close!(s1s2.value(2030).unwrap(), 0.75));
        // Beyond it the compound is the sum of the constituent paths
        for year in 2031..=2050 {
            assert!(
                is_close!(
                    s1s2.value(year).unwrap(),
                    s1.value(year).unwrap() + s2.value(year).unwrap(),
                    abs_tol = 1e-12
                ),
                "compound tail must equal constituent sum in {year}"
            );
        }
    }

    #[test]
    fn test_failing_company_degrades_without_aborting_batch() {
        // A target whose unit cannot match its anchor trips the projection
        let mut bad = company();
        bad.historic_data.emission_intensities.insert(
            Scope::S1S2,
            vec![Realization::new(
                2020,
                Quantity::parse(0.5, "t CO2 / TWh").unwrap(),
            )],
        );
        let mut mismatched = intensity_target(Scope::S1S2, 2020, 2030, 0.5, 0.5);
        mismatched.base_year_value = Quantity::parse(0.5, "t CO2 / Fe_ton").unwrap();
        bad.targets.push(mismatched);

        let mut good = company();
        good.company_id = "C2".to_string();
        good.targets
            .push(intensity_target(Scope::S1S2, 2020, 2030, 0.5, 0.5));

        let provider = flat_production_provider();
        let mut companies = vec![bad, good];
        TargetProjector::new(config())
            .project(&mut companies, &provider)
            .unwrap();

        assert!(companies[0]
            .projected_targets
            .as_ref()
            .unwrap()
            .is_empty());
        assert!(companies[1]
            .projected_targets
            .as_ref()
            .unwrap()
            .contains(Scope::S1S2));
    }

    #[test]
    fn test_scope_without_targets_or_netzero_left_empty() {
        let mut record = company();
        record
            .targets
            .push(intensity_target(Scope::S1, 2020, 2030, 0.3, 0.5));
        let record = project(record).unwrap();

        let curves = record.projected_targets.as_ref().unwrap();
        assert!(curves.contains(Scope::S1));
        assert!(!curves.contains(Scope::S3));
        assert!(!curves.contains(Scope::S1S2));
    }
}
