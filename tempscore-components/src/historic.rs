//! Historic data assembly and gap filling.
//!
//! Builds the unified year-indexed panel the projectors operate on from
//! whatever subset of production, emissions and emission-intensity series a
//! company disclosed, then derives the minimum set of missing intensity
//! rows:
//!
//! 1. For scope S1S2, the sum of the S1 and S2 intensity rows is preferred.
//! 2. Every scope falls back to `emissions[scope] / production`.
//! 3. What remains underivable is recorded; a company is acceptable as long
//!    as at least one scope resolves.
//!
//! Derivation is a builder pass: computed rows are appended to the panel,
//! existing rows are never rewritten, so the resolution is auditable and
//! independent of iteration order.

use ndarray::Array1;

use tempscore_core::company::{CompanyRecord, Realization};
use tempscore_core::config::ProjectionConfig;
use tempscore_core::errors::{EngineError, EngineResult};
use tempscore_core::panel::{HistoricPanel, PanelKey};
use tempscore_core::scope::Scope;
use tempscore_core::timeseries::FloatValue;
use tempscore_core::units::Unit;

/// Output of the assembly pass.
#[derive(Debug, Clone)]
pub struct ResolvedHistory {
    pub panel: HistoricPanel,
    /// Intensity rows synthesized as the sum of constituent-scope rows.
    ///
    /// Projections for these scopes must be composed from the constituent
    /// projections rather than re-derived from the summed history.
    pub summed_intensities: Vec<PanelKey>,
}

/// Extract, derive and backfill in one pass.
pub fn assemble(
    companies: &[&CompanyRecord],
    config: &ProjectionConfig,
) -> EngineResult<ResolvedHistory> {
    let mut panel = extract(companies, config)?;
    let summed_intensities = derive_missing_intensities(&mut panel, companies)?;
    panel.backfill_left_edge(config.base_year);
    Ok(ResolvedHistory {
        panel,
        summed_intensities,
    })
}

/// Build the raw panel from disclosed realizations.
///
/// The year axis spans the union of all disclosed years and the configured
/// base year. The panel carries a dispersion matrix when any realization in
/// the batch has an uncertainty.
pub fn extract(
    companies: &[&CompanyRecord],
    config: &ProjectionConfig,
) -> EngineResult<HistoricPanel> {
    let mut first_year = config.base_year;
    let mut last_year = config.base_year;
    let mut with_uncertainty = false;
    for company in companies {
        for_each_realization(company, |realization| {
            first_year = first_year.min(realization.year);
            last_year = last_year.max(realization.year);
            with_uncertainty |= realization.value.uncertainty().is_some();
        });
    }

    let n_years = (last_year - first_year + 1) as usize;
    let mut panel = HistoricPanel::new(first_year, n_years, with_uncertainty);
    for company in companies {
        let data = &company.historic_data;
        if !data.productions.is_empty() {
            push_series(
                &mut panel,
                PanelKey::production(&company.company_id),
                &data.productions,
            )?;
        }
        for scope in Scope::ALL {
            if let Some(series) = data.emissions.get(scope) {
                if !series.is_empty() {
                    push_series(
                        &mut panel,
                        PanelKey::emissions(&company.company_id, scope),
                        series,
                    )?;
                }
            }
            if let Some(series) = data.emission_intensities.get(scope) {
                if !series.is_empty() {
                    push_series(
                        &mut panel,
                        PanelKey::intensity(&company.company_id, scope),
                        series,
                    )?;
                }
            }
        }
    }
    Ok(panel)
}

/// Derive intensity rows that can legally be computed from disclosed data.
///
/// Returns the keys of rows synthesized by constituent summation. Fails with
/// an aggregated [`EngineError::DataCompleteness`] listing every offending
/// company/scope pair when a company resolves no scope at all.
pub fn derive_missing_intensities(
    panel: &mut HistoricPanel,
    companies: &[&CompanyRecord],
) -> EngineResult<Vec<PanelKey>> {
    let mut summed = Vec::new();
    let mut missing = Vec::new();
    for company in companies {
        let id = company.company_id.as_str();
        let production_row = panel.row_index(&PanelKey::production(id));
        let mut unresolved: Vec<String> = Vec::new();
        let mut resolved = 0usize;

        for scope in Scope::ALL {
            let key = PanelKey::intensity(id, scope);
            if panel.contains_key(&key) {
                resolved += 1;
                continue;
            }
            if scope == Scope::S1S2 {
                if let Some((unit, values, dispersions)) =
                    sum_intensity_rows(panel, id, Scope::S1, Scope::S2)?
                {
                    panel.push_row(key.clone(), unit, values, dispersions);
                    summed.push(key);
                    resolved += 1;
                    continue;
                }
            }
            match (
                panel.row_index(&PanelKey::emissions(id, scope)),
                production_row,
            ) {
                (Some(emissions), Some(production)) => {
                    let (unit, values, dispersions) =
                        divide_rows(panel, emissions, production);
                    panel.push_row(key, unit, values, dispersions);
                    resolved += 1;
                }
                _ => unresolved.push(format!("{} - {}", id, scope)),
            }
        }

        if resolved == 0 {
            missing.append(&mut unresolved);
        } else if !unresolved.is_empty() {
            log::debug!(
                "scopes left unresolved for company {}: {:?}",
                id,
                unresolved
            );
        }
    }
    if !missing.is_empty() {
        return Err(EngineError::DataCompleteness(missing));
    }
    Ok(summed)
}

fn for_each_realization<'a>(company: &'a CompanyRecord, mut visit: impl FnMut(&'a Realization)) {
    for realization in &company.historic_data.productions {
        visit(realization);
    }
    for (_, series) in company.historic_data.emissions.iter() {
        for realization in series {
            visit(realization);
        }
    }
    for (_, series) in company.historic_data.emission_intensities.iter() {
        for realization in series {
            visit(realization);
        }
    }
}

fn push_series(
    panel: &mut HistoricPanel,
    key: PanelKey,
    realizations: &[Realization],
) -> EngineResult<()> {
    let unit = realizations[0].value.unit().clone();
    let mut values = Array1::from_elem(panel.n_years(), FloatValue::NAN);
    let mut dispersions = panel
        .has_uncertainty()
        .then(|| Array1::from_elem(panel.n_years(), FloatValue::NAN));
    for realization in realizations {
        if realization.value.unit() != &unit {
            return Err(EngineError::UnitMismatch {
                expected: unit.to_string(),
                actual: realization.value.unit().to_string(),
            });
        }
        let Some(col) = panel.year_index(realization.year) else {
            continue;
        };
        values[col] = realization.value.magnitude();
        if let (Some(track), Some(uncertainty)) =
            (dispersions.as_mut(), realization.value.uncertainty())
        {
            track[col] = uncertainty;
        }
    }
    panel.push_row(key, unit, values, dispersions);
    Ok(())
}

type DerivedRow = (Unit, Array1<FloatValue>, Option<Array1<FloatValue>>);

fn sum_intensity_rows(
    panel: &HistoricPanel,
    company_id: &str,
    a: Scope,
    b: Scope,
) -> EngineResult<Option<DerivedRow>> {
    let (Some(row_a), Some(row_b)) = (
        panel.row_index(&PanelKey::intensity(company_id, a)),
        panel.row_index(&PanelKey::intensity(company_id, b)),
    ) else {
        return Ok(None);
    };
    if panel.unit(row_a) != panel.unit(row_b) {
        return Err(EngineError::UnitMismatch {
            expected: panel.unit(row_a).to_string(),
            actual: panel.unit(row_b).to_string(),
        });
    }
    let values = &panel.row(row_a) + &panel.row(row_b);
    let dispersions = match (panel.dispersion_row(row_a), panel.dispersion_row(row_b)) {
        (Some(da), Some(db)) => {
            let mut track = Array1::from_elem(values.len(), FloatValue::NAN);
            for col in 0..values.len() {
                track[col] = quadrature(da[col], db[col]);
            }
            Some(track)
        }
        _ => None,
    };
    Ok(Some((panel.unit(row_a).clone(), values, dispersions)))
}

fn divide_rows(panel: &HistoricPanel, numerator: usize, denominator: usize) -> DerivedRow {
    let row_n = panel.row(numerator);
    let row_d = panel.row(denominator);
    let mut values = Array1::from_elem(row_n.len(), FloatValue::NAN);
    for col in 0..values.len() {
        // Zero production gives an undefined intensity, not an infinite one
        values[col] = if row_d[col] == 0.0 {
            FloatValue::NAN
        } else {
            row_n[col] / row_d[col]
        };
    }
    let dispersions = match (
        panel.dispersion_row(numerator),
        panel.dispersion_row(denominator),
    ) {
        (Some(dn), Some(dd)) => {
            let mut track = Array1::from_elem(values.len(), FloatValue::NAN);
            for col in 0..values.len() {
                let relative_n = relative(row_n[col], dn[col]);
                let relative_d = relative(row_d[col], dd[col]);
                track[col] = values[col].abs()
                    * (relative_n * relative_n + relative_d * relative_d).sqrt();
            }
            Some(track)
        }
        _ => None,
    };
    (
        panel.unit(numerator).divide(panel.unit(denominator)),
        values,
        dispersions,
    )
}

fn quadrature(a: FloatValue, b: FloatValue) -> FloatValue {
    let a = if a.is_nan() { 0.0 } else { a };
    let b = if b.is_nan() { 0.0 } else { b };
    (a * a + b * b).sqrt()
}

fn relative(value: FloatValue, uncertainty: FloatValue) -> FloatValue {
    if uncertainty.is_nan() || value == 0.0 {
        0.0
    } else {
        uncertainty / value
    }
}
