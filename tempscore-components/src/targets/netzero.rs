//! Net-zero year inference.
//!
//! A scope's net-zero year is the earliest of its stated net-zero years and
//! the end years of its 100%-reduction targets. Compound commitments then
//! constrain their constituents: a scope cannot reach net zero later than a
//! compound it belongs to, so constituent years are tightened downward to
//! the compound's. The reverse never happens; a compound keeps its own
//! declared year.

use tempscore_core::company::Target;
use tempscore_core::scope::{Scope, ScopeMap};
use tempscore_core::timeseries::Year;

/// Infer the net-zero year per scope from a company's target declarations.
pub fn calculate_net_zero_years(targets: &[Target]) -> ScopeMap<Year> {
    let mut years: ScopeMap<Year> = ScopeMap::new();
    for scope in Scope::ALL {
        let earliest = targets
            .iter()
            .filter(|target| target.scope == scope)
            .filter_map(|target| {
                if target.is_netzero() {
                    Some(match target.netzero_year {
                        Some(stated) => stated.min(target.end_year),
                        None => target.end_year,
                    })
                } else {
                    target.netzero_year
                }
            })
            .min();
        if let Some(year) = earliest {
            years.insert(scope, year);
        }
    }

    // Cascade top-down so an S1S2S3 commitment reaches S1 and S2 through S1S2
    tighten(&mut years, Scope::S1S2S3, Scope::S1S2);
    tighten(&mut years, Scope::S1S2S3, Scope::S3);
    tighten(&mut years, Scope::S1S2, Scope::S1);
    tighten(&mut years, Scope::S1S2, Scope::S2);
    years
}

fn tighten(years: &mut ScopeMap<Year>, compound: Scope, constituent: Scope) {
    if let (Some(&compound_year), Some(&constituent_year)) =
        (years.get(compound), years.get(constituent))
    {
        if compound_year < constituent_year {
            years.insert(constituent, compound_year);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempscore_core::company::TargetKind;
    use tempscore_core::quantity::Quantity;

    fn target(scope: Scope, end_year: Year, reduction: f64, netzero: Option<Year>) -> Target {
        Target {
            scope,
            kind: TargetKind::Intensity,
            base_year: 2019,
            base_year_value: Quantity::parse(1.0, "t CO2 / TWh").unwrap(),
            start_year: 2019,
            end_year,
            reduction_fraction: reduction,
            netzero_year: netzero,
        }
    }

    #[test]
    fn test_full_reduction_implies_netzero() {
        let years = calculate_net_zero_years(&[target(Scope::S1, 2040, 1.0, None)]);
        assert_eq!(years.get(Scope::S1), Some(&2040));
        assert_eq!(years.get(Scope::S2), None);
    }

    #[test]
    fn test_earliest_commitment_wins() {
        let years = calculate_net_zero_years(&[
            target(Scope::S1, 2045, 1.0, None),
            target(Scope::S1, 2035, 0.5, Some(2050)),
            target(Scope::S1, 2030, 0.3, Some(2042)),
        ]);
        assert_eq!(years.get(Scope::S1), Some(&2042));
    }

    #[test]
    fn test_stated_year_capped_by_full_reduction_end() {
        // A 100% reduction by 2040 with a later stated net-zero year still
        // reaches zero in 2040
        let years = calculate_net_zero_years(&[target(Scope::S1, 2040, 1.0, Some(2050))]);
        assert_eq!(years.get(Scope::S1), Some(&2040));
    }

    #[test]
    fn test_compound_tightens_constituents() {
        let years = calculate_net_zero_years(&[
            target(Scope::S1S2S3, 2040, 1.0, None),
            target(Scope::S1S2, 2050, 1.0, None),
            target(Scope::S3, 2055, 1.0, None),
            target(Scope::S1, 2045, 1.0, None),
        ]);
        // S1S2S3 pulls S1S2 and S3 down; S1S2 pulls S1 down
        assert_eq!(years.get(Scope::S1S2S3), Some(&2040));
        assert_eq!(years.get(Scope::S1S2), Some(&2040));
        assert_eq!(years.get(Scope::S3), Some(&2040));
        assert_eq!(years.get(Scope::S1), Some(&2040));
    }

    #[test]
    fn test_never_loosened_upward() {
        let years = calculate_net_zero_years(&[
            target(Scope::S1S2, 2050, 1.0, None),
            target(Scope::S1, 2035, 1.0, None),
        ]);
        // The constituent's earlier commitment stands; the compound keeps its own
        assert_eq!(years.get(Scope::S1), Some(&2035));
        assert_eq!(years.get(Scope::S1S2), Some(&2050));
    }

    #[test]
    fn test_missing_constituent_left_unset() {
        let years = calculate_net_zero_years(&[target(Scope::S1S2, 2045, 1.0, None)]);
        assert_eq!(years.get(Scope::S1S2), Some(&2045));
        assert_eq!(years.get(Scope::S1), None);
        assert_eq!(years.get(Scope::S2), None);
    }
}
