//! End-to-end properties of the projection engine.
//!
//! These tests exercise the documented guarantees across component
//! boundaries: scope composition of projected curves, the CAGR contract,
//! winsorization idempotence, net-zero constraint propagation, benchmark
//! region fallback, and the projector no-op on already-projected records.

use approx::assert_relative_eq;

use tempscore_components::benchmarks::{
    BenchmarkCurve, BenchmarkProjection, IntensityBenchmarkProvider, ProductionBenchmarkProvider,
    GLOBAL_REGION,
};
use tempscore_components::provider::CompanyDataProvider;
use tempscore_components::targets::{calculate_net_zero_years, compute_cagr, TargetProjector};
use tempscore_components::trajectory::TrajectoryProjector;
use tempscore_core::company::{CompanyRecord, Realization, Target, TargetKind};
use tempscore_core::config::ProjectionConfig;
use tempscore_core::quantity::Quantity;
use tempscore_core::scope::{Scope, ScopeMap};
use tempscore_core::timeseries::{FloatValue, ProjectionSeries, Year};
use tempscore_core::units::Unit;

fn config() -> ProjectionConfig {
    ProjectionConfig {
        base_year: 2020,
        target_year: 2050,
        ..Default::default()
    }
}

fn intensity_quantity(value: FloatValue, unit: &str) -> Quantity {
    Quantity::parse(value, unit).unwrap()
}

fn intensity_realization(year: Year, value: FloatValue) -> Realization {
    Realization::new(year, intensity_quantity(value, "t CO2 / TWh"))
}

fn flat_production_benchmark(sector: &str) -> ProductionBenchmarkProvider {
    let curve = BenchmarkCurve {
        sector: sector.to_string(),
        region: GLOBAL_REGION.to_string(),
        scope: Scope::S1S2,
        unit: Unit::dimensionless(),
        projections: (2021..=2050)
            .map(|year| BenchmarkProjection { year, value: 0.0 })
            .collect(),
    };
    ProductionBenchmarkProvider::new(vec![curve], config())
}

mod scope_composition {
    use super::*;

    /// With S1 and S2 resolved and no direct S1S2 disclosure, the projected
    /// compound curve equals the constituent sum in every year.
    #[test]
    fn test_trajectory_compound_equals_constituent_sum() {
        let mut company = CompanyRecord::new("C1", "One", "Electricity Utilities", "Europe");
        company.historic_data.emission_intensities.insert(
            Scope::S1,
            vec![intensity_realization(2020, 1.0), intensity_realization(2021, 0.92)],
        );
        company.historic_data.emission_intensities.insert(
            Scope::S2,
            vec![intensity_realization(2020, 0.4), intensity_realization(2021, 0.38)],
        );
        let mut companies = vec![company];
        TrajectoryProjector::new(config())
            .project(&mut companies)
            .unwrap();

        let curves = companies[0].projected_trajectories.as_ref().unwrap();
        let s1 = curves.get(Scope::S1).unwrap();
        let s2 = curves.get(Scope::S2).unwrap();
        let s1s2 = curves.get(Scope::S1S2).unwrap();
        for year in 2020..=2050 {
            assert_relative_eq!(
                s1s2.value(year).unwrap(),
                s1.value(year).unwrap() + s2.value(year).unwrap(),
                max_relative = 1e-12
            );
        }
    }
}

mod cagr_contract {
    use super::*;

    /// Equal anchor and target give a flat series of the full period length.
    #[test]
    fn test_flat_series_when_target_equals_anchor() {
        let anchor = intensity_quantity(0.7, "t CO2 / TWh");
        let series = compute_cagr(2020, &anchor, 2035, &anchor.clone()).unwrap();
        assert_eq!(series.len(), 16);
        for year in 2020..=2035 {
            assert_eq!(series.value(year), Some(0.7));
        }
    }

    /// The final year lands exactly on the target value.
    #[test]
    fn test_final_year_equals_target() {
        let anchor = intensity_quantity(0.8, "t CO2 / TWh");
        let target = intensity_quantity(0.3, "t CO2 / TWh");
        let series = compute_cagr(2020, &anchor, 2040, &target).unwrap();
        assert_relative_eq!(series.value(2040).unwrap(), 0.3, max_relative = 1e-12);
    }
}

mod winsorization {
    use super::*;
    use tempscore_core::panel::{HistoricPanel, PanelKey};

    /// Re-winsorizing an already-winsorized panel at the same percentiles
    /// changes nothing.
    #[test]
    fn test_winsorization_is_idempotent() {
        let values = [0.2, 0.5, 0.9, 1.4, 2.0, 3.1, 4.5, 7.0, 11.0, 40.0];
        let mut panel = HistoricPanel::new(2020, 1, false);
        for (i, value) in values.iter().enumerate() {
            panel.push_row(
                PanelKey::intensity(format!("C{i}"), Scope::S1S2),
                Unit::parse("t CO2 / TWh").unwrap(),
                ndarray::array![*value],
                None,
            );
        }
        let rows: Vec<usize> = (0..values.len()).collect();

        panel.winsorize_rows(&rows, 0.1, 0.9);
        let first_pass: Vec<_> = rows.iter().map(|&r| panel.get(r, 2020)).collect();
        panel.winsorize_rows(&rows, 0.1, 0.9);
        let second_pass: Vec<_> = rows.iter().map(|&r| panel.get(r, 2020)).collect();

        assert_eq!(first_pass, second_pass);
    }
}

mod netzero_inference {
    use super::*;

    fn netzero_target(scope: Scope, end_year: Year) -> Target {
        Target {
            scope,
            kind: TargetKind::Intensity,
            base_year: 2020,
            base_year_value: intensity_quantity(1.0, "t CO2 / TWh"),
            start_year: 2020,
            end_year,
            reduction_fraction: 1.0,
            netzero_year: None,
        }
    }

    /// An earlier S1S2S3 commitment tightens S1S2 to match, never the
    /// reverse.
    #[test]
    fn test_compound_commitment_tightens_constituent() {
        let years = calculate_net_zero_years(&[
            netzero_target(Scope::S1S2S3, 2040),
            netzero_target(Scope::S1S2, 2050),
        ]);
        assert_eq!(years.get(Scope::S1S2), Some(&2040));
        assert_eq!(years.get(Scope::S1S2S3), Some(&2040));
    }

    #[test]
    fn test_later_compound_leaves_constituent_alone() {
        let years = calculate_net_zero_years(&[
            netzero_target(Scope::S1S2S3, 2050),
            netzero_target(Scope::S1S2, 2040),
        ]);
        assert_eq!(years.get(Scope::S1S2), Some(&2040));
        assert_eq!(years.get(Scope::S1S2S3), Some(&2050));
    }
}

mod target_scenarios {
    use super::*;

    /// Production of 100 U and 50 t CO2 of S1S2 emissions in 2020, with a
    /// 50% intensity reduction by 2030 from a 0.5 t CO2/U base: the 2030
    /// intensity is 0.25 t CO2/U with monotonically decreasing years in
    /// between.
    #[test]
    fn test_halving_intensity_target() {
        let mut company = CompanyRecord::new("C1", "One", "Electricity Utilities", "Europe");
        company.base_year_production = Some(Quantity::parse(100.0, "U").unwrap());
        company.historic_data.productions =
            vec![Realization::new(2020, Quantity::parse(100.0, "U").unwrap())];
        company.historic_data.emissions.insert(
            Scope::S1S2,
            vec![Realization::new(2020, Quantity::parse(50.0, "t CO2").unwrap())],
        );
        company.targets.push(Target {
            scope: Scope::S1S2,
            kind: TargetKind::Intensity,
            base_year: 2020,
            base_year_value: intensity_quantity(0.5, "t CO2 / U"),
            start_year: 2020,
            end_year: 2030,
            reduction_fraction: 0.5,
            netzero_year: None,
        });

        let provider = flat_production_benchmark("Electricity Utilities");
        let mut companies = vec![company];
        TargetProjector::new(config())
            .project(&mut companies, &provider)
            .unwrap();

        let curves = companies[0].projected_targets.as_ref().unwrap();
        let series = curves.get(Scope::S1S2).unwrap();
        assert_relative_eq!(series.value(2030).unwrap(), 0.25, max_relative = 1e-12);

        let mut previous = series.value(2020).unwrap();
        assert_relative_eq!(previous, 0.5, max_relative = 1e-12);
        for year in 2021..=2030 {
            let value = series.value(year).unwrap();
            assert!(
                value < previous,
                "intensity must decrease monotonically, {year} holds {value}"
            );
            previous = value;
        }
    }

    /// An absolute 1000 t CO2 S1 target reduced 100% by 2040 against a flat
    /// 200-unit production benchmark reaches exactly zero in 2040 and stays
    /// there through the horizon.
    #[test]
    fn test_absolute_netzero_target() {
        let mut company = CompanyRecord::new("C1", "One", "Electricity Utilities", "Europe");
        company.base_year_production = Some(Quantity::parse(200.0, "U").unwrap());
        company.historic_data.emissions.insert(
            Scope::S1,
            vec![Realization::new(2020, Quantity::parse(1000.0, "t CO2").unwrap())],
        );
        company.targets.push(Target {
            scope: Scope::S1,
            kind: TargetKind::Absolute,
            base_year: 2020,
            base_year_value: Quantity::parse(1000.0, "t CO2").unwrap(),
            start_year: 2020,
            end_year: 2040,
            reduction_fraction: 1.0,
            netzero_year: None,
        });

        let provider = flat_production_benchmark("Electricity Utilities");
        let mut companies = vec![company];
        TargetProjector::new(config())
            .project(&mut companies, &provider)
            .unwrap();

        let curves = companies[0].projected_targets.as_ref().unwrap();
        let series = curves.get(Scope::S1).unwrap();
        assert_eq!(series.unit(), &Unit::parse("t CO2 / U").unwrap());
        assert!(
            series.value(2040).unwrap().abs() < 1e-12,
            "2040 intensity must be exactly zero, got {}",
            series.value(2040).unwrap()
        );
        for year in 2041..=2050 {
            assert!(
                series.value(year).unwrap().abs() < 1e-12,
                "intensity must stay at zero after net zero, {year} holds {}",
                series.value(year).unwrap()
            );
        }
    }
}

mod benchmark_fallback {
    use super::*;

    /// A region absent from the benchmark table resolves through "Global"
    /// without error.
    #[test]
    fn test_unknown_region_falls_back_to_global() {
        let provider = flat_production_benchmark("Electricity Utilities");
        let index = provider
            .projected_production("Electricity Utilities", "Ruritania", Scope::S1S2)
            .expect("Global curve must back an unknown region");
        assert_eq!(index.value(2020), Some(1.0));
        assert_eq!(index.value(2050), Some(1.0));
    }

    #[test]
    fn test_sda_benchmark_falls_back_to_global() {
        let horizon = config();
        let span = (horizon.target_year - horizon.base_year) as FloatValue;
        let curve = BenchmarkCurve {
            sector: "Electricity Utilities".to_string(),
            region: GLOBAL_REGION.to_string(),
            scope: Scope::S1S2,
            unit: Unit::parse("t CO2 / TWh").unwrap(),
            projections: horizon
                .horizon()
                .map(|year| BenchmarkProjection {
                    year,
                    value: 1.0 - 0.8 * (year - horizon.base_year) as FloatValue / span,
                })
                .collect(),
        };
        let provider = IntensityBenchmarkProvider::new(
            vec![curve],
            1.5,
            Quantity::parse(396.0, "Gt CO2").unwrap(),
            false,
            horizon,
        );

        let info = tempscore_core::company::CompanyBaseInfo {
            company_id: "C1".to_string(),
            sector: "Electricity Utilities".to_string(),
            region: "Ruritania".to_string(),
            base_year_production: None,
            ghg_s1s2: None,
            base_ei: Some(intensity_quantity(0.6, "t CO2 / TWh")),
        };
        let paths = provider
            .sda_intensity_benchmarks(&[info], Scope::S1S2)
            .unwrap();
        assert_relative_eq!(paths[0].value(2020).unwrap(), 0.6, max_relative = 1e-12);
        assert_relative_eq!(paths[0].value(2050).unwrap(), 0.2, max_relative = 1e-12);
    }
}

mod projector_idempotence {
    use super::*;

    /// A company with only disclosed trajectory projections and no historic
    /// data passes through the trajectory projector unmodified.
    #[test]
    fn test_disclosed_projections_round_trip() {
        let mut company = CompanyRecord::new("C1", "One", "Steel", "Europe");
        let mut disclosed = ScopeMap::new();
        let horizon = config();
        disclosed.insert(
            Scope::S1S2,
            ProjectionSeries::from_values(
                Unit::parse("t CO2 / Fe_ton").unwrap(),
                horizon.base_year,
                vec![1.2; horizon.horizon_len()],
            ),
        );
        company.projected_trajectories = Some(disclosed);

        let expected = company.clone();
        let mut companies = vec![company];
        TrajectoryProjector::new(horizon)
            .project(&mut companies)
            .unwrap();
        assert_eq!(companies[0], expected);

        // The facade accepts it without historic data, too
        let provider = CompanyDataProvider::new(vec![expected.clone()], horizon).unwrap();
        assert_eq!(provider.companies()[0], expected);
    }
}
