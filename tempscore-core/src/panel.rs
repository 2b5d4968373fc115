//! Year-indexed panel of historic disclosures.
//!
//! The projectors work over the whole company batch as one unit of columnar
//! computation. [`HistoricPanel`] stores that batch as an ndarray matrix:
//! one row per (company, variable, scope) series, one column per calendar
//! year, NaN marking missing cells. Uncertainty-bearing inputs get a second
//! matrix of dispersions that mirrors the values; whether the panel carries
//! one is fixed at construction.
//!
//! Derivation passes never mutate existing rows in place; they append newly
//! computed rows, keeping the resolution auditable and order-independent.

use ndarray::{Array1, Array2, ArrayView1};
use num::Float;
use serde::{Deserialize, Serialize};

use crate::scope::Scope;
use crate::timeseries::{FloatValue, Year};
use crate::units::Unit;

/// The three variables a company can disclose historically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PanelVariable {
    Productions,
    Emissions,
    EmissionIntensities,
}

/// Row identifier within a [`HistoricPanel`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PanelKey {
    pub company_id: String,
    pub variable: PanelVariable,
    /// `None` for production rows, which are not scoped.
    pub scope: Option<Scope>,
}

impl PanelKey {
    pub fn production(company_id: impl Into<String>) -> Self {
        Self {
            company_id: company_id.into(),
            variable: PanelVariable::Productions,
            scope: None,
        }
    }

    pub fn emissions(company_id: impl Into<String>, scope: Scope) -> Self {
        Self {
            company_id: company_id.into(),
            variable: PanelVariable::Emissions,
            scope: Some(scope),
        }
    }

    pub fn intensity(company_id: impl Into<String>, scope: Scope) -> Self {
        Self {
            company_id: company_id.into(),
            variable: PanelVariable::EmissionIntensities,
            scope: Some(scope),
        }
    }
}

/// A batch of historic series on a common year axis.
#[derive(Debug, Clone)]
pub struct HistoricPanel {
    keys: Vec<PanelKey>,
    units: Vec<Unit>,
    first_year: Year,
    values: Array2<FloatValue>,
    dispersions: Option<Array2<FloatValue>>,
}

impl HistoricPanel {
    /// An empty panel covering `n_years` starting at `first_year`.
    ///
    /// `with_uncertainty` fixes whether the panel carries a dispersion
    /// matrix; the choice cannot change after construction.
    pub fn new(first_year: Year, n_years: usize, with_uncertainty: bool) -> Self {
        Self {
            keys: Vec::new(),
            units: Vec::new(),
            first_year,
            values: Array2::from_elem((0, n_years), FloatValue::NAN),
            dispersions: with_uncertainty
                .then(|| Array2::from_elem((0, n_years), FloatValue::NAN)),
        }
    }

    pub fn first_year(&self) -> Year {
        self.first_year
    }

    pub fn last_year(&self) -> Year {
        self.first_year + self.n_years() as Year - 1
    }

    pub fn n_years(&self) -> usize {
        self.values.ncols()
    }

    pub fn n_rows(&self) -> usize {
        self.keys.len()
    }

    pub fn years(&self) -> std::ops::RangeInclusive<Year> {
        self.first_year()..=self.last_year()
    }

    pub fn year_index(&self, year: Year) -> Option<usize> {
        if year < self.first_year {
            return None;
        }
        let index = (year - self.first_year) as usize;
        (index < self.n_years()).then_some(index)
    }

    pub fn has_uncertainty(&self) -> bool {
        self.dispersions.is_some()
    }

    /// Append a series.
    ///
    /// # Panics
    /// Panics if the row length differs from the panel width, or if a
    /// dispersion row is supplied to a panel constructed without uncertainty.
    pub fn push_row(
        &mut self,
        key: PanelKey,
        unit: Unit,
        values: Array1<FloatValue>,
        dispersions: Option<Array1<FloatValue>>,
    ) {
        assert_eq!(
            values.len(),
            self.n_years(),
            "row length must match the panel year axis"
        );
        self.values
            .push_row(values.view())
            .expect("row length checked above");
        match (&mut self.dispersions, dispersions) {
            (Some(matrix), row) => {
                let row =
                    row.unwrap_or_else(|| Array1::from_elem(matrix.ncols(), FloatValue::NAN));
                matrix
                    .push_row(row.view())
                    .expect("row length must match the panel year axis");
            }
            (None, Some(_)) => {
                panic!("panel constructed without uncertainty cannot take dispersion rows")
            }
            (None, None) => {}
        }
        self.keys.push(key);
        self.units.push(unit);
    }

    pub fn row_index(&self, key: &PanelKey) -> Option<usize> {
        self.keys.iter().position(|k| k == key)
    }

    pub fn contains_key(&self, key: &PanelKey) -> bool {
        self.row_index(key).is_some()
    }

    pub fn key(&self, row: usize) -> &PanelKey {
        &self.keys[row]
    }

    pub fn unit(&self, row: usize) -> &Unit {
        &self.units[row]
    }

    pub fn row(&self, row: usize) -> ArrayView1<'_, FloatValue> {
        self.values.row(row)
    }

    pub fn dispersion_row(&self, row: usize) -> Option<ArrayView1<'_, FloatValue>> {
        self.dispersions.as_ref().map(|d| d.row(row))
    }

    /// Cell lookup; `None` when the year is outside the panel axis. A NaN
    /// result means the year is covered but the value is missing.
    pub fn get(&self, row: usize, year: Year) -> Option<FloatValue> {
        self.year_index(year).map(|col| self.values[[row, col]])
    }

    pub fn set(&mut self, row: usize, year: Year, value: FloatValue) {
        let col = self
            .year_index(year)
            .expect("year must lie on the panel axis");
        self.values[[row, col]] = value;
    }

    /// First year with a non-missing value in a row.
    pub fn first_valid_year(&self, row: usize) -> Option<Year> {
        self.values
            .row(row)
            .iter()
            .position(|v| !v.is_nan())
            .map(|col| self.first_year + col as Year)
    }

    /// Most recent non-missing `(year, value)` in a row.
    pub fn last_valid(&self, row: usize) -> Option<(Year, FloatValue)> {
        let row_view = self.values.row(row);
        for col in (0..row_view.len()).rev() {
            let value = row_view[col];
            if !value.is_nan() {
                return Some((self.first_year + col as Year, value));
            }
        }
        None
    }

    /// Copy each row's earliest value backward to `base_year`.
    ///
    /// Only gaps on or after the base year are filled; history before the
    /// base year is never touched.
    pub fn backfill_left_edge(&mut self, base_year: Year) {
        let Some(base_col) = self.year_index(base_year) else {
            return;
        };
        let mut filled = 0usize;
        for row in 0..self.n_rows() {
            let Some(first_valid) = self
                .values
                .row(row)
                .iter()
                .position(|v| !v.is_nan())
            else {
                continue;
            };
            if first_valid <= base_col {
                continue;
            }
            let value = self.values[[row, first_valid]];
            for col in base_col..first_valid {
                self.values[[row, col]] = value;
            }
            if let Some(matrix) = &mut self.dispersions {
                let dispersion = matrix[[row, first_valid]];
                for col in base_col..first_valid {
                    matrix[[row, col]] = dispersion;
                }
            }
            filled += 1;
        }
        if filled > 0 {
            log::debug!("backfilled {} series to the base year {}", filled, base_year);
        }
    }

    /// Clip the given rows at the cross-sectional percentiles of each year
    /// column.
    ///
    /// The rows must hold comparable values (same unit); columns with fewer
    /// than two observations are left unchanged. Bounds are order statistics
    /// (nearest rank), which makes re-winsorizing at the same percentiles a
    /// no-op. Only nominal values are clipped; the dispersion matrix is
    /// carried through untouched.
    pub fn winsorize_rows(&mut self, rows: &[usize], lower: FloatValue, upper: FloatValue) {
        for col in 0..self.n_years() {
            let observed: Vec<FloatValue> = rows
                .iter()
                .map(|&row| self.values[[row, col]])
                .filter(|v| !v.is_nan())
                .collect();
            if observed.len() < 2 {
                continue;
            }
            let low = order_statistic(&observed, lower).expect("observed is non-empty");
            let high = order_statistic(&observed, upper).expect("observed is non-empty");
            for &row in rows {
                let value = self.values[[row, col]];
                if !value.is_nan() {
                    self.values[[row, col]] = value.clamp(low, high);
                }
            }
        }
    }
}

fn sorted_observed<F: Float>(values: &[F]) -> Vec<F> {
    let mut sorted: Vec<F> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).expect("NaNs filtered above"));
    sorted
}

/// Nearest-rank percentile: the order statistic closest to `q` through the
/// non-NaN values. Unlike [`percentile`], always returns an observed value,
/// so clipping at these bounds is idempotent.
pub fn order_statistic<F: Float>(values: &[F], q: F) -> Option<F> {
    let sorted = sorted_observed(values);
    if sorted.is_empty() {
        return None;
    }
    let q = q.max(F::zero()).min(F::one());
    let scale = F::from(sorted.len() - 1).expect("series length fits in a float");
    let rank = (q * scale)
        .round()
        .to_usize()
        .expect("rank is a small non-negative integer");
    Some(sorted[rank])
}

/// Linearly interpolated percentile of the non-NaN values, `q` in [0, 1].
pub fn percentile<F: Float>(values: &[F], q: F) -> Option<F> {
    let sorted = sorted_observed(values);
    if sorted.is_empty() {
        return None;
    }
    let q = q.max(F::zero()).min(F::one());
    let scale = F::from(sorted.len() - 1).expect("series length fits in a float");
    let position = q * scale;
    let below = position
        .floor()
        .to_usize()
        .expect("position is a small non-negative integer");
    let above = position
        .ceil()
        .to_usize()
        .expect("position is a small non-negative integer");
    if below == above {
        return Some(sorted[below]);
    }
    let weight = position - F::from(below).expect("index fits in a float");
    Some(sorted[below] + weight * (sorted[above] - sorted[below]))
}

/// Median of the non-NaN values.
pub fn median<F: Float>(values: &[F]) -> Option<F> {
    percentile(values, F::from(0.5).expect("0.5 is representable"))
}

/// Mean of the non-NaN values.
pub fn mean<F: Float>(values: &[F]) -> Option<F> {
    let observed: Vec<F> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if observed.is_empty() {
        return None;
    }
    let sum = observed.iter().fold(F::zero(), |acc, &v| acc + v);
    Some(sum / F::from(observed.len()).expect("series length fits in a float"))
}
