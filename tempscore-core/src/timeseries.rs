//! Year-indexed projection series.
//!
//! A [`ProjectionSeries`] is a contiguous run of annual values sharing one
//! unit, spanning the projection horizon once fully assembled. Target-chain
//! assembly builds a series by controlled append (next year only); after a
//! series is attached to a company record it is treated as immutable.
//!
//! The optional dispersion track mirrors the values one-to-one and carries
//! the standard deviation of uncertainty-bearing inputs.

use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, EngineResult};
use crate::quantity::Quantity;
use crate::units::Unit;

/// Floating point type used throughout the engine.
pub type FloatValue = f64;

/// Calendar year.
pub type Year = i32;

/// A contiguous year-indexed series of values sharing a single unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionSeries {
    unit: Unit,
    first_year: Year,
    values: Vec<FloatValue>,
    dispersions: Option<Vec<FloatValue>>,
}

impl ProjectionSeries {
    /// An empty series anchored at `first_year`.
    pub fn new(unit: Unit, first_year: Year) -> Self {
        Self {
            unit,
            first_year,
            values: Vec::new(),
            dispersions: None,
        }
    }

    pub fn from_values(unit: Unit, first_year: Year, values: Vec<FloatValue>) -> Self {
        Self {
            unit,
            first_year,
            values,
            dispersions: None,
        }
    }

    /// A series with a dispersion track.
    ///
    /// # Panics
    /// Panics if the dispersion track length differs from the value track.
    pub fn with_dispersions(
        unit: Unit,
        first_year: Year,
        values: Vec<FloatValue>,
        dispersions: Vec<FloatValue>,
    ) -> Self {
        assert_eq!(
            values.len(),
            dispersions.len(),
            "dispersion track must mirror the value track"
        );
        Self {
            unit,
            first_year,
            values,
            dispersions: Some(dispersions),
        }
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    pub fn first_year(&self) -> Year {
        self.first_year
    }

    /// Last covered year, `None` while the series is empty.
    pub fn last_year(&self) -> Option<Year> {
        if self.values.is_empty() {
            None
        } else {
            Some(self.first_year + self.values.len() as Year - 1)
        }
    }

    /// The year the next append must carry.
    pub fn next_year(&self) -> Year {
        self.first_year + self.values.len() as Year
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn index(&self, year: Year) -> Option<usize> {
        if year < self.first_year {
            return None;
        }
        let index = (year - self.first_year) as usize;
        (index < self.values.len()).then_some(index)
    }

    pub fn value(&self, year: Year) -> Option<FloatValue> {
        self.index(year).map(|i| self.values[i])
    }

    pub fn dispersion(&self, year: Year) -> Option<FloatValue> {
        let index = self.index(year)?;
        self.dispersions.as_ref().map(|d| d[index])
    }

    pub fn quantity(&self, year: Year) -> Option<Quantity> {
        let index = self.index(year)?;
        let value = self.values[index];
        Some(match self.dispersions.as_ref() {
            Some(d) => Quantity::with_uncertainty(value, d[index], self.unit.clone()),
            None => Quantity::new(value, self.unit.clone()),
        })
    }

    pub fn last_value(&self) -> Option<FloatValue> {
        self.values.last().copied()
    }

    pub fn last_quantity(&self) -> Option<Quantity> {
        self.last_year().and_then(|year| self.quantity(year))
    }

    /// Append the value for the next year.
    ///
    /// # Panics
    /// Panics if `year` is not [`next_year`](Self::next_year): series are
    /// contiguous by construction and skipping a year is a programming error.
    pub fn push(&mut self, year: Year, value: FloatValue, dispersion: Option<FloatValue>) {
        assert_eq!(
            year,
            self.next_year(),
            "projection series must be appended year by year"
        );
        self.values.push(value);
        match (&mut self.dispersions, dispersion) {
            (Some(track), d) => track.push(d.unwrap_or(0.0)),
            (track @ None, Some(d)) => {
                let mut values = vec![0.0; self.values.len() - 1];
                values.push(d);
                *track = Some(values);
            }
            (None, None) => {}
        }
    }

    /// Append a quantity for the next year, checking its unit.
    pub fn push_quantity(&mut self, year: Year, quantity: &Quantity) -> EngineResult<()> {
        if quantity.unit() != &self.unit {
            return Err(EngineError::UnitMismatch {
                expected: self.unit.to_string(),
                actual: quantity.unit().to_string(),
            });
        }
        self.push(year, quantity.magnitude(), quantity.uncertainty());
        Ok(())
    }

    /// Repeat the final value through `year`. No-op on an empty series or
    /// when the series already covers `year`.
    pub fn extend_flat_to(&mut self, year: Year) {
        let Some(last) = self.last_value() else {
            return;
        };
        let dispersion = self
            .dispersions
            .as_ref()
            .and_then(|d| d.last().copied());
        while self.next_year() <= year {
            let next = self.next_year();
            self.push(next, last, dispersion);
        }
    }

    /// Repeat the first value backward so the series starts at `year`.
    pub fn pad_flat_start(&mut self, year: Year) {
        if self.values.is_empty() || year >= self.first_year {
            return;
        }
        let pad = (self.first_year - year) as usize;
        let first = self.values[0];
        let mut values = vec![first; pad];
        values.append(&mut self.values);
        self.values = values;
        if let Some(track) = &mut self.dispersions {
            let first = track[0];
            let mut dispersions = vec![first; pad];
            dispersions.append(track);
            *track = dispersions;
        }
        self.first_year = year;
    }

    /// Drop all years before `year`.
    pub fn truncate_before(&mut self, year: Year) {
        if year <= self.first_year {
            return;
        }
        let drop = ((year - self.first_year) as usize).min(self.values.len());
        self.values.drain(..drop);
        if let Some(track) = &mut self.dispersions {
            track.drain(..drop);
        }
        self.first_year = year;
    }

    /// Pointwise sum over the overlapping year range.
    ///
    /// Units must match; dispersions combine in quadrature. The result spans
    /// the intersection of the two ranges and is empty when they do not
    /// overlap.
    pub fn checked_add(&self, other: &ProjectionSeries) -> EngineResult<ProjectionSeries> {
        if self.unit != other.unit {
            return Err(EngineError::UnitMismatch {
                expected: self.unit.to_string(),
                actual: other.unit.to_string(),
            });
        }
        let first = self.first_year.max(other.first_year);
        let last = match (self.last_year(), other.last_year()) {
            (Some(a), Some(b)) => a.min(b),
            _ => return Ok(ProjectionSeries::new(self.unit.clone(), first)),
        };
        let mut sum = ProjectionSeries::new(self.unit.clone(), first);
        for year in first..=last {
            let value = self.value(year).unwrap_or(FloatValue::NAN)
                + other.value(year).unwrap_or(FloatValue::NAN);
            let dispersion = match (self.dispersion(year), other.dispersion(year)) {
                (None, None) => None,
                (a, b) => {
                    let a = a.unwrap_or(0.0);
                    let b = b.unwrap_or(0.0);
                    Some((a * a + b * b).sqrt())
                }
            };
            sum.push(year, value, dispersion);
        }
        Ok(sum)
    }

    /// Iterate over `(year, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Year, FloatValue)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(move |(i, &value)| (self.first_year + i as Year, value))
    }
}
