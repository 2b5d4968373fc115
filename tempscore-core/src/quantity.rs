//! Unit-tagged numeric values with optional uncertainty.
//!
//! A [`Quantity`] couples a magnitude with a [`Unit`] and, when the input
//! data carries one, a standard deviation. Addition and subtraction require
//! identical units and fail with [`EngineError::UnitMismatch`] otherwise;
//! multiplication and division merge unit exponents. Uncertainty is a
//! per-value capability rather than a process-wide mode: values without one
//! flow through the same arithmetic with the dispersion treated as zero.
//!
//! NaN magnitudes are legal and mark missing or undefined data; they
//! propagate through all operations.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{EngineError, EngineResult};
use crate::timeseries::FloatValue;
use crate::units::Unit;

/// A numeric magnitude tagged with a physical unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    magnitude: FloatValue,
    uncertainty: Option<FloatValue>,
    unit: Unit,
}

impl Quantity {
    pub fn new(magnitude: FloatValue, unit: Unit) -> Self {
        Self {
            magnitude,
            uncertainty: None,
            unit,
        }
    }

    /// A value with a known standard deviation.
    pub fn with_uncertainty(magnitude: FloatValue, uncertainty: FloatValue, unit: Unit) -> Self {
        Self {
            magnitude,
            uncertainty: Some(uncertainty),
            unit,
        }
    }

    /// Convenience constructor parsing the unit expression.
    pub fn parse(magnitude: FloatValue, unit: &str) -> EngineResult<Self> {
        Ok(Self::new(magnitude, Unit::parse(unit)?))
    }

    /// The NaN value of a unit, marking missing data.
    pub fn nan(unit: Unit) -> Self {
        Self::new(FloatValue::NAN, unit)
    }

    pub fn magnitude(&self) -> FloatValue {
        self.magnitude
    }

    pub fn uncertainty(&self) -> Option<FloatValue> {
        self.uncertainty
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    pub fn is_nan(&self) -> bool {
        self.magnitude.is_nan()
    }

    fn require_same_unit(&self, other: &Quantity) -> EngineResult<()> {
        if self.unit != other.unit {
            return Err(EngineError::UnitMismatch {
                expected: self.unit.to_string(),
                actual: other.unit.to_string(),
            });
        }
        Ok(())
    }

    /// Sum of two quantities of identical unit.
    ///
    /// Uncertainties combine in quadrature; a missing uncertainty counts as
    /// zero dispersion.
    pub fn checked_add(&self, other: &Quantity) -> EngineResult<Quantity> {
        self.require_same_unit(other)?;
        Ok(Quantity {
            magnitude: self.magnitude + other.magnitude,
            uncertainty: combine_quadrature(self.uncertainty, other.uncertainty),
            unit: self.unit.clone(),
        })
    }

    /// Difference of two quantities of identical unit.
    pub fn checked_sub(&self, other: &Quantity) -> EngineResult<Quantity> {
        self.require_same_unit(other)?;
        Ok(Quantity {
            magnitude: self.magnitude - other.magnitude,
            uncertainty: combine_quadrature(self.uncertainty, other.uncertainty),
            unit: self.unit.clone(),
        })
    }

    /// Product of two quantities; units multiply, relative uncertainties
    /// combine in quadrature.
    pub fn multiply(&self, other: &Quantity) -> Quantity {
        Quantity {
            magnitude: self.magnitude * other.magnitude,
            uncertainty: combine_relative(
                self.magnitude * other.magnitude,
                (self.magnitude, self.uncertainty),
                (other.magnitude, other.uncertainty),
            ),
            unit: self.unit.multiply(&other.unit),
        }
    }

    /// Quotient of two quantities; units divide, relative uncertainties
    /// combine in quadrature.
    pub fn divide(&self, other: &Quantity) -> Quantity {
        Quantity {
            magnitude: self.magnitude / other.magnitude,
            uncertainty: combine_relative(
                self.magnitude / other.magnitude,
                (self.magnitude, self.uncertainty),
                (other.magnitude, other.uncertainty),
            ),
            unit: self.unit.divide(&other.unit),
        }
    }

    /// Scale by a dimensionless factor.
    pub fn scale(&self, factor: FloatValue) -> Quantity {
        Quantity {
            magnitude: self.magnitude * factor,
            uncertainty: self.uncertainty.map(|u| u * factor.abs()),
            unit: self.unit.clone(),
        }
    }
}

fn combine_quadrature(
    a: Option<FloatValue>,
    b: Option<FloatValue>,
) -> Option<FloatValue> {
    match (a, b) {
        (None, None) => None,
        (a, b) => {
            let a = a.unwrap_or(0.0);
            let b = b.unwrap_or(0.0);
            Some((a * a + b * b).sqrt())
        }
    }
}

fn combine_relative(
    result: FloatValue,
    (a, ua): (FloatValue, Option<FloatValue>),
    (b, ub): (FloatValue, Option<FloatValue>),
) -> Option<FloatValue> {
    if ua.is_none() && ub.is_none() {
        return None;
    }
    let relative = |value: FloatValue, uncertainty: Option<FloatValue>| -> FloatValue {
        match uncertainty {
            Some(u) if value != 0.0 => u / value,
            _ => 0.0,
        }
    };
    let ra = relative(a, ua);
    let rb = relative(b, ub);
    Some(result.abs() * (ra * ra + rb * rb).sqrt())
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.uncertainty {
            Some(u) => write!(f, "{} +/- {} {}", self.magnitude, u, self.unit),
            None => write!(f, "{} {}", self.magnitude, self.unit),
        }
    }
}
