//! Symbolic unit expressions for emission and production quantities.
//!
//! Company disclosures mix heterogeneous physical units: emissions in
//! `t CO2`, production in sector-specific outputs (`TWh`, `Fe_ton`, `GJ`),
//! intensities in their quotients. This module gives those expressions a
//! normalized structural form so that arithmetic can check compatibility
//! instead of silently mixing dimensions.
//!
//! A unit is a product of atomic symbols with integer exponents; parsing
//! accepts several equivalent notations:
//!
//! | Notation | Meaning |
//! |----------|---------|
//! | `t CO2 / TWh`, `t CO2/TWh` | tonnes of CO2 per terawatt-hour |
//! | `m^2`, `m**2` | square metres |
//! | `kg m`, `kg*m` | kilogram-metres |
//!
//! Equality is structural after normalization, so `Unit::parse("t CO2/GJ")`
//! equals `Unit::parse("t CO2 / GJ")`. There is no conversion registry: input
//! records are required to arrive in coherent units, and converting between
//! unit systems is the responsibility of the loading layer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::errors::{EngineError, EngineResult};

/// A normalized symbolic unit.
///
/// Stored as a map from atomic symbol to integer exponent; the dimensionless
/// unit is the empty product.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Unit {
    factors: BTreeMap<String, i32>,
}

impl Unit {
    /// The empty product, e.g. for benchmark growth deltas.
    pub fn dimensionless() -> Self {
        Self::default()
    }

    /// Parses a unit expression.
    ///
    /// `/` divides everything to its right within the expression, whitespace
    /// and `*` multiply, `^` and `**` attach integer exponents, and the bare
    /// symbol `1` marks a dimensionless factor.
    ///
    /// # Examples
    ///
    /// ```
    /// use tempscore_core::units::Unit;
    ///
    /// let a = Unit::parse("t CO2/TWh").unwrap();
    /// let b = Unit::parse("t CO2 / TWh").unwrap();
    /// assert_eq!(a, b);
    ///
    /// assert!(Unit::parse("1").unwrap().is_dimensionless());
    /// ```
    pub fn parse(input: &str) -> EngineResult<Self> {
        let mut factors = BTreeMap::new();
        for (position, segment) in input.split('/').enumerate() {
            let sign = if position == 0 { 1 } else { -1 };
            for atom in segment
                .split(|c: char| c.is_whitespace() || c == '*')
                .filter(|a| !a.is_empty())
            {
                let (symbol, exponent) = split_exponent(atom, input)?;
                if symbol == "1" {
                    continue;
                }
                *factors.entry(symbol.to_string()).or_insert(0) += sign * exponent;
            }
        }
        factors.retain(|_, exponent| *exponent != 0);
        Ok(Self { factors })
    }

    pub fn is_dimensionless(&self) -> bool {
        self.factors.is_empty()
    }

    /// The unit of a product of two quantities.
    pub fn multiply(&self, other: &Unit) -> Unit {
        let mut factors = self.factors.clone();
        for (symbol, exponent) in &other.factors {
            *factors.entry(symbol.clone()).or_insert(0) += exponent;
        }
        factors.retain(|_, exponent| *exponent != 0);
        Unit { factors }
    }

    /// The unit of a quotient of two quantities.
    pub fn divide(&self, other: &Unit) -> Unit {
        let mut factors = self.factors.clone();
        for (symbol, exponent) in &other.factors {
            *factors.entry(symbol.clone()).or_insert(0) -= exponent;
        }
        factors.retain(|_, exponent| *exponent != 0);
        Unit { factors }
    }
}

fn split_exponent<'a>(atom: &'a str, expression: &str) -> EngineResult<(&'a str, i32)> {
    let (symbol, exponent) = if let Some((symbol, exponent)) = atom.split_once("**") {
        (symbol, exponent)
    } else if let Some((symbol, exponent)) = atom.split_once('^') {
        (symbol, exponent)
    } else {
        (atom, "")
    };
    if exponent.is_empty() {
        return Ok((symbol, 1));
    }
    if symbol.is_empty() {
        return Err(EngineError::UnitParse(expression.to_string()));
    }
    let exponent: i32 = exponent
        .parse()
        .map_err(|_| EngineError::UnitParse(expression.to_string()))?;
    Ok((symbol, exponent))
}

impl fmt::Display for Unit {
    /// Canonical form: numerator atoms, `/`, denominator atoms, exponents as
    /// `^n` where |n| > 1. The dimensionless unit displays as `1`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.factors.is_empty() {
            return write!(f, "1");
        }
        let render = |f: &mut fmt::Formatter<'_>, items: &[(&String, i32)]| -> fmt::Result {
            for (i, (symbol, exponent)) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, " ")?;
                }
                if *exponent == 1 {
                    write!(f, "{}", symbol)?;
                } else {
                    write!(f, "{}^{}", symbol, exponent)?;
                }
            }
            Ok(())
        };

        let numerator: Vec<_> = self
            .factors
            .iter()
            .filter(|(_, &e)| e > 0)
            .map(|(s, &e)| (s, e))
            .collect();
        let denominator: Vec<_> = self
            .factors
            .iter()
            .filter(|(_, &e)| e < 0)
            .map(|(s, &e)| (s, -e))
            .collect();

        if numerator.is_empty() {
            write!(f, "1")?;
        } else {
            render(f, &numerator)?;
        }
        if !denominator.is_empty() {
            write!(f, " / ")?;
            render(f, &denominator)?;
        }
        Ok(())
    }
}
