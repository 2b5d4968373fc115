//! Emission scope taxonomy.
//!
//! Scopes form a closed enumeration: the direct scopes S1, S2 and S3 plus the
//! compound scopes S1S2 and S1S2S3 whose values are the sum of their
//! constituents. Composition and decomposition are total functions over the
//! enumeration, so callers never fall back to string lookups.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An emission scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Scope {
    /// Direct emissions
    S1,
    /// Purchased-energy emissions
    S2,
    /// Union of S1 and S2
    S1S2,
    /// Value-chain emissions
    S3,
    /// Union of S1, S2 and S3
    S1S2S3,
}

impl Scope {
    /// Every scope, constituents before their compounds.
    ///
    /// Iterating in this order guarantees that when a compound scope is
    /// processed, both of its constituents have already been visited.
    pub const ALL: [Scope; 5] = [Scope::S1, Scope::S2, Scope::S1S2, Scope::S3, Scope::S1S2S3];

    /// The two scopes a compound scope is the sum of, if any.
    pub fn constituents(self) -> Option<(Scope, Scope)> {
        match self {
            Scope::S1S2 => Some((Scope::S1, Scope::S2)),
            Scope::S1S2S3 => Some((Scope::S1S2, Scope::S3)),
            Scope::S1 | Scope::S2 | Scope::S3 => None,
        }
    }

    /// The compound scope this scope contributes to, if any.
    pub fn compound(self) -> Option<Scope> {
        match self {
            Scope::S1 | Scope::S2 => Some(Scope::S1S2),
            Scope::S1S2 | Scope::S3 => Some(Scope::S1S2S3),
            Scope::S1S2S3 => None,
        }
    }

    /// Whether this scope is the sum of two constituent scopes.
    pub fn is_compound(self) -> bool {
        self.constituents().is_some()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scope::S1 => "S1",
            Scope::S2 => "S2",
            Scope::S1S2 => "S1S2",
            Scope::S3 => "S3",
            Scope::S1S2S3 => "S1S2S3",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "S1" => Ok(Scope::S1),
            "S2" => Ok(Scope::S2),
            "S1S2" => Ok(Scope::S1S2),
            "S3" => Ok(Scope::S3),
            "S1S2S3" => Ok(Scope::S1S2S3),
            other => Err(format!("unknown scope {:?}", other)),
        }
    }
}

/// A container with one optional slot per scope.
///
/// This replaces string-keyed dictionaries with a total mapping over the
/// closed [`Scope`] enumeration: every scope has a slot, lookups cannot fail
/// with a missing-attribute error, and iteration follows [`Scope::ALL`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeMap<T> {
    s1: Option<T>,
    s2: Option<T>,
    s1s2: Option<T>,
    s3: Option<T>,
    s1s2s3: Option<T>,
}

impl<T> Default for ScopeMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ScopeMap<T> {
    pub fn new() -> Self {
        Self {
            s1: None,
            s2: None,
            s1s2: None,
            s3: None,
            s1s2s3: None,
        }
    }

    fn slot(&self, scope: Scope) -> &Option<T> {
        match scope {
            Scope::S1 => &self.s1,
            Scope::S2 => &self.s2,
            Scope::S1S2 => &self.s1s2,
            Scope::S3 => &self.s3,
            Scope::S1S2S3 => &self.s1s2s3,
        }
    }

    fn slot_mut(&mut self, scope: Scope) -> &mut Option<T> {
        match scope {
            Scope::S1 => &mut self.s1,
            Scope::S2 => &mut self.s2,
            Scope::S1S2 => &mut self.s1s2,
            Scope::S3 => &mut self.s3,
            Scope::S1S2S3 => &mut self.s1s2s3,
        }
    }

    pub fn get(&self, scope: Scope) -> Option<&T> {
        self.slot(scope).as_ref()
    }

    pub fn get_mut(&mut self, scope: Scope) -> Option<&mut T> {
        self.slot_mut(scope).as_mut()
    }

    /// Set the value for a scope, returning the previous value if any.
    pub fn insert(&mut self, scope: Scope, value: T) -> Option<T> {
        self.slot_mut(scope).replace(value)
    }

    pub fn remove(&mut self, scope: Scope) -> Option<T> {
        self.slot_mut(scope).take()
    }

    pub fn contains(&self, scope: Scope) -> bool {
        self.slot(scope).is_some()
    }

    /// Iterate over populated slots in [`Scope::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Scope, &T)> {
        Scope::ALL
            .iter()
            .filter_map(move |&scope| self.get(scope).map(|value| (scope, value)))
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
