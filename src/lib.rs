//! Company emission-intensity projection engine.
//!
//! This crate re-exports the two workspace members behind a single name:
//! - [`tempscore_core`]: scope taxonomy, unit-tagged quantities, year-indexed
//!   series and panels, configuration and the error taxonomy.
//! - [`tempscore_components`]: the historic data store, benchmark providers,
//!   the trajectory and target projectors, and the company data facade.

pub use tempscore_components::*;
pub use tempscore_core::*;
