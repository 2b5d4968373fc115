//! Projection components for the tempscore engine.
//!
//! Components are organised by pipeline stage:
//! - `historic`: assembly of the unified historic panel and derivation of
//!   missing emission intensities
//! - `benchmarks`: sector/region production growth and SDA intensity
//!   benchmark providers
//! - `trajectory`: trend-based extrapolation of historic intensities
//! - `targets`: target- and net-zero-based intensity projection
//! - `provider`: the per-company query facade tying the stages together

pub mod benchmarks;
pub mod historic;
pub mod provider;
pub mod targets;
pub mod trajectory;
