//! Compound-annual-change interpolation between two anchor points.

use tempscore_core::errors::{EngineError, EngineResult};
use tempscore_core::quantity::Quantity;
use tempscore_core::timeseries::{FloatValue, ProjectionSeries, Year};

/// Ratio below which pure geometric interpolation degenerates.
///
/// A target under 1/11.11 of the anchor (a reduction beyond ~91%) would give
/// a compound rate so extreme the curve collapses almost vertically in the
/// first years; at a ratio of exactly zero the geometric form cannot reach
/// the target at all. Below this threshold the decay rate is capped and a
/// linear term closes the remaining gap so the final year lands exactly on
/// the target.
const DEEP_REDUCTION_RATIO: FloatValue = 1.0 / 11.11;

/// Interpolate from `(anchor_year, anchor)` to `(target_year, target)`.
///
/// The result covers `[anchor_year, target_year]` inclusive. A slack target
/// (target at or above the anchor, or a zero anchor) yields a flat line at
/// the anchor value. The final year equals the target value exactly for any
/// non-degenerate input.
///
/// Nominal and dispersion components are interpolated independently: the
/// nominal geometrically (or via the capped blend), the dispersion linearly
/// between the anchor and target dispersions.
pub fn compute_cagr(
    anchor_year: Year,
    anchor: &Quantity,
    target_year: Year,
    target: &Quantity,
) -> EngineResult<ProjectionSeries> {
    if anchor.unit() != target.unit() {
        return Err(EngineError::UnitMismatch {
            expected: anchor.unit().to_string(),
            actual: target.unit().to_string(),
        });
    }

    let mut series = ProjectionSeries::new(anchor.unit().clone(), anchor_year);
    if target_year < anchor_year {
        return Ok(series);
    }

    let period = (target_year - anchor_year) as FloatValue;
    let first = anchor.magnitude();
    let last = target.magnitude();

    let track_dispersion = anchor.uncertainty().is_some() || target.uncertainty().is_some();
    let anchor_dispersion = anchor.uncertainty().unwrap_or(0.0);
    let target_dispersion = target.uncertainty().unwrap_or(0.0);

    for step in 0..=(target_year - anchor_year) {
        let progress = if period == 0.0 {
            1.0
        } else {
            step as FloatValue / period
        };
        let value = interpolate_nominal(first, last, progress, period);
        let dispersion = track_dispersion
            .then(|| anchor_dispersion + progress * (target_dispersion - anchor_dispersion));
        series.push(anchor_year + step, value, dispersion);
    }
    Ok(series)
}

fn interpolate_nominal(
    first: FloatValue,
    last: FloatValue,
    progress: FloatValue,
    period: FloatValue,
) -> FloatValue {
    // Slack target: already achieved, hold the anchor
    if last >= first || first == 0.0 {
        return first;
    }
    if period == 0.0 {
        return first;
    }
    let ratio = last / first;
    if ratio < DEEP_REDUCTION_RATIO {
        // Capped geometric decay plus a linear term closing the gap to the
        // target, reaching it exactly at progress == 1
        let capped_end = first * DEEP_REDUCTION_RATIO;
        let decayed = first * DEEP_REDUCTION_RATIO.powf(progress);
        decayed - progress * (capped_end - last)
    } else {
        first * ratio.powf(progress)
    }
}
