//! Entropy delta: a normalized spread statistic over a drift series.
//!
//! The delta is the range of the valid samples divided by the magnitude of the
//! maximum, floored at [`MAGNITUDE_FLOOR`]. NaN samples are skipped. Degenerate
//! inputs (fewer than two valid samples, or no spread) yield `0.0`; the function
//! never fails.

/// Lower bound on the normalizing magnitude, so a maximum near zero does not divide by zero.
pub const MAGNITUDE_FLOOR: f64 = 1e-9;

/// Compute the entropy delta of a series.
///
/// Returns `(hi - lo) / max(|hi|, 1e-9)` over the non-NaN samples, or `0.0`
/// when fewer than two samples are valid or all valid samples are equal.
pub fn delta(series: &[f64]) -> f64 {
    let mut lo = f64::MAX;
    let mut hi = f64::MIN;
    let mut count = 0usize;

    for &v in series {
        if v.is_nan() {
            continue;
        }
        count += 1;
        if v < lo {
            lo = v;
        }
        if v > hi {
            hi = v;
        }
    }

    if count < 2 || hi == lo {
        return 0.0;
    }
    (hi - lo) / hi.abs().max(MAGNITUDE_FLOOR)
}
