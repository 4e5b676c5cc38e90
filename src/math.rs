//! # Math Utilities
//! Pure numeric helpers over score series. No I/O, no state.
//!
//! Series are expected oldest-first. All functions are total: too-short inputs
//! fall back to `0.0` instead of failing.

/// Decimal places used for persisted/returned numbers.
pub const DEFAULT_PLACES: u32 = 4;

/// f64 carries about 15 significant decimal digits; more places are meaningless.
pub const MAX_PLACES: u32 = 15;

/// Arithmetic mean; `0.0` for an empty series.
pub fn mean(series: &[f64]) -> f64 {
    if series.is_empty() {
        return 0.0;
    }
    series.iter().sum::<f64>() / series.len() as f64
}

/// Mean of period-over-period differences.
///
/// With exactly two points this is the single difference; with fewer than two
/// there is no difference to take and the result is `0.0`.
pub fn velocity(series: &[f64]) -> f64 {
    if series.len() < 2 {
        return 0.0;
    }
    let diffs = differences(series);
    mean(&diffs)
}

/// Velocity of the first-difference series (mean of second differences).
/// Returns `0.0` for fewer than three points.
pub fn acceleration(series: &[f64]) -> f64 {
    if series.len() < 3 {
        return 0.0;
    }
    velocity(&differences(series))
}

/// Population standard deviation (divides by `n`): the series is the full known
/// history, not a sample of it.
pub fn standard_deviation(series: &[f64]) -> f64 {
    if series.is_empty() {
        return 0.0;
    }
    let m = mean(series);
    let var = series.iter().map(|x| (x - m).powi(2)).sum::<f64>() / series.len() as f64;
    var.sqrt()
}

pub fn clamp(x: f64, lo: f64, hi: f64) -> f64 {
    x.max(lo).min(hi)
}

/// Round half away from zero to `places` decimals (capped at `MAX_PLACES`).
/// Values too large to scale are returned unchanged.
pub fn round(x: f64, places: u32) -> f64 {
    let f = 10f64.powi(places.min(MAX_PLACES) as i32);
    let scaled = x * f;
    if !scaled.is_finite() {
        return x;
    }
    scaled.round() / f
}

/// Shorthand for `round(x, DEFAULT_PLACES)`.
pub fn round4(x: f64) -> f64 {
    round(x, DEFAULT_PLACES)
}

fn differences(series: &[f64]) -> Vec<f64> {
    series.windows(2).map(|w| w[1] - w[0]).collect()
}
