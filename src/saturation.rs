//! Saturation-time detection for turbulence runs.
//!
//! A run saturates when the driving instability stops growing and the
//! diagnostic traces settle into a statistically steady oscillation. Two
//! heuristics are provided: a windowed flatness test on the raw series and a
//! growth-rate test on the logarithm of the series.

use crate::error::{Error, Result};

/// Parameters for [`saturation_index`].
#[derive(Debug, Clone, Copy)]
pub struct WindowParams {
    /// Number of samples in the trailing moving-average window.
    pub window: usize,
    /// Relative change between successive window means below which the
    /// series counts as flat.
    pub tolerance: f64,
    /// Number of consecutive flat windows required before saturation is
    /// declared.
    pub consecutive: usize,
}

impl Default for WindowParams {
    fn default() -> Self {
        WindowParams {
            window: 10,
            tolerance: 0.05,
            consecutive: 2,
        }
    }
}

/// Estimate the sample index at which a diagnostic series saturates.
///
/// A trailing moving average of `window` samples is tracked along the
/// series. Once the average changes by less than `tolerance` (relative to
/// the previous average) for `consecutive` windows in a row, the series is
/// judged saturated and the start index of the first such window is
/// returned.
///
/// Returns `Ok(None)` when the series is shorter than the window or never
/// flattens out. A series that is empty, contains non-finite samples or is
/// identically zero is rejected with `InvalidInput` rather than risking a
/// false detection.
pub fn saturation_index(series: &[f64], params: &WindowParams) -> Result<Option<usize>> {
    if series.is_empty() {
        return Err(Error::invalid_input("empty series"));
    }
    if series.iter().any(|v| !v.is_finite()) {
        return Err(Error::invalid_input("series contains non-finite samples"));
    }
    if series.iter().all(|&v| v == 0.0) {
        return Err(Error::invalid_input("series is identically zero"));
    }
    if params.window == 0 || params.consecutive == 0 {
        return Err(Error::invalid_input(
            "window and consecutive counts must be positive",
        ));
    }

    let w = params.window;
    let n = series.len();
    if n < w + 1 {
        // Not enough data to compare two windows, so not yet saturated
        return Ok(None);
    }

    let mut sum: f64 = series[..w].iter().sum();
    let mut prev = sum / w as f64;
    let mut run = 0usize;
    let mut run_start = 0usize;

    for i in w..n {
        sum += series[i] - series[i - w];
        let cur = sum / w as f64;

        // A zero previous mean means the window is still on the quiescent
        // start-up phase; never treat that as flat
        let flat = prev != 0.0 && ((cur - prev) / prev).abs() < params.tolerance;
        if flat {
            if run == 0 {
                run_start = i;
            }
            run += 1;
            if run >= params.consecutive {
                return Ok(Some(run_start - w + 1));
            }
        } else {
            run = 0;
        }
        prev = cur;
    }

    Ok(None)
}

/// Parameters for [`saturation_time`].
#[derive(Debug, Clone, Copy)]
pub struct GrowthRateParams {
    /// Time interval, in the units of the time coordinate, over which the
    /// rolling growth rate is computed.
    pub window: f64,
    /// Growth rate, in inverse time units, below which saturation is
    /// considered to have occurred.
    pub threshold: f64,
}

impl Default for GrowthRateParams {
    fn default() -> Self {
        GrowthRateParams {
            window: 20.0,
            threshold: 0.1,
        }
    }
}

/// Estimate the saturation time, the end of the linear growth phase, of a
/// positive diagnostic series such as `phi2`.
///
/// The series is linearised with a logarithm and a rolling growth rate is
/// computed between points separated by `window` time units. Saturation is
/// the first time after the peak of the growth rate at which the rate drops
/// below `threshold`; looking only after the peak avoids triggering on
/// early transients. Assumes a uniformly spaced time axis.
///
/// Returns `Ok(None)` when the series never saturates or is too short for
/// the requested window.
pub fn saturation_time(
    t: &[f64],
    series: &[f64],
    params: &GrowthRateParams,
) -> Result<Option<f64>> {
    if t.len() != series.len() {
        return Err(Error::invalid_input(
            "time axis and series have different lengths",
        ));
    }
    if t.len() < 2 {
        return Err(Error::invalid_input("need at least two samples"));
    }
    if series.iter().any(|&v| !v.is_finite() || v <= 0.0) {
        return Err(Error::invalid_input(
            "series must be positive and finite to linearise",
        ));
    }
    let dt = t[1] - t[0];
    if !dt.is_finite() || dt <= 0.0 {
        return Err(Error::invalid_input("time axis must be increasing"));
    }

    // Convert the window from time units to a sample lag
    let lag = (params.window / dt) as usize;
    if lag == 0 {
        return Err(Error::invalid_input(
            "growth-rate window is shorter than the time step",
        ));
    }
    if lag >= t.len() {
        return Ok(None);
    }

    let logp: Vec<f64> = series.iter().map(|v| v.ln()).collect();
    let growth: Vec<f64> = (lag..t.len())
        .map(|i| (logp[i] - logp[i - lag]) / (t[i] - t[i - lag]))
        .collect();

    // Peak of the linear growth phase
    let mut peak = 0usize;
    for (j, g) in growth.iter().enumerate() {
        if *g > growth[peak] {
            peak = j;
        }
    }

    for (j, g) in growth.iter().enumerate().skip(peak) {
        if *g < params.threshold {
            return Ok(Some(t[j + lag]));
        }
    }
    Ok(None)
}
