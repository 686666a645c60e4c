//! Min/max feature rescaling.
//!
//! The range is computed over the entire flattened matrix, not per column,
//! and is recomputed on every call rather than persisted. Absolute scale may
//! therefore differ between calls on different batches; this is a documented
//! limitation of the upstream contract, not a bug.

use ndarray::Array2;

use crate::domain::errors::ForecastError;

/// Rescales every element of `matrix` into [0, 1] using the global min/max.
///
/// The element equal to the global max maps to exactly 1.0 and the global
/// min to exactly 0.0. A zero range (all elements equal) fails fast instead
/// of propagating NaN.
pub fn normalize_global(matrix: &Array2<f64>) -> Result<Array2<f64>, ForecastError> {
    let (min, max) = global_range(matrix)?;
    if max == min {
        return Err(ForecastError::domain(format!(
            "zero normalization range: all {} elements equal {min}",
            matrix.len()
        )));
    }
    let range = max - min;
    Ok(matrix.mapv(|x| (x - min) / range))
}

fn global_range(matrix: &Array2<f64>) -> Result<(f64, f64), ForecastError> {
    if matrix.is_empty() {
        return Err(ForecastError::domain("cannot normalize an empty matrix"));
    }
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &x in matrix.iter() {
        if !x.is_finite() {
            return Err(ForecastError::domain(format!(
                "non-finite value {x} in normalization input"
            )));
        }
        min = min.min(x);
        max = max.max(x);
    }
    Ok((min, max))
}
